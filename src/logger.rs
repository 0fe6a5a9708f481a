use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// 默认 `info`，`RUST_LOG` 优先；`verbose` 时本程序输出 debug 日志
pub fn init(verbose: bool) {
    let default_directive = if verbose {
        "info,ups_void_runner=debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
