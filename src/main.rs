use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use ups_void_runner::cli::Cli;
use ups_void_runner::config::Config;
use ups_void_runner::logger;
use ups_void_runner::orchestrator::App;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 初始化日志
    logger::init(cli.verbose);

    // 加载配置
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => cli.apply(config),
        Err(e) => {
            error!("❌ {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    // 初始化并运行应用
    let app = App::new(config, cli.run_options());
    match app.run().await {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            error!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}
