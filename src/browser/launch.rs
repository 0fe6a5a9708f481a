use std::path::PathBuf;

use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 浏览器启动参数
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// 有界面模式（默认无头）
    pub headed: bool,
    /// 自定义浏览器可执行文件
    pub executable: Option<PathBuf>,
}

/// 已启动的浏览器及其事件处理任务
pub struct LaunchedBrowser {
    pub browser: Browser,
    pub page: Page,
    pub handler_task: JoinHandle<()>,
}

/// 启动一个独立的浏览器实例并打开空白页
pub async fn launch_browser(options: &LaunchOptions) -> Result<LaunchedBrowser> {
    info!(
        "🚀 启动浏览器 ({})...",
        if options.headed { "有界面" } else { "无头" }
    );

    let mut builder = BrowserConfig::builder();
    builder = if options.headed {
        builder.with_head()
    } else {
        builder.new_headless_mode()
    };
    if let Some(executable) = &options.executable {
        debug!("使用浏览器: {}", executable.display());
        builder = builder.chrome_executable(executable);
    }

    let user_agent = format!("--user-agent={}", USER_AGENT);
    let config = builder
        .window_size(1920, 1080)
        .args(vec![
            "--disable-gpu",
            "--no-sandbox",                 // 容器内运行时没有沙盒权限
            "--disable-dev-shm-usage",      // 防止共享内存不足
            "--disable-blink-features=AutomationControlled",
            user_agent.as_str(),
        ])
        .build()
        .map_err(|e| {
            error!("配置浏览器失败: {}", e);
            anyhow::anyhow!("配置浏览器失败: {}", e)
        })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        anyhow::anyhow!("启动浏览器失败: {}", e)
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    let handler_task = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        anyhow::anyhow!("创建页面失败: {}", e)
    })?;

    Ok(LaunchedBrowser {
        browser,
        page,
        handler_task,
    })
}
