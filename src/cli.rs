use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;
use crate::orchestrator::RunOptions;

/// UPS 运单作废争议批处理
#[derive(Debug, Parser)]
#[command(name = "ups_void_runner", version, about, long_about = None)]
pub struct Cli {
    /// 候选运单 CSV（默认取输出目录中最新的抽取文件）
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// 凭据 CSV
    #[arg(long)]
    pub credentials: Option<PathBuf>,

    /// 删除状态文件后全部重新处理
    #[arg(long)]
    pub reset_tracking: bool,

    /// 重新处理上次失败的运单
    #[arg(long)]
    pub retry_errors: bool,

    /// 真正提交争议（默认只填写表单）
    #[arg(long)]
    pub submit: bool,

    /// 显示浏览器窗口
    #[arg(long)]
    pub headed: bool,

    /// 不保存诊断截图
    #[arg(long)]
    pub no_screenshots: bool,

    /// 登录结果不明确时视为失败
    #[arg(long)]
    pub strict_login: bool,

    /// 配置文件路径（也可用环境变量 VOID_RUNNER_CONFIG）
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// 命令行参数覆盖配置
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(path) = &self.credentials {
            config.credentials_csv = path.display().to_string();
        }
        if self.strict_login {
            config.strict_login = true;
        }
        config
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            csv: self.csv.clone(),
            reset_tracking: self.reset_tracking,
            retry_errors: self.retry_errors,
            commit: self.submit,
            headed: self.headed,
            screenshots: !self.no_screenshots,
        }
    }
}
