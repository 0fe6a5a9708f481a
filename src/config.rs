use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "void_runner.toml";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 登录入口
    pub login_url: String,
    /// 账单中心（工作区）直达链接
    pub work_area_url: String,
    /// 截图与结果输出目录
    pub output_dir: String,
    /// 状态文件路径，为空时使用 `<output_dir>/ups_void_tracking_state.json`
    pub state_file: Option<String>,
    /// 候选运单 CSV 文件名前缀（自动查找最新文件时使用）
    pub candidates_prefix: String,
    /// 凭据目录 CSV
    pub credentials_csv: String,
    /// 凭据的账号类型过滤条件（子串匹配）
    pub account_type_filter: String,
    /// 自定义浏览器可执行文件
    pub chrome_executable: Option<String>,
    /// 每个定位器的等待时间（毫秒）
    pub locator_wait_ms: u64,
    /// 界面稳定等待（毫秒）
    pub settle_wait_ms: u64,
    /// 页面导航超时（毫秒）
    pub navigation_timeout_ms: u64,
    /// 登录结果不明确时视为失败
    pub strict_login: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            login_url: "https://www.ups.com/lasso/login".to_string(),
            work_area_url: "https://billing.ups.com/home".to_string(),
            output_dir: "data/output".to_string(),
            state_file: None,
            candidates_prefix: "ups_label_only_tracking_range_".to_string(),
            credentials_csv: "industry_index_logins.csv".to_string(),
            account_type_filter: "Primary".to_string(),
            chrome_executable: None,
            locator_wait_ms: 5_000,
            settle_wait_ms: 2_000,
            navigation_timeout_ms: 30_000,
            strict_login: false,
        }
    }
}

impl Config {
    /// 读取配置：TOML 文件（可选）→ 环境变量覆盖
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("VOID_RUNNER_CONFIG").ok().map(PathBuf::from));

        let base = match explicit {
            Some(path) => Self::from_toml_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_toml_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        Ok(base.with_env())
    }

    fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("无法解析配置文件: {}", path.display()))
    }

    /// 用环境变量覆盖已有配置
    pub fn with_env(self) -> Self {
        let env = |name: &str| std::env::var(name).ok();
        let env_ms = |name: &str, fallback: u64| {
            env(name).and_then(|v| v.parse().ok()).unwrap_or(fallback)
        };

        Self {
            login_url: env("UPS_WEB_LOGIN_URL").unwrap_or(self.login_url),
            work_area_url: env("WORK_AREA_URL").unwrap_or(self.work_area_url),
            output_dir: env("OUTPUT_DIR").unwrap_or(self.output_dir),
            state_file: env("STATE_FILE").or(self.state_file),
            candidates_prefix: self.candidates_prefix,
            credentials_csv: env("CREDENTIALS_CSV").unwrap_or(self.credentials_csv),
            account_type_filter: env("ACCOUNT_TYPE_FILTER").unwrap_or(self.account_type_filter),
            chrome_executable: env("CHROME_EXECUTABLE").or(self.chrome_executable),
            locator_wait_ms: env_ms("LOCATOR_WAIT_MS", self.locator_wait_ms),
            settle_wait_ms: env_ms("SETTLE_WAIT_MS", self.settle_wait_ms),
            navigation_timeout_ms: env_ms("NAVIGATION_TIMEOUT_MS", self.navigation_timeout_ms),
            strict_login: self.strict_login,
        }
    }

    pub fn state_file_path(&self) -> PathBuf {
        match &self.state_file {
            Some(path) => PathBuf::from(path),
            None => Path::new(&self.output_dir).join("ups_void_tracking_state.json"),
        }
    }

    pub fn timings(&self) -> Timings {
        Timings {
            locator_wait: Duration::from_millis(self.locator_wait_ms),
            settle: Duration::from_millis(self.settle_wait_ms),
            navigation: Duration::from_millis(self.navigation_timeout_ms),
        }
    }
}

/// 等待时间
///
/// 短等待（界面稳定）与长等待（页面导航）分开配置，超时只算阶段失败
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timings {
    /// 单个定位器的最长等待
    pub locator_wait: Duration,
    /// 点击/输入后的界面稳定等待
    pub settle: Duration,
    /// 页面跳转等待
    pub navigation: Duration,
}

impl Timings {
    /// 全部为零，单次探测不等待（测试用）
    pub fn instant() -> Self {
        Self {
            locator_wait: Duration::ZERO,
            settle: Duration::ZERO,
            navigation: Duration::ZERO,
        }
    }
}
