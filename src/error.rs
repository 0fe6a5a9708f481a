//! 错误类型
//!
//! 按处理范围划分：
//! - `MappingError`：单条运单的映射失败，在会话开始前丢弃
//! - `SessionError`：账号级或运单级的会话失败，记录为 error，可重试
//! - `StateError` / `LoadError`：状态文件与输入文件相关

use thiserror::Error;

use crate::services::locator::Stage;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("映射错误: {0}")]
    Mapping(#[from] MappingError),

    #[error("会话错误: {0}")]
    Session(#[from] SessionError),

    #[error("状态文件错误: {0}")]
    State(#[from] StateError),

    #[error("输入加载错误: {0}")]
    Load(#[from] LoadError),

    #[error("配置错误: {0}")]
    Config(String),
}

/// 运单到账号凭据的映射错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// 运单没有账号
    #[error("运单 {tracking_number} 没有账号")]
    MissingAccountNumber { tracking_number: String },

    /// 账号后缀在凭据目录中没有匹配项
    #[error("账号 {account_key} 没有可用凭据 (运单: {tracking_number})")]
    NoCredential {
        tracking_number: String,
        account_key: String,
    },
}

/// 会话（浏览器交互）错误
#[derive(Debug, Error)]
pub enum SessionError {
    /// 登录失败
    #[error("登录失败: {0}")]
    LoginFailed(String),

    /// 无法到达工作区
    #[error("导航到账单中心失败: {0}")]
    NavigationFailed(String),

    /// 某阶段的所有候选定位器都不可见
    #[error("{stage} 未找到 (已尝试 {tried} 个定位器)")]
    LocatorExhausted { stage: Stage, tried: usize },

    /// 下拉框存在但缺少目标选项
    #[error("{stage} 中没有选项 '{label}'")]
    OptionMissing { stage: Stage, label: String },

    /// 临时浏览上下文处理失败
    #[error("临时页签处理失败: {0}")]
    ContextHandling(String),

    /// 底层浏览器调用失败
    #[error("浏览器错误: {0}")]
    Browser(#[from] anyhow::Error),
}

/// 状态文件错误
#[derive(Debug, Error)]
pub enum StateError {
    #[error("读写状态文件失败 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("序列化状态失败: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 输入文件错误
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("文件不存在: {0}")]
    NotFound(String),

    #[error("目录 {dir} 中没有 {prefix}*.csv 文件")]
    NoExtract { dir: String, prefix: String },

    #[error("读取文件失败 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV 解析失败 ({path}): {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
