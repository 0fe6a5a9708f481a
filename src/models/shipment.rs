//! 运单与凭据数据

use serde::{Deserialize, Serialize};

/// 候选运单（来自仅打印标签的运单抽取结果）
///
/// 加载后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(alias = "trackingNumber")]
    pub tracking_number: String,
    /// 完整账号（通常比凭据目录中的账号更长）
    #[serde(alias = "accountNumber")]
    pub account_number: String,
    #[serde(default, alias = "statusDescription")]
    pub status_description: String,
    #[serde(default, alias = "statusCode")]
    pub status_code: String,
    #[serde(default, alias = "statusType")]
    pub status_type: String,
}

/// 账号凭据，本次运行内只读
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// 账号后缀，用于和运单账号关联
    pub account_key: String,
    pub username: String,
    pub password: String,
    pub account_type: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("account_key", &self.account_key)
            .field("username", &self.username)
            .field("password", &"********")
            .field("account_type", &self.account_type)
            .finish()
    }
}

/// 映射成功的待处理运单
#[derive(Clone, PartialEq, Eq)]
pub struct MappedWorkItem {
    pub tracking_number: String,
    pub full_account_number: String,
    pub account_key: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for MappedWorkItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedWorkItem")
            .field("tracking_number", &self.tracking_number)
            .field("full_account_number", &self.full_account_number)
            .field("account_key", &self.account_key)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
