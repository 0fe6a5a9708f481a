//! 账号映射服务 - 业务能力层
//!
//! 运单账号取后 6 位作为账号键，与凭据目录精确匹配。
//! 纯函数，只依赖本次运行的凭据快照

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::error::MappingError;
use crate::models::{Candidate, Credential, MappedWorkItem};

/// 账号键长度
pub const ACCOUNT_KEY_LEN: usize = 6;

/// 从完整账号推导账号键：后 6 个字符，不足 6 个时取全部；空账号没有键
pub fn derive_account_key(full_account_number: &str) -> Option<String> {
    let trimmed = full_account_number.trim();
    if trimmed.is_empty() {
        return None;
    }

    let char_count = trimmed.chars().count();
    let key: String = trimmed
        .chars()
        .skip(char_count.saturating_sub(ACCOUNT_KEY_LEN))
        .collect();

    Some(key.trim().to_string())
}

/// 批量映射结果
#[derive(Debug, Default)]
pub struct MappingReport {
    pub items: Vec<MappedWorkItem>,
    pub skipped: Vec<MappingError>,
}

/// 账号映射服务
pub struct AccountMapper {
    credentials: HashMap<String, Credential>,
}

impl AccountMapper {
    /// 只保留账号类型包含 `account_type_filter` 的凭据
    pub fn new(credentials: &[Credential], account_type_filter: &str) -> Self {
        let credentials = credentials
            .iter()
            .filter(|c| c.account_type.contains(account_type_filter))
            .map(|c| (c.account_key.trim().to_string(), c.clone()))
            .collect();

        Self { credentials }
    }

    pub fn credential_count(&self) -> usize {
        self.credentials.len()
    }

    /// 映射单条运单
    pub fn map_one(&self, candidate: &Candidate) -> Result<MappedWorkItem, MappingError> {
        let account_key = derive_account_key(&candidate.account_number).ok_or_else(|| {
            MappingError::MissingAccountNumber {
                tracking_number: candidate.tracking_number.clone(),
            }
        })?;

        let credential =
            self.credentials
                .get(&account_key)
                .ok_or_else(|| MappingError::NoCredential {
                    tracking_number: candidate.tracking_number.clone(),
                    account_key: account_key.clone(),
                })?;

        Ok(MappedWorkItem {
            tracking_number: candidate.tracking_number.clone(),
            full_account_number: candidate.account_number.clone(),
            account_key,
            username: credential.username.clone(),
            password: credential.password.clone(),
        })
    }

    /// 映射全部运单，失败的记录原因后丢弃
    pub fn map_all(&self, candidates: &[Candidate]) -> MappingReport {
        let mut report = MappingReport::default();

        for candidate in candidates {
            match self.map_one(candidate) {
                Ok(item) => {
                    debug!("✅ {} → 账号 {}", item.tracking_number, item.account_key);
                    report.items.push(item);
                }
                Err(e) => {
                    warn!("⚠️ {}", e);
                    report.skipped.push(e);
                }
            }
        }

        info!(
            "✅ 成功映射 {}/{} 个运单",
            report.items.len(),
            candidates.len()
        );

        report
    }
}
