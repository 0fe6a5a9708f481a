//! 凭据目录
//!
//! 外部凭据存储只需实现 [`CredentialDirectory`]，这里提供 CSV 文件实现

use crate::error::LoadError;
use crate::models::shipment::Credential;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info, warn};

/// 可查询的只读凭据来源
#[async_trait]
pub trait CredentialDirectory: Send + Sync {
    /// 返回账号类型包含 `account_type_filter` 的全部凭据
    async fn fetch(&self, account_type_filter: &str) -> Result<Vec<Credential>, LoadError>;
}

/// CSV 凭据文件
///
/// 表头：account_number, account_type, carrier_login (或 username), carrier_password (或 password)
pub struct CsvCredentialDirectory {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CredentialRow {
    #[serde(default, alias = "accountNumber")]
    account_number: String,
    #[serde(default, alias = "accountType")]
    account_type: String,
    #[serde(default, alias = "carrier_login")]
    username: String,
    #[serde(default, alias = "carrier_password")]
    password: String,
}

impl CsvCredentialDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialDirectory for CsvCredentialDirectory {
    async fn fetch(&self, account_type_filter: &str) -> Result<Vec<Credential>, LoadError> {
        let shown = self.path.display().to_string();

        if !self.path.exists() {
            return Err(LoadError::NotFound(shown));
        }

        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|source| LoadError::Io {
                path: shown.clone(),
                source,
            })?;

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        // 同一账号出现多次时以最后一行为准
        let mut by_key: HashMap<String, Credential> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        for row in reader.deserialize::<CredentialRow>() {
            let row = row.map_err(|source| LoadError::Csv {
                path: shown.clone(),
                source,
            })?;

            if !row.account_type.contains(account_type_filter) {
                debug!("跳过账号类型 '{}' ({})", row.account_type, row.account_number);
                continue;
            }
            if row.account_number.is_empty() || row.username.is_empty() || row.password.is_empty() {
                debug!("跳过不完整的凭据行 (账号: '{}')", row.account_number);
                continue;
            }

            let credential = Credential {
                account_key: row.account_number.trim().to_string(),
                username: row.username,
                password: row.password,
                account_type: row.account_type,
            };

            if by_key.insert(credential.account_key.clone(), credential.clone()).is_some() {
                warn!("⚠️ 账号 {} 有重复凭据，使用最后一条", credential.account_key);
            } else {
                order.push(credential.account_key);
            }
        }

        let credentials: Vec<Credential> = order
            .into_iter()
            .filter_map(|key| by_key.remove(&key))
            .collect();

        info!("✅ 从 {} 加载了 {} 个登录凭据", shown, credentials.len());
        debug!(
            "可用账号: {:?}",
            credentials.iter().take(5).map(|c| &c.account_key).collect::<Vec<_>>()
        );

        Ok(credentials)
    }
}
