//! 处理状态存储 - 业务能力层
//!
//! 以运单号为键的 JSON 文件。每次 `update` 都把整个文件重写到磁盘后才返回，
//! 进程在任意一条运单结束后退出，文件都与最后完成的运单一致。
//! 写入顺序：临时文件 → fsync → rename

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::error::StateError;
use crate::models::{MappedWorkItem, WorkflowStatus};

/// 单条运单的状态记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStateRecord {
    pub status: WorkflowStatus,
    /// ISO-8601 本地时间
    pub timestamp: String,
    #[serde(default, alias = "account_number")]
    pub account_number: String,
    #[serde(default, alias = "error_message")]
    pub error_message: String,
}

/// 运单号 → 状态记录
pub type WorkflowState = BTreeMap<String, WorkflowStateRecord>;

/// 是否处理某条运单
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// 没有记录
    Process,
    /// 上次失败，开启了重试
    Retry(String),
    /// 跳过及原因
    Skip(String),
}

impl Admission {
    pub fn is_skip(&self) -> bool {
        matches!(self, Admission::Skip(_))
    }
}

/// 判断运单是否应跳过
///
/// - 没有记录：处理
/// - voided / already_voided / no_dispute_button：始终跳过
/// - error：除非 `retry_errors`，否则跳过
pub fn should_skip(tracking_number: &str, state: &WorkflowState, retry_errors: bool) -> Admission {
    let Some(record) = state.get(tracking_number) else {
        return Admission::Process;
    };

    let at = &record.timestamp;
    match record.status {
        WorkflowStatus::Voided => Admission::Skip(format!("已于 {} 作废", at)),
        WorkflowStatus::AlreadyVoided => Admission::Skip(format!("已于 {} 确认之前已作废", at)),
        WorkflowStatus::NoDisputeButton => {
            Admission::Skip(format!("已于 {} 确认没有争议按钮", at))
        }
        WorkflowStatus::Error if retry_errors => {
            Admission::Retry(format!("重试 {} 的失败记录", at))
        }
        WorkflowStatus::Error => {
            let message = if record.error_message.is_empty() {
                "未知错误"
            } else {
                record.error_message.as_str()
            };
            Admission::Skip(format!("{} 处理失败: {}", at, message))
        }
    }
}

/// 按状态过滤待处理运单，返回 (待处理, 跳过数量)
pub fn partition_pending(
    items: Vec<MappedWorkItem>,
    state: &WorkflowState,
    retry_errors: bool,
) -> (Vec<MappedWorkItem>, usize) {
    let mut pending = Vec::with_capacity(items.len());
    let mut skipped = 0;

    for item in items {
        match should_skip(&item.tracking_number, state, retry_errors) {
            Admission::Skip(reason) => {
                info!("⏭️ 跳过 {}: {}", item.tracking_number, reason);
                skipped += 1;
            }
            Admission::Retry(reason) => {
                info!("🔁 {}: {}", item.tracking_number, reason);
                pending.push(item);
            }
            Admission::Process => pending.push(item),
        }
    }

    (pending, skipped)
}

/// 状态存储
///
/// 运行开始时读取一次，之后每条运单得到终态时整体重写
pub struct StateStore {
    path: PathBuf,
    state: WorkflowState,
}

impl StateStore {
    /// 打开状态文件（不存在或损坏时为空）
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = Self::load(&path);
        Self { path, state }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn get(&self, tracking_number: &str) -> Option<&WorkflowStateRecord> {
        self.state.get(tracking_number)
    }

    /// 读取状态文件
    ///
    /// 文件不存在或整体无法解析时返回空映射并记录警告；
    /// 单条记录无法解析时只丢弃该条
    pub fn load(path: &Path) -> WorkflowState {
        if !path.exists() {
            info!("📝 没有找到状态文件: {}", path.display());
            return WorkflowState::new();
        }

        let raw: BTreeMap<String, JsonValue> = match fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()))
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!("⚠️ 状态文件无法读取，按空状态处理 ({}): {}", path.display(), e);
                return WorkflowState::new();
            }
        };

        let mut state = WorkflowState::new();
        for (tracking_number, value) in raw {
            match serde_json::from_value::<WorkflowStateRecord>(value) {
                Ok(record) => {
                    state.insert(tracking_number, record);
                }
                Err(e) => warn!("⚠️ 忽略无法解析的状态记录 {}: {}", tracking_number, e),
            }
        }

        info!("✅ 读取状态文件: 已有 {} 个运单记录", state.len());
        state
    }

    /// 写入一条终态记录并立即重写整个文件
    pub fn update(
        &mut self,
        tracking_number: &str,
        status: WorkflowStatus,
        account_number: &str,
        error_message: &str,
    ) -> Result<(), StateError> {
        let record = WorkflowStateRecord {
            status,
            timestamp: chrono::Local::now()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
            account_number: account_number.to_string(),
            error_message: error_message.to_string(),
        };

        self.state.insert(tracking_number.to_string(), record);
        self.persist()?;

        debug!("💾 {} → {}", tracking_number, status);
        Ok(())
    }

    fn persist(&self) -> Result<(), StateError> {
        let io_err = |source| StateError::Io {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(&self.state)?;
        let tmp_path = self.path.with_extension("json.tmp");

        let mut file = fs::File::create(&tmp_path).map_err(io_err)?;
        file.write_all(json.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);

        fs::rename(&tmp_path, &self.path).map_err(io_err)?;
        Ok(())
    }

    /// 删除状态文件（不存在时什么也不做）
    pub fn reset(path: &Path) -> Result<(), StateError> {
        if !path.exists() {
            info!("ℹ️ 没有需要重置的状态文件: {}", path.display());
            return Ok(());
        }

        fs::remove_file(path).map_err(|source| StateError::Io {
            path: path.display().to_string(),
            source,
        })?;
        info!("✅ 已重置状态: 删除 {}", path.display());
        Ok(())
    }
}
