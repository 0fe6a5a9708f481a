//! 处理结果

use serde::{Deserialize, Serialize};
use std::fmt;

/// 状态文件中记录的终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Voided,
    AlreadyVoided,
    NoDisputeButton,
    Error,
}

impl WorkflowStatus {
    /// 除 error 外都不会自动重试
    pub fn is_terminal(self) -> bool {
        !matches!(self, WorkflowStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStatus::Voided => "voided",
            WorkflowStatus::AlreadyVoided => "already_voided",
            WorkflowStatus::NoDisputeButton => "no_dispute_button",
            WorkflowStatus::Error => "error",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单条运单的争议处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    /// 已提交作废争议
    Voided,
    /// 已存在争议
    AlreadyVoided,
    /// 操作菜单中没有争议入口
    NoDisputeButton,
    /// 表单已填好但未提交（未开启提交开关）
    FormReady,
    Error,
}

impl DisputeStatus {
    /// 需要写入状态文件的状态；`FormReady` 不写入，下次运行仍会处理
    pub fn workflow_status(self) -> Option<WorkflowStatus> {
        match self {
            DisputeStatus::Voided => Some(WorkflowStatus::Voided),
            DisputeStatus::AlreadyVoided => Some(WorkflowStatus::AlreadyVoided),
            DisputeStatus::NoDisputeButton => Some(WorkflowStatus::NoDisputeButton),
            DisputeStatus::Error => Some(WorkflowStatus::Error),
            DisputeStatus::FormReady => None,
        }
    }
}

/// 单条运单在本次运行中的结果（写入结果日志）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    pub tracking_number: String,
    pub account_number: String,
    pub username: String,
    pub login_success: bool,
    pub navigation_success: bool,
    pub search_success: bool,
    pub dispute_status: DisputeStatus,
    /// 失败原因，成功时为空
    pub error: String,
}

impl SessionResult {
    pub fn is_error(&self) -> bool {
        self.dispute_status == DisputeStatus::Error
    }
}
