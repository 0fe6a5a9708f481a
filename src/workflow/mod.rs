//! 流程层（Workflow）
//!
//! 一个账号会话内的完整交互流程

pub mod locators;
pub mod session_driver;
pub mod temp_context;

pub use session_driver::{
    judge_login, DisputeOutcome, DriverSettings, LoginVerdict, SessionDriver, SessionState,
    StageReport,
};
pub use temp_context::{close_extra_contexts, TemporaryContext};
