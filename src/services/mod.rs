//! 业务能力层
//!
//! 每个服务只描述"我能做什么"，不关心批量流程

pub mod account_mapper;
pub mod diagnostics;
pub mod locator;
pub mod result_log;
pub mod state_store;

pub use account_mapper::{derive_account_key, AccountMapper, MappingReport};
pub use diagnostics::Diagnostics;
pub use locator::{first_visible, probe, Located, Locator, LocatorChain, Stage};
pub use result_log::ResultLog;
pub use state_store::{
    partition_pending, should_skip, Admission, StateStore, WorkflowState, WorkflowStateRecord,
};
