//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量处理器
//! - 加载候选运单与凭据，完成映射和状态过滤
//! - 按账号分组，组之间串行
//! - 写结果日志，输出全局统计
//!
//! ### `account_processor` - 单个账号组处理器
//! - 打开会话、登录一次、进入账单中心
//! - 逐条处理组内运单并写入状态
//! - 任何路径下都关闭会话
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<AccountGroup>)
//!     ↓
//! account_processor (处理 Vec<MappedWorkItem>)
//!     ↓
//! workflow::SessionDriver (处理单个运单)
//!     ↓
//! services (能力层：mapper / state / locator / diagnostics)
//!     ↓
//! infrastructure (基础设施：Surface / JsExecutor)
//! ```

pub mod account_processor;
pub mod batch_processor;

// 重新导出主要类型
pub use account_processor::{
    group_by_account, process_account_group, AccountGroup, GroupOptions, GroupOutcome,
};
pub use batch_processor::{App, RunOptions, RunSummary};
