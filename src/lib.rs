//! # UPS Void Runner
//!
//! 批量为仅打印标签、从未揽收的 UPS 运单发起作废争议
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（浏览器、Page），只暴露能力
//! - `Surface` - 会话交互能力（查找、点击、输入、切换页签）
//! - `ChromeSurface` / `JsExecutor` - 基于 chromiumoxide 的实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个运单或单个文件
//! - `AccountMapper` - 运单账号 → 凭据
//! - `StateStore` - 运单处理状态，每条终态立即落盘
//! - `locator` - 候选定位器与"第一个可见"探测
//! - `Diagnostics` / `ResultLog` - 截图与结果 CSV
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义一个账号会话内的完整交互流程
//! - `SessionDriver` - 登录 → 账单中心 → 查询 → 争议 → 提交
//! - `TemporaryContext` - 详情页签的打开与关闭
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量处理器，加载、映射、过滤、分组、汇总
//! - `orchestrator/account_processor` - 单个账号组处理器，一次登录处理组内所有运单
//!
//! ## 模块结构

pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{ChromeOpener, ContextId, SessionOpener, Surface};
pub use models::{Candidate, Credential, DisputeStatus, MappedWorkItem, SessionResult};
pub use orchestrator::{App, RunOptions, RunSummary};
pub use workflow::{SessionDriver, SessionState};
