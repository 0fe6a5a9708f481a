//! 基础设施层
//!
//! 持有稀缺资源（浏览器、Page），只暴露能力

pub mod chrome_surface;
pub mod dom_script;
pub mod js_executor;
pub mod surface;

pub use chrome_surface::{ChromeOpener, ChromeSurface};
pub use js_executor::JsExecutor;
pub use surface::{ContextId, SessionOpener, Surface};
