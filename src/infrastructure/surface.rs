//! 交互界面抽象 - 基础设施层
//!
//! 会话驱动只通过 [`Surface`] 操作页面：查找、点击、输入、选择、切换页签。
//! 浏览器实现是 [`ChromeSurface`](super::ChromeSurface)，测试中可以换成脚本化的实现

use std::fmt;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::services::locator::Locator;

/// 浏览上下文（页签）标识
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextId(pub String);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 一个账号会话持有的交互界面
///
/// 所有方法都作用于当前活动的上下文；元素不存在时
/// `is_visible` 返回 `false`，动作类方法返回错误
#[async_trait]
pub trait Surface: Send {
    async fn goto(&mut self, url: &str) -> Result<()>;

    async fn current_url(&mut self) -> Result<String>;

    /// 等待当前页面加载完成，超时返回错误
    async fn wait_for_load(&mut self, timeout: Duration) -> Result<()>;

    async fn is_visible(&mut self, locator: &Locator) -> Result<bool>;

    async fn click(&mut self, locator: &Locator) -> Result<()>;

    async fn fill(&mut self, locator: &Locator, value: &str) -> Result<()>;

    /// 按选项文本选择下拉框，选项不存在时返回 `Ok(false)`
    async fn select_option(&mut self, locator: &Locator, label: &str) -> Result<bool>;

    /// 元素可见时返回其文本
    async fn text_of(&mut self, locator: &Locator) -> Result<Option<String>>;

    /// 收集可见元素的文本（去重，最多 `limit` 条）
    async fn visible_texts(&mut self, css: &str, limit: usize) -> Result<Vec<String>>;

    async fn body_text(&mut self) -> Result<String>;

    async fn press_escape(&mut self) -> Result<()>;

    /// 当前所有上下文
    async fn contexts(&mut self) -> Result<Vec<ContextId>>;

    fn active_context(&self) -> ContextId;

    /// 会话开始时的主上下文，不会被关闭
    fn primary_context(&self) -> ContextId;

    async fn switch_to(&mut self, id: &ContextId) -> Result<()>;

    /// 关闭上下文；关闭的是活动上下文时回到主上下文
    async fn close_context(&mut self, id: &ContextId) -> Result<()>;

    async fn screenshot(&mut self, path: &Path) -> Result<()>;

    /// 释放整个会话
    async fn shutdown(&mut self) -> Result<()>;
}

/// 为每个账号组创建独立会话
#[async_trait]
pub trait SessionOpener: Send + Sync {
    type Surface: Surface + 'static;

    async fn open(&self) -> Result<Self::Surface>;
}
