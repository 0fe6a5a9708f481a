//! 浏览器实现的交互界面 - 基础设施层
//!
//! 一个 [`ChromeSurface`] 独占一个浏览器进程，账号组结束时整体关闭

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, Page};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::dom_script::{self, DomAction};
use super::surface::{ContextId, SessionOpener, Surface};
use super::JsExecutor;
use crate::browser::{self, LaunchOptions, LaunchedBrowser};
use crate::services::locator::Locator;

fn context_of(page: &Page) -> ContextId {
    ContextId(page.target_id().inner().clone())
}

/// 基于 chromiumoxide 的会话
pub struct ChromeSurface {
    browser: Browser,
    executor: JsExecutor,
    primary: Page,
    handler_task: Option<JoinHandle<()>>,
    navigation_timeout: Duration,
}

impl ChromeSurface {
    pub fn new(launched: LaunchedBrowser, navigation_timeout: Duration) -> Self {
        let LaunchedBrowser {
            browser,
            page,
            handler_task,
        } = launched;

        Self {
            browser,
            executor: JsExecutor::new(page.clone()),
            primary: page,
            handler_task: Some(handler_task),
            navigation_timeout,
        }
    }

    async fn run(&self, locator: &Locator, action: DomAction<'_>) -> Result<serde_json::Value> {
        let script = dom_script::locator_script(locator, &action)?;
        self.executor.eval(script).await
    }

    async fn run_checked(&self, locator: &Locator, action: DomAction<'_>) -> Result<String> {
        let value = self.run(locator, action).await?;
        match value.as_str() {
            Some("missing") => bail!("元素不可见: {}", locator),
            Some(outcome) => Ok(outcome.to_string()),
            None => bail!("脚本返回了意外的结果: {}", value),
        }
    }

    async fn find_page(&self, id: &ContextId) -> Result<Page> {
        let pages = self.browser.pages().await?;
        pages
            .into_iter()
            .find(|page| context_of(page) == *id)
            .ok_or_else(|| anyhow!("页签不存在: {}", id))
    }
}

#[async_trait]
impl Surface for ChromeSurface {
    async fn goto(&mut self, url: &str) -> Result<()> {
        debug!("打开 {}", url);
        timeout(self.navigation_timeout, self.executor.page().goto(url))
            .await
            .map_err(|_| anyhow!("打开 {} 超时", url))??;
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String> {
        Ok(self.executor.page().url().await?.unwrap_or_default())
    }

    async fn wait_for_load(&mut self, wait: Duration) -> Result<()> {
        timeout(wait, self.executor.page().wait_for_navigation())
            .await
            .map_err(|_| anyhow!("等待页面加载超时"))??;
        Ok(())
    }

    async fn is_visible(&mut self, locator: &Locator) -> Result<bool> {
        let value = self.run(locator, DomAction::Probe).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn click(&mut self, locator: &Locator) -> Result<()> {
        self.run_checked(locator, DomAction::Click).await?;
        Ok(())
    }

    async fn fill(&mut self, locator: &Locator, value: &str) -> Result<()> {
        self.run_checked(locator, DomAction::Fill { value }).await?;
        Ok(())
    }

    async fn select_option(&mut self, locator: &Locator, label: &str) -> Result<bool> {
        let outcome = self.run_checked(locator, DomAction::Select { label }).await?;
        Ok(outcome == "ok")
    }

    async fn text_of(&mut self, locator: &Locator) -> Result<Option<String>> {
        let value = self.run(locator, DomAction::Text).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn visible_texts(&mut self, css: &str, limit: usize) -> Result<Vec<String>> {
        let script = dom_script::visible_texts_script(css, limit)?;
        self.executor.eval_as(script).await
    }

    async fn body_text(&mut self) -> Result<String> {
        self.executor.eval_as(dom_script::BODY_TEXT_SCRIPT).await
    }

    async fn press_escape(&mut self) -> Result<()> {
        self.executor
            .page()
            .find_element("body")
            .await?
            .press_key("Escape")
            .await?;
        Ok(())
    }

    async fn contexts(&mut self) -> Result<Vec<ContextId>> {
        let pages = self.browser.pages().await?;
        Ok(pages.iter().map(context_of).collect())
    }

    fn active_context(&self) -> ContextId {
        context_of(self.executor.page())
    }

    fn primary_context(&self) -> ContextId {
        context_of(&self.primary)
    }

    async fn switch_to(&mut self, id: &ContextId) -> Result<()> {
        if *id == self.active_context() {
            return Ok(());
        }
        let page = if *id == self.primary_context() {
            self.primary.clone()
        } else {
            self.find_page(id).await?
        };
        page.bring_to_front().await?;
        self.executor.replace_page(page);
        debug!("切换到页签 {}", id);
        Ok(())
    }

    async fn close_context(&mut self, id: &ContextId) -> Result<()> {
        if *id == self.primary_context() {
            bail!("不能关闭主页签");
        }
        if *id == self.active_context() {
            self.executor.replace_page(self.primary.clone());
            if let Err(e) = self.primary.bring_to_front().await {
                warn!("⚠️ 无法激活主页签: {}", e);
            }
        }
        let page = self.find_page(id).await?;
        page.close().await?;
        debug!("已关闭页签 {}", id);
        Ok(())
    }

    async fn screenshot(&mut self, path: &Path) -> Result<()> {
        let params = ScreenshotParams::builder().full_page(true).build();
        self.executor.page().save_screenshot(params, path).await?;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        let Some(handler_task) = self.handler_task.take() else {
            return Ok(());
        };

        let closed = self.browser.close().await;
        if closed.is_ok() {
            let _ = self.browser.wait().await;
        }
        handler_task.abort();
        closed?;
        debug!("浏览器已关闭");
        Ok(())
    }
}

impl Drop for ChromeSurface {
    fn drop(&mut self) {
        if let Some(handler_task) = self.handler_task.take() {
            handler_task.abort();
        }
    }
}

/// 每次打开都启动一个新的浏览器，账号之间不共享 cookie
pub struct ChromeOpener {
    options: LaunchOptions,
    navigation_timeout: Duration,
}

impl ChromeOpener {
    pub fn new(options: LaunchOptions, navigation_timeout: Duration) -> Self {
        Self {
            options,
            navigation_timeout,
        }
    }
}

#[async_trait]
impl SessionOpener for ChromeOpener {
    type Surface = ChromeSurface;

    async fn open(&self) -> Result<ChromeSurface> {
        let launched = browser::launch_browser(&self.options).await?;
        Ok(ChromeSurface::new(launched, self.navigation_timeout))
    }
}
