//! 测试用的脚本化会话，不需要浏览器

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use ups_void_runner::config::Timings;
use ups_void_runner::error::LoadError;
use ups_void_runner::infrastructure::{ContextId, SessionOpener, Surface};
use ups_void_runner::models::{Credential, CredentialDirectory};
use ups_void_runner::services::locator::{Locator, LocatorChain};
use ups_void_runner::workflow::locators::*;
use ups_void_runner::workflow::DriverSettings;

pub const LOGIN_URL: &str = "https://www.ups.com/lasso/login";
pub const DASHBOARD_URL: &str = "https://www.ups.com/myups/dashboard";
pub const WORK_AREA_URL: &str = "https://billing.ups.com/home";

/// 页面对操作的反应
#[derive(Debug, Clone)]
pub enum Effect {
    /// 弹出新页签（不切换）
    OpenContext,
    SetUrl(String),
    Show(Locator),
    Hide(Locator),
}

/// 一个会话中的页面状态和操作记录
#[derive(Debug, Clone)]
pub struct FakeWorld {
    pub url: String,
    pub body: String,
    /// 主页签上可见的元素
    pub visible: HashSet<Locator>,
    /// 新页签打开时可见的元素
    pub detail: HashSet<Locator>,
    /// 新页签各自的可见元素
    pub pages: HashMap<ContextId, HashSet<Locator>>,
    pub texts: HashMap<Locator, String>,
    /// 下拉框的选项，未登记的下拉框接受任何选项
    pub options: HashMap<Locator, Vec<String>>,
    /// 探测这些元素时报错
    pub probe_errors: HashSet<Locator>,
    pub on_click: HashMap<Locator, Vec<Effect>>,
    /// 任意输入框填入该值时触发
    pub on_fill: HashMap<String, Vec<Effect>>,
    pub failing_urls: HashSet<String>,

    pub contexts: Vec<ContextId>,
    pub active: ContextId,
    next_context: usize,

    pub probes: Vec<Locator>,
    pub clicks: Vec<Locator>,
    pub fills: Vec<(Locator, String)>,
    pub selections: Vec<(Locator, String)>,
    pub gotos: Vec<String>,
    pub escapes: usize,
    pub closed_contexts: Vec<ContextId>,
    pub screenshots: Vec<PathBuf>,
    pub shutdowns: usize,
}

fn first(chain: &LocatorChain) -> Locator {
    chain.candidates[0]
}

/// 发票详情页上的阶段
pub const DETAIL_CHAINS: [LocatorChain; 7] = [
    SEARCH_TABLE_INPUT,
    ACTION_MENU_BUTTON,
    DISPUTE_OPTION,
    DISPUTE_MODAL,
    REASON_SELECT,
    LEVEL_SELECT,
    DISPUTE_SUBMIT,
];

impl FakeWorld {
    /// 空白页面
    pub fn blank() -> Self {
        let primary = ContextId("ctx-0".to_string());
        Self {
            url: "about:blank".to_string(),
            body: String::new(),
            visible: HashSet::new(),
            detail: HashSet::new(),
            pages: HashMap::new(),
            texts: HashMap::new(),
            options: HashMap::new(),
            probe_errors: HashSet::new(),
            on_click: HashMap::new(),
            on_fill: HashMap::new(),
            failing_urls: HashSet::new(),
            contexts: vec![primary.clone()],
            active: primary,
            next_context: 1,
            probes: Vec::new(),
            clicks: Vec::new(),
            fills: Vec::new(),
            selections: Vec::new(),
            gotos: Vec::new(),
            escapes: 0,
            closed_contexts: Vec::new(),
            screenshots: Vec::new(),
            shutdowns: 0,
        }
    }

    /// 每个阶段的第一个候选都存在，发票详情在新页签打开
    pub fn happy() -> Self {
        let mut world = Self::blank();

        for chain in [
            USERNAME_INPUT,
            CONTINUE_BUTTON,
            PASSWORD_INPUT,
            LOGIN_SUBMIT,
            REPORTING_LINK,
            TRACKING_DETAIL_OPTION,
            TRACKING_NUMBER_INPUT,
            SEARCH_SUBMIT,
            RESULTS_TABLE,
            INVOICE_LINK,
            SEARCH_TABLE_INPUT,
            ACTION_MENU_BUTTON,
            DISPUTE_OPTION,
            DISPUTE_MODAL,
            REASON_SELECT,
            LEVEL_SELECT,
            DISPUTE_SUBMIT,
        ] {
            world.visible.insert(first(&chain));
        }
        for chain in DETAIL_CHAINS {
            world.detail.insert(first(&chain));
        }

        world.texts.insert(first(&INVOICE_LINK), "INV-0001".to_string());
        world.on_click.insert(
            first(&LOGIN_SUBMIT),
            vec![Effect::SetUrl(DASHBOARD_URL.to_string())],
        );
        world
            .on_click
            .insert(first(&INVOICE_LINK), vec![Effect::OpenContext]);
        world.on_click.insert(
            first(&DISPUTE_SUBMIT),
            vec![Effect::Show(first(&CONFIRMATION_CLOSE))],
        );
        world.on_click.insert(
            first(&CONFIRMATION_CLOSE),
            vec![Effect::Hide(first(&CONFIRMATION_CLOSE))],
        );
        world
    }

    /// 在主页签和之后打开的新页签上显示
    pub fn show(&mut self, locator: Locator) -> &mut Self {
        self.visible.insert(locator);
        self.detail.insert(locator);
        self
    }

    pub fn hide(&mut self, locator: Locator) -> &mut Self {
        self.visible.remove(&locator);
        self.detail.remove(&locator);
        self
    }

    /// 隐藏某阶段的全部候选
    pub fn hide_chain(&mut self, chain: &LocatorChain) -> &mut Self {
        for locator in chain.candidates {
            self.hide(*locator);
        }
        self
    }

    /// 当前页签上可见的元素
    pub fn active_page(&self) -> &HashSet<Locator> {
        if self.active == self.primary() {
            &self.visible
        } else {
            &self.pages[&self.active]
        }
    }

    fn active_page_mut(&mut self) -> &mut HashSet<Locator> {
        if self.active == self.primary() {
            &mut self.visible
        } else {
            self.pages.get_mut(&self.active).unwrap()
        }
    }

    pub fn primary(&self) -> ContextId {
        ContextId("ctx-0".to_string())
    }

    pub fn clicked(&self, locator: &Locator) -> bool {
        self.clicks.contains(locator)
    }

    pub fn clicked_any(&self, chain: &LocatorChain) -> bool {
        chain.candidates.iter().any(|l| self.clicked(l))
    }

    /// 登录次数（填写用户名的次数）
    pub fn login_count(&self) -> usize {
        self.fills
            .iter()
            .filter(|(l, _)| USERNAME_INPUT.candidates.contains(l))
            .count()
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::OpenContext => {
                    let id = ContextId(format!("ctx-{}", self.next_context));
                    self.next_context += 1;
                    self.pages.insert(id.clone(), self.detail.clone());
                    self.contexts.push(id);
                }
                Effect::SetUrl(url) => self.url = url,
                Effect::Show(locator) => {
                    self.active_page_mut().insert(locator);
                }
                Effect::Hide(locator) => {
                    self.active_page_mut().remove(&locator);
                }
            }
        }
    }

    fn require_visible(&self, locator: &Locator) -> Result<()> {
        if self.active_page().contains(locator) {
            Ok(())
        } else {
            bail!("元素不可见: {}", locator)
        }
    }
}

/// 脚本化的会话
pub struct FakeSurface {
    pub world: Arc<Mutex<FakeWorld>>,
}

impl FakeSurface {
    pub fn new(world: FakeWorld) -> Self {
        Self {
            world: Arc::new(Mutex::new(world)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeWorld> {
        self.world.lock().unwrap()
    }
}

#[async_trait]
impl Surface for FakeSurface {
    async fn goto(&mut self, url: &str) -> Result<()> {
        let mut world = self.lock();
        world.gotos.push(url.to_string());
        if world.failing_urls.contains(url) {
            bail!("net::ERR_CONNECTION_REFUSED at {}", url);
        }
        world.url = url.to_string();
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String> {
        Ok(self.lock().url.clone())
    }

    async fn wait_for_load(&mut self, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn is_visible(&mut self, locator: &Locator) -> Result<bool> {
        let mut world = self.lock();
        world.probes.push(*locator);
        if world.probe_errors.contains(locator) {
            bail!("Execution context was destroyed");
        }
        Ok(world.active_page().contains(locator))
    }

    async fn click(&mut self, locator: &Locator) -> Result<()> {
        let mut world = self.lock();
        world.require_visible(locator)?;
        world.clicks.push(*locator);
        if let Some(effects) = world.on_click.get(locator).cloned() {
            world.apply(effects);
        }
        Ok(())
    }

    async fn fill(&mut self, locator: &Locator, value: &str) -> Result<()> {
        let mut world = self.lock();
        world.require_visible(locator)?;
        world.fills.push((*locator, value.to_string()));
        if let Some(effects) = world.on_fill.get(value).cloned() {
            world.apply(effects);
        }
        Ok(())
    }

    async fn select_option(&mut self, locator: &Locator, label: &str) -> Result<bool> {
        let mut world = self.lock();
        world.require_visible(locator)?;
        let accepted = match world.options.get(locator) {
            Some(options) => options.iter().any(|o| o == label),
            None => true,
        };
        if accepted {
            world.selections.push((*locator, label.to_string()));
        }
        Ok(accepted)
    }

    async fn text_of(&mut self, locator: &Locator) -> Result<Option<String>> {
        let world = self.lock();
        if !world.active_page().contains(locator) {
            return Ok(None);
        }
        Ok(Some(world.texts.get(locator).cloned().unwrap_or_default()))
    }

    async fn visible_texts(&mut self, _css: &str, _limit: usize) -> Result<Vec<String>> {
        Ok(vec!["Dispute".to_string(), "Download".to_string()])
    }

    async fn body_text(&mut self) -> Result<String> {
        Ok(self.lock().body.clone())
    }

    async fn press_escape(&mut self) -> Result<()> {
        self.lock().escapes += 1;
        Ok(())
    }

    async fn contexts(&mut self) -> Result<Vec<ContextId>> {
        Ok(self.lock().contexts.clone())
    }

    fn active_context(&self) -> ContextId {
        self.lock().active.clone()
    }

    fn primary_context(&self) -> ContextId {
        self.lock().primary()
    }

    async fn switch_to(&mut self, id: &ContextId) -> Result<()> {
        let mut world = self.lock();
        if !world.contexts.contains(id) {
            return Err(anyhow!("页签不存在: {}", id));
        }
        world.active = id.clone();
        Ok(())
    }

    async fn close_context(&mut self, id: &ContextId) -> Result<()> {
        let mut world = self.lock();
        if *id == world.primary() {
            bail!("不能关闭主页签");
        }
        if !world.contexts.contains(id) {
            bail!("页签不存在: {}", id);
        }
        world.contexts.retain(|c| c != id);
        world.pages.remove(id);
        world.closed_contexts.push(id.clone());
        if world.active == *id {
            world.active = world.primary();
        }
        Ok(())
    }

    async fn screenshot(&mut self, path: &Path) -> Result<()> {
        self.lock().screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.lock().shutdowns += 1;
        Ok(())
    }
}

/// 每次打开都复制一份模板页面，并保留句柄供断言
pub struct FakeOpener {
    template: FakeWorld,
    /// 第 n 次（从 0 开始）打开时失败
    fail_on_open: HashSet<usize>,
    pub sessions: Mutex<Vec<Arc<Mutex<FakeWorld>>>>,
}

impl FakeOpener {
    pub fn new(template: FakeWorld) -> Self {
        Self {
            template,
            fail_on_open: HashSet::new(),
            sessions: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_on_open(mut self, index: usize) -> Self {
        self.fail_on_open.insert(index);
        self
    }

    pub fn opened(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn session(&self, index: usize) -> FakeWorld {
        self.sessions.lock().unwrap()[index].lock().unwrap().clone()
    }

    pub fn total_logins(&self) -> usize {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .map(|w| w.lock().unwrap().login_count())
            .sum()
    }
}

#[async_trait]
impl SessionOpener for FakeOpener {
    type Surface = FakeSurface;

    async fn open(&self) -> Result<FakeSurface> {
        let mut sessions = self.sessions.lock().unwrap();
        let index = sessions.len();
        let surface = FakeSurface::new(self.template.clone());
        sessions.push(surface.world.clone());

        if self.fail_on_open.contains(&index) {
            bail!("Failed to launch browser: no chrome executable");
        }
        Ok(surface)
    }
}

/// 内存中的凭据目录
pub struct StaticDirectory(pub Vec<Credential>);

#[async_trait]
impl CredentialDirectory for StaticDirectory {
    async fn fetch(&self, account_type_filter: &str) -> Result<Vec<Credential>, LoadError> {
        Ok(self
            .0
            .iter()
            .filter(|c| c.account_type.contains(account_type_filter))
            .cloned()
            .collect())
    }
}

pub fn credential(account_key: &str, username: &str) -> Credential {
    Credential {
        account_key: account_key.to_string(),
        username: username.to_string(),
        password: format!("{}-pw", username),
        account_type: "Primary".to_string(),
    }
}

pub fn settings() -> DriverSettings {
    DriverSettings {
        login_url: LOGIN_URL.to_string(),
        work_area_url: WORK_AREA_URL.to_string(),
        timings: Timings::instant(),
        strict_login: false,
    }
}
