//! 会话驱动 - 流程层
//!
//! 核心职责：在一个账号会话内完成
//! 登录 → 进入账单中心 → 按运单查询 → 打开操作菜单 → 填写争议表单 → 提交
//!
//! 每个阶段都通过候选定位器查找元素，找不到就是该阶段失败，
//! 不会无限等待。打开的详情页签无论成功失败都会在本条运单结束前关闭

use std::fmt;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{Config, Timings};
use crate::error::SessionError;
use crate::infrastructure::Surface;
use crate::models::DisputeStatus;
use crate::services::locator::{first_visible, probe, Located, LocatorChain};
use crate::services::Diagnostics;
use crate::utils::logging::{mask_username, truncate_text};
use crate::workflow::locators;
use crate::workflow::temp_context::{close_extra_contexts, TemporaryContext};

/// 登录成功后 URL 中常见的片段
const LOGIN_SUCCESS_MARKERS: &[&str] = &["myups", "dashboard", "account"];
/// 账单中心 URL 片段
const WORK_AREA_URL_MARKERS: &[&str] = &["billing", "bill"];
/// 账单中心页面文字
const WORK_AREA_TEXT_MARKERS: &[&str] = &["billing center", "view and pay bills", "billing"];

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggingIn,
    LoggedIn,
    Navigating,
    OnWorkArea,
    Searching,
    ActionMenuOpen,
    DisputeFormOpen,
    Submitted,
    FormReady,
    Cleanup,
}

/// 会话驱动参数
#[derive(Debug, Clone)]
pub struct DriverSettings {
    pub login_url: String,
    pub work_area_url: String,
    pub timings: Timings,
    /// 登录结果不明确时视为失败
    pub strict_login: bool,
}

impl DriverSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            login_url: config.login_url.clone(),
            work_area_url: config.work_area_url.clone(),
            timings: config.timings(),
            strict_login: config.strict_login,
        }
    }
}

/// 登录 / 导航阶段的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub success: bool,
    pub message: String,
    /// 阶段结束时的页面地址
    pub url: String,
}

/// 单条运单的争议结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisputeOutcome {
    pub status: DisputeStatus,
    pub message: String,
    /// 是否打开了发票详情
    pub search_success: bool,
}

impl DisputeOutcome {
    fn error(search_success: bool, error: impl fmt::Display) -> Self {
        Self {
            status: DisputeStatus::Error,
            message: error.to_string(),
            search_success,
        }
    }
}

/// 登录结果判定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginVerdict {
    /// URL 中有明确的成功标记
    Success,
    /// 离开了登录页，但没有成功标记也没有错误提示
    Unclear,
    Failed(String),
}

/// 根据登录后的 URL 和错误提示判定登录结果
pub fn judge_login(url: &str, login_url: &str, banner: Option<&str>) -> LoginVerdict {
    if let Some(banner) = banner.map(str::trim).filter(|b| !b.is_empty()) {
        return LoginVerdict::Failed(format!("页面提示: {}", banner));
    }

    if strip_query(url) == strip_query(login_url) {
        return LoginVerdict::Failed(format!("提交后仍停留在登录页: {}", url));
    }

    let lower = url.to_lowercase();
    if LOGIN_SUCCESS_MARKERS.iter().any(|m| lower.contains(m)) {
        LoginVerdict::Success
    } else {
        LoginVerdict::Unclear
    }
}

/// 根据 URL 或页面文字判断是否到达账单中心
pub fn is_work_area(url: &str, body_text: &str) -> bool {
    let url = url.to_lowercase();
    let body = body_text.to_lowercase();
    WORK_AREA_URL_MARKERS.iter().any(|m| url.contains(m))
        || WORK_AREA_TEXT_MARKERS.iter().any(|m| body.contains(m))
}

fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    url[..end].trim_end_matches('/')
}

/// 合并空白并截断，用于日志和错误信息
fn compact(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_text(&collapsed, 200)
}

/// 会话驱动
///
/// - 独占一个 [`Surface`]，生命周期等于一个账号组
/// - 只返回阶段结果，不写状态文件
pub struct SessionDriver<S: Surface> {
    surface: S,
    settings: DriverSettings,
    diagnostics: Diagnostics,
    state: SessionState,
}

impl<S: Surface> SessionDriver<S> {
    pub fn new(surface: S, settings: DriverSettings, diagnostics: Diagnostics) -> Self {
        Self {
            surface,
            settings,
            diagnostics,
            state: SessionState::LoggedOut,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    // ========== 登录 ==========

    /// 两步登录：用户名 → Continue → 密码 → 提交
    pub async fn login(&mut self, username: &str, password: &str) -> StageReport {
        self.state = SessionState::LoggingIn;
        info!("🔐 登录: {}", mask_username(username));

        let url = match self.submit_login_form(username, password).await {
            Ok(url) => url,
            Err(e) => {
                warn!("❌ 登录失败: {}", e);
                self.diagnostics.capture(&mut self.surface, "login_error").await;
                self.state = SessionState::LoggedOut;
                return StageReport {
                    success: false,
                    message: SessionError::LoginFailed(e.to_string()).to_string(),
                    url: self.surface.current_url().await.unwrap_or_default(),
                };
            }
        };

        let banner = self.login_error_banner().await;
        let verdict = judge_login(&url, &self.settings.login_url, banner.as_deref());

        let (success, message) = match verdict {
            LoginVerdict::Success => (true, "登录成功".to_string()),
            LoginVerdict::Unclear if self.settings.strict_login => (
                false,
                SessionError::LoginFailed(format!("没有登录成功标记: {}", url)).to_string(),
            ),
            LoginVerdict::Unclear => {
                warn!("⚠️ 登录结果不明确，按成功处理: {}", url);
                (true, "登录成功（未发现成功标记）".to_string())
            }
            LoginVerdict::Failed(reason) => {
                (false, SessionError::LoginFailed(reason).to_string())
            }
        };

        if success {
            info!("✅ 登录成功: {}", url);
            self.state = SessionState::LoggedIn;
        } else {
            warn!("❌ {}", message);
            self.state = SessionState::LoggedOut;
        }

        StageReport {
            success,
            message,
            url,
        }
    }

    async fn submit_login_form(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<String, SessionError> {
        self.surface.goto(&self.settings.login_url).await?;
        self.diagnostics.capture(&mut self.surface, "login_page").await;

        let field = self.locate(&locators::USERNAME_INPUT).await?;
        self.surface.fill(&field.locator, username).await?;
        self.diagnostics.capture(&mut self.surface, "username_entered").await;

        self.click(&locators::CONTINUE_BUTTON).await?;
        self.wait_for_load().await;

        let field = self.locate(&locators::PASSWORD_INPUT).await?;
        self.surface.fill(&field.locator, password).await?;
        debug!("密码已输入: ********");
        self.diagnostics.capture(&mut self.surface, "password_entered").await;

        self.click(&locators::LOGIN_SUBMIT).await?;
        self.wait_for_load().await;
        self.diagnostics.capture(&mut self.surface, "after_submit").await;

        Ok(self.surface.current_url().await?)
    }

    async fn login_error_banner(&mut self) -> Option<String> {
        let found = probe(&mut self.surface, &locators::LOGIN_ERROR_BANNER).await?;
        let text = self.surface.text_of(&found.locator).await.ok().flatten()?;
        let text = compact(&text);
        (!text.is_empty()).then_some(text)
    }

    // ========== 导航 ==========

    /// 直接打开账单中心
    pub async fn navigate_to_work_area(&mut self) -> StageReport {
        self.state = SessionState::Navigating;
        info!("🧭 进入账单中心: {}", self.settings.work_area_url);

        let work_area_url = self.settings.work_area_url.clone();
        if let Err(e) = self.surface.goto(&work_area_url).await {
            self.state = SessionState::LoggedIn;
            let message = SessionError::NavigationFailed(e.to_string()).to_string();
            warn!("❌ {}", message);
            return StageReport {
                success: false,
                message,
                url: String::new(),
            };
        }
        self.settle().await;
        self.diagnostics.capture(&mut self.surface, "billing_center").await;

        let url = self.surface.current_url().await.unwrap_or_default();
        let body = self.surface.body_text().await.unwrap_or_default();

        if is_work_area(&url, &body) {
            info!("✅ 已到达账单中心: {}", url);
            self.state = SessionState::OnWorkArea;
            StageReport {
                success: true,
                message: "已到达账单中心".to_string(),
                url,
            }
        } else {
            self.state = SessionState::LoggedIn;
            let message =
                SessionError::NavigationFailed(format!("页面不是账单中心: {}", url)).to_string();
            warn!("❌ {}", message);
            StageReport {
                success: false,
                message,
                url,
            }
        }
    }

    // ========== 查询与争议 ==========

    /// 查询运单并发起作废争议
    ///
    /// `commit` 为 false 时只填写表单不提交。返回时已回到账单中心
    pub async fn search_and_dispute(&mut self, tracking_number: &str, commit: bool) -> DisputeOutcome {
        self.state = SessionState::Searching;
        info!("[运单 {}] 🔍 开始查询", tracking_number);

        let temp = match self.open_record_detail(tracking_number).await {
            Ok(temp) => temp,
            Err(e) => {
                warn!("[运单 {}] ❌ 查询失败: {}", tracking_number, e);
                self.diagnostics.capture(&mut self.surface, "search_error").await;
                self.recover_work_area().await;
                return DisputeOutcome::error(false, e);
            }
        };

        let outcome = match self.dispute_in_detail(tracking_number, commit).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.diagnostics.capture(&mut self.surface, "dispute_error").await;
                DisputeOutcome::error(true, e)
            }
        };

        self.state = SessionState::Cleanup;
        let work_area_url = self.settings.work_area_url.clone();
        if let Err(e) = temp.release(&mut self.surface, &work_area_url).await {
            warn!("[运单 {}] ⚠️ {}", tracking_number, e);
        }
        close_extra_contexts(&mut self.surface).await;
        self.settle().await;
        self.state = SessionState::OnWorkArea;

        match outcome.status {
            DisputeStatus::Error => {
                warn!("[运单 {}] ❌ {}", tracking_number, outcome.message)
            }
            status => info!(
                "[运单 {}] ✅ {:?}: {}",
                tracking_number, status, outcome.message
            ),
        }
        outcome
    }

    /// 查询运单并打开第一条结果的发票详情
    async fn open_record_detail(
        &mut self,
        tracking_number: &str,
    ) -> Result<TemporaryContext, SessionError> {
        self.click(&locators::REPORTING_LINK).await?;
        self.diagnostics.capture(&mut self.surface, "reporting_search").await;

        self.click(&locators::TRACKING_DETAIL_OPTION).await?;

        let input = self.locate(&locators::TRACKING_NUMBER_INPUT).await?;
        self.surface.fill(&input.locator, tracking_number).await?;
        self.diagnostics.capture(&mut self.surface, "tracking_entered").await;

        self.click(&locators::SEARCH_SUBMIT).await?;
        self.wait_for_load().await;

        let navigation = self.settings.timings.navigation;
        first_visible(&mut self.surface, &locators::RESULTS_TABLE, navigation).await?;
        self.settle().await;
        self.diagnostics.capture(&mut self.surface, "search_results").await;

        let invoice = self.locate(&locators::INVOICE_LINK).await?;
        if let Ok(Some(text)) = self.surface.text_of(&invoice.locator).await {
            info!("[运单 {}] 📄 发票号: {}", tracking_number, compact(&text));
        }

        let before = self.surface.contexts().await?;
        self.surface.click(&invoice.locator).await?;
        self.settle().await;

        let temp = TemporaryContext::detect(&mut self.surface, &before).await?;
        self.wait_for_load().await;
        self.diagnostics.capture(&mut self.surface, "invoice_details").await;

        Ok(temp)
    }

    /// 在发票详情中筛选运单并完成争议表单
    async fn dispute_in_detail(
        &mut self,
        tracking_number: &str,
        commit: bool,
    ) -> Result<DisputeOutcome, SessionError> {
        let input = self.locate(&locators::SEARCH_TABLE_INPUT).await?;
        self.surface.click(&input.locator).await?;
        self.surface.fill(&input.locator, "").await?;
        self.surface.fill(&input.locator, tracking_number).await?;
        self.settle().await;
        self.diagnostics.capture(&mut self.surface, "search_table_filtered").await;

        self.click(&locators::ACTION_MENU_BUTTON).await?;
        self.state = SessionState::ActionMenuOpen;
        self.diagnostics.capture(&mut self.surface, "action_menu").await;
        self.log_menu_items().await;

        if probe(&mut self.surface, &locators::EXISTING_DISPUTE).await.is_some() {
            self.dismiss_menu().await;
            return Ok(DisputeOutcome {
                status: DisputeStatus::AlreadyVoided,
                message: "运单已有争议记录".to_string(),
                search_success: true,
            });
        }

        let option = match self.locate(&locators::DISPUTE_OPTION).await {
            Ok(option) => option,
            Err(SessionError::LocatorExhausted { .. }) => {
                self.dismiss_menu().await;
                return Ok(DisputeOutcome {
                    status: DisputeStatus::NoDisputeButton,
                    message: "操作菜单中没有 'Dispute'".to_string(),
                    search_success: true,
                });
            }
            Err(e) => return Err(e),
        };
        self.surface.click(&option.locator).await?;
        self.settle().await;
        self.state = SessionState::DisputeFormOpen;

        self.locate(&locators::DISPUTE_MODAL).await?;
        self.select(&locators::REASON_SELECT, locators::REASON_LABEL).await?;
        self.select(&locators::LEVEL_SELECT, locators::LEVEL_LABEL).await?;
        self.diagnostics.capture(&mut self.surface, "dispute_form").await;

        if !commit {
            self.state = SessionState::FormReady;
            return Ok(DisputeOutcome {
                status: DisputeStatus::FormReady,
                message: "争议表单已填写，未提交".to_string(),
                search_success: true,
            });
        }

        self.click(&locators::DISPUTE_SUBMIT).await?;
        self.state = SessionState::Submitted;
        self.diagnostics.capture(&mut self.surface, "dispute_submitted").await;
        self.dismiss_confirmation().await;

        Ok(DisputeOutcome {
            status: DisputeStatus::Voided,
            message: "已提交作废争议".to_string(),
            search_success: true,
        })
    }

    async fn select(&mut self, chain: &LocatorChain, label: &str) -> Result<(), SessionError> {
        let found = self.locate(chain).await?;
        if !self.surface.select_option(&found.locator, label).await? {
            return Err(SessionError::OptionMissing {
                stage: chain.stage,
                label: label.to_string(),
            });
        }
        debug!("✓ {} 已选择 '{}'", chain.stage, label);
        self.settle().await;
        Ok(())
    }

    /// 关闭提交后的确认弹窗，没有关闭按钮时按 Escape
    async fn dismiss_confirmation(&mut self) {
        let wait = self.settings.timings.settle;
        match first_visible(&mut self.surface, &locators::CONFIRMATION_CLOSE, wait).await {
            Ok(found) => {
                if let Err(e) = self.surface.click(&found.locator).await {
                    warn!("⚠️ 无法关闭确认弹窗: {}", e);
                }
            }
            Err(_) => {
                warn!("⚠️ 没有找到关闭按钮，按 Escape");
                if let Err(e) = self.surface.press_escape().await {
                    warn!("⚠️ 无法关闭确认弹窗: {}", e);
                }
            }
        }
        self.settle().await;
        self.diagnostics.capture(&mut self.surface, "confirmation_closed").await;
    }

    async fn dismiss_menu(&mut self) {
        if let Err(e) = self.surface.press_escape().await {
            debug!("关闭菜单失败: {}", e);
        }
    }

    async fn log_menu_items(&mut self) {
        match self.surface.visible_texts(locators::MENU_ITEMS_CSS, 10).await {
            Ok(items) => {
                debug!("📋 菜单项 {} 个", items.len());
                for (i, item) in items.iter().enumerate() {
                    debug!("   {}: '{}'", i + 1, compact(item));
                }
            }
            Err(e) => debug!("无法读取菜单项: {}", e),
        }
    }

    /// 查询失败后关闭多余页签并回到账单中心
    async fn recover_work_area(&mut self) {
        self.state = SessionState::Cleanup;
        close_extra_contexts(&mut self.surface).await;
        let work_area_url = self.settings.work_area_url.clone();
        if let Err(e) = self.surface.goto(&work_area_url).await {
            warn!("⚠️ 无法返回账单中心: {}", e);
        }
        self.settle().await;
        self.state = SessionState::OnWorkArea;
    }

    /// 结束会话并释放浏览器
    pub async fn close(&mut self) -> anyhow::Result<()> {
        self.state = SessionState::LoggedOut;
        self.surface.shutdown().await
    }

    // ========== 辅助 ==========

    async fn locate(&mut self, chain: &LocatorChain) -> Result<Located, SessionError> {
        let wait = self.settings.timings.locator_wait;
        first_visible(&mut self.surface, chain, wait).await
    }

    async fn click(&mut self, chain: &LocatorChain) -> Result<Located, SessionError> {
        let found = self.locate(chain).await?;
        self.surface.click(&found.locator).await?;
        self.settle().await;
        Ok(found)
    }

    async fn wait_for_load(&mut self) {
        let navigation = self.settings.timings.navigation;
        if let Err(e) = self.surface.wait_for_load(navigation).await {
            debug!("等待页面加载: {}", e);
        }
    }

    async fn settle(&self) {
        let settle = self.settings.timings.settle;
        if settle > Duration::ZERO {
            sleep(settle).await;
        }
    }
}
