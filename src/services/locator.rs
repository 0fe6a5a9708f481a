//! 定位器 - 业务能力层
//!
//! 目标页面的结构没有稳定约定，每个阶段都给出一组按顺序尝试的候选定位器，
//! 由 [`first_visible`] 统一探测：返回第一个可见的候选，全部不可见时报告该阶段失败

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::SessionError;
use crate::infrastructure::Surface;

/// 轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 会话中需要定位元素的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    UsernameInput,
    ContinueButton,
    PasswordInput,
    LoginSubmit,
    LoginErrorBanner,
    ReportingLink,
    TrackingDetailOption,
    TrackingNumberInput,
    SearchSubmit,
    ResultsTable,
    InvoiceLink,
    SearchTableInput,
    ActionMenuButton,
    ExistingDispute,
    DisputeOption,
    DisputeModal,
    ReasonSelect,
    LevelSelect,
    DisputeSubmit,
    ConfirmationClose,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::UsernameInput => "用户名输入框",
            Stage::ContinueButton => "Continue 按钮",
            Stage::PasswordInput => "密码输入框",
            Stage::LoginSubmit => "登录提交按钮",
            Stage::LoginErrorBanner => "登录错误提示",
            Stage::ReportingLink => "'Reporting & Search' 入口",
            Stage::TrackingDetailOption => "'Tracking Number Detail' 选项",
            Stage::TrackingNumberInput => "运单号输入框",
            Stage::SearchSubmit => "查询提交按钮",
            Stage::ResultsTable => "查询结果表格",
            Stage::InvoiceLink => "发票号链接",
            Stage::SearchTableInput => "'Search Table' 输入框",
            Stage::ActionMenuButton => "操作菜单按钮",
            Stage::ExistingDispute => "已有争议标记",
            Stage::DisputeOption => "'Dispute' 菜单项",
            Stage::DisputeModal => "争议弹窗",
            Stage::ReasonSelect => "争议原因下拉框",
            Stage::LevelSelect => "争议级别下拉框",
            Stage::DisputeSubmit => "争议提交按钮",
            Stage::ConfirmationClose => "确认弹窗关闭按钮",
        };
        f.write_str(name)
    }
}

/// 元素定位描述
///
/// 先按 `css` 在 `within`（若有）范围内查找，再按文本过滤，
/// 可选地跳到其后第一个匹配 `adjacent` 的兄弟元素，最后取第 `nth` 个
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Locator {
    pub css: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'static str>,
    /// 文本完全相等（否则为忽略大小写的包含）
    pub exact: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub within: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjacent: Option<&'static str>,
    pub nth: usize,
}

impl Locator {
    pub const fn css(css: &'static str) -> Self {
        Self {
            css,
            text: None,
            exact: false,
            within: None,
            adjacent: None,
            nth: 0,
        }
    }

    /// 元素文本包含 `text`
    pub const fn has_text(mut self, text: &'static str) -> Self {
        self.text = Some(text);
        self.exact = false;
        self
    }

    /// 元素文本等于 `text`
    pub const fn exact_text(mut self, text: &'static str) -> Self {
        self.text = Some(text);
        self.exact = true;
        self
    }

    pub const fn within(mut self, scope: &'static str) -> Self {
        self.within = Some(scope);
        self
    }

    /// 匹配元素之后的兄弟元素
    pub const fn adjacent(mut self, css: &'static str) -> Self {
        self.adjacent = Some(css);
        self
    }

    pub const fn nth(mut self, index: usize) -> Self {
        self.nth = index;
        self
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scope) = self.within {
            write!(f, "{} >> ", scope)?;
        }
        write!(f, "{}", self.css)?;
        if let Some(text) = self.text {
            if self.exact {
                write!(f, " text=\"{}\"", text)?;
            } else {
                write!(f, " :has-text(\"{}\")", text)?;
            }
        }
        if let Some(adjacent) = self.adjacent {
            write!(f, " ~ {}", adjacent)?;
        }
        if self.nth > 0 {
            write!(f, " >> nth={}", self.nth)?;
        }
        Ok(())
    }
}

/// 某阶段的有序候选定位器
#[derive(Debug, Clone, Copy)]
pub struct LocatorChain {
    pub stage: Stage,
    pub candidates: &'static [Locator],
}

impl LocatorChain {
    pub const fn new(stage: Stage, candidates: &'static [Locator]) -> Self {
        Self { stage, candidates }
    }
}

/// 命中的定位器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located {
    pub stage: Stage,
    pub locator: Locator,
    /// 在候选列表中的位置
    pub index: usize,
}

/// 依次尝试候选定位器，返回第一个可见的
///
/// 每个候选最多等待 `wait`（为零时只探测一次），探测出错视为不可见；
/// 全部候选都试过后返回 [`SessionError::LocatorExhausted`]
pub async fn first_visible<S>(
    surface: &mut S,
    chain: &LocatorChain,
    wait: Duration,
) -> Result<Located, SessionError>
where
    S: Surface + ?Sized,
{
    for (index, locator) in chain.candidates.iter().enumerate() {
        let deadline = Instant::now() + wait;

        loop {
            match surface.is_visible(locator).await {
                Ok(true) => {
                    debug!("✓ 找到{}: {}", chain.stage, locator);
                    return Ok(Located {
                        stage: chain.stage,
                        locator: *locator,
                        index,
                    });
                }
                Ok(false) => {}
                Err(e) => debug!("探测 {} 出错: {}", locator, e),
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            sleep(POLL_INTERVAL.min(deadline - now)).await;
        }

        debug!("   {} 未命中: {}", chain.stage, locator);
    }

    Err(SessionError::LocatorExhausted {
        stage: chain.stage,
        tried: chain.candidates.len(),
    })
}

/// 只探测一次、不报错的版本，用于可选元素
pub async fn probe<S>(surface: &mut S, chain: &LocatorChain) -> Option<Located>
where
    S: Surface + ?Sized,
{
    first_visible(surface, chain, Duration::ZERO).await.ok()
}
