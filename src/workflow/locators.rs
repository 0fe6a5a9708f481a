//! 各阶段的候选定位器
//!
//! 顺序即优先级。页面改版时只需要调整这里

use crate::services::locator::{Locator, LocatorChain, Stage};

/// 展开的操作菜单（菜单项的查找范围）
const ACTION_MENU_SCOPE: &str = "[role=\"menu\"], [role=\"listbox\"], .dropdown-menu";

/// 争议弹窗（作为下拉框和按钮的查找范围）
const DISPUTE_MODAL_SCOPE: &str = "[role=\"dialog\"][aria-label=\"Dispute\"], #disputes-modal";

// ========== 登录 ==========

pub const USERNAME_INPUT: LocatorChain = LocatorChain::new(
    Stage::UsernameInput,
    &[
        Locator::css("input[name=\"username\"]"),
        Locator::css("input[autocomplete=\"username\"]"),
        Locator::css("input[type=\"email\"]"),
    ],
);

pub const CONTINUE_BUTTON: LocatorChain = LocatorChain::new(
    Stage::ContinueButton,
    &[
        Locator::css("button[type=\"submit\"]").has_text("Continue"),
        Locator::css("button").has_text("Continue"),
    ],
);

pub const PASSWORD_INPUT: LocatorChain = LocatorChain::new(
    Stage::PasswordInput,
    &[Locator::css("input[type=\"password\"]")],
);

pub const LOGIN_SUBMIT: LocatorChain = LocatorChain::new(
    Stage::LoginSubmit,
    &[
        Locator::css("button[type=\"submit\"]"),
        Locator::css("button").has_text("Log In"),
    ],
);

pub const LOGIN_ERROR_BANNER: LocatorChain = LocatorChain::new(
    Stage::LoginErrorBanner,
    &[
        Locator::css(".error"),
        Locator::css(".alert-danger"),
        Locator::css("[role=\"alert\"]"),
        Locator::css("*").has_text("Invalid"),
        Locator::css("*").has_text("incorrect"),
    ],
);

// ========== 查询 ==========

pub const REPORTING_LINK: LocatorChain = LocatorChain::new(
    Stage::ReportingLink,
    &[
        Locator::css("a").has_text("Reporting & Search"),
        Locator::css("button").has_text("Reporting & Search"),
        Locator::css("a").has_text("Reporting"),
        Locator::css("[href*=\"reporting\"]"),
        Locator::css("nav a").has_text("Reporting"),
    ],
);

pub const TRACKING_DETAIL_OPTION: LocatorChain = LocatorChain::new(
    Stage::TrackingDetailOption,
    &[
        Locator::css("input[type=\"radio\"][value*=\"tracking\"]"),
        Locator::css("input[type=\"radio\"] + label").has_text("Tracking Number Detail"),
        Locator::css("label").has_text("Tracking Number Detail"),
        Locator::css("*").has_text("Tracking Number Detail"),
    ],
);

pub const TRACKING_NUMBER_INPUT: LocatorChain = LocatorChain::new(
    Stage::TrackingNumberInput,
    &[
        Locator::css("input[placeholder*=\"Tracking Number\"]"),
        Locator::css("input[name*=\"trackingNumber\"]"),
        Locator::css("input[id*=\"trackingNumber\"]"),
        Locator::css("input[name*=\"tracking\"]"),
        Locator::css("input[placeholder*=\"tracking\"]"),
        Locator::css("label").has_text("Tracking Number").adjacent("input"),
    ],
);

pub const SEARCH_SUBMIT: LocatorChain = LocatorChain::new(
    Stage::SearchSubmit,
    &[
        Locator::css("button").has_text("Submit"),
        Locator::css("input[type=\"submit\"]"),
        Locator::css("button[type=\"submit\"]"),
        Locator::css("a").has_text("Submit"),
    ],
);

pub const RESULTS_TABLE: LocatorChain =
    LocatorChain::new(Stage::ResultsTable, &[Locator::css("table")]);

/// 结果表第一行的发票号（第 3 列），点击后可能在新页签打开详情
pub const INVOICE_LINK: LocatorChain = LocatorChain::new(
    Stage::InvoiceLink,
    &[
        Locator::css("table tbody tr:first-child td:nth-child(3)"),
        Locator::css("table tbody tr:first-child a"),
    ],
);

// ========== 发票详情 ==========

pub const SEARCH_TABLE_INPUT: LocatorChain = LocatorChain::new(
    Stage::SearchTableInput,
    &[
        Locator::css("input[placeholder*=\"Search\"]"),
        Locator::css("input[type=\"search\"]"),
        Locator::css("input[aria-label*=\"Search\"]"),
    ],
);

pub const ACTION_MENU_BUTTON: LocatorChain = LocatorChain::new(
    Stage::ActionMenuButton,
    &[
        Locator::css("table tbody tr td:last-child button"),
        Locator::css("table tbody tr button"),
    ],
);

/// 操作菜单的调试清单
pub const MENU_ITEMS_CSS: &str = "[role=\"menuitem\"], [role=\"option\"], ul li, .menu-item, button";

/// 运单已有争议时菜单中出现的标记
pub const EXISTING_DISPUTE: LocatorChain = LocatorChain::new(
    Stage::ExistingDispute,
    &[
        Locator::css("[role=\"menuitem\"]").has_text("View Dispute"),
        Locator::css("*").exact_text("Disputed").within(ACTION_MENU_SCOPE),
        Locator::css("*").has_text("Dispute Submitted").within(ACTION_MENU_SCOPE),
    ],
);

pub const DISPUTE_OPTION: LocatorChain = LocatorChain::new(
    Stage::DisputeOption,
    &[
        Locator::css("[role=\"menuitem\"]").exact_text("Dispute"),
        Locator::css("*").exact_text("Dispute").within(ACTION_MENU_SCOPE),
    ],
);

pub const DISPUTE_MODAL: LocatorChain = LocatorChain::new(
    Stage::DisputeModal,
    &[
        Locator::css("[role=\"dialog\"][aria-label=\"Dispute\"]"),
        Locator::css("#disputes-modal"),
    ],
);

pub const REASON_SELECT: LocatorChain = LocatorChain::new(
    Stage::ReasonSelect,
    &[Locator::css("select").within(DISPUTE_MODAL_SCOPE)],
);

pub const LEVEL_SELECT: LocatorChain = LocatorChain::new(
    Stage::LevelSelect,
    &[Locator::css("select").within(DISPUTE_MODAL_SCOPE).nth(1)],
);

pub const DISPUTE_SUBMIT: LocatorChain = LocatorChain::new(
    Stage::DisputeSubmit,
    &[
        Locator::css("button").has_text("Submit").within(DISPUTE_MODAL_SCOPE),
        Locator::css("button[type=\"submit\"]").within(DISPUTE_MODAL_SCOPE),
    ],
);

pub const CONFIRMATION_CLOSE: LocatorChain = LocatorChain::new(
    Stage::ConfirmationClose,
    &[
        Locator::css("button").has_text("Close"),
        Locator::css("button").has_text("OK"),
        Locator::css("button").has_text("Done"),
        Locator::css("button[aria-label=\"Close\"]"),
        Locator::css("button.close"),
        Locator::css("[role=\"dialog\"] button").has_text("×"),
        Locator::css("[role=\"dialog\"] button.btn-close"),
        Locator::css("button").has_text("Continue"),
    ],
);

/// 争议原因选项
pub const REASON_LABEL: &str = "Void Credits";
/// 争议级别选项
pub const LEVEL_LABEL: &str = "Package";
