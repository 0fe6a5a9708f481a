mod common;

use std::sync::{Arc, Mutex};

use common::*;
use ups_void_runner::models::DisputeStatus;
use ups_void_runner::services::Diagnostics;
use ups_void_runner::workflow::locators::*;
use ups_void_runner::workflow::{DriverSettings, SessionDriver, SessionState};

fn driver_with(
    world: FakeWorld,
    settings: DriverSettings,
) -> (SessionDriver<FakeSurface>, Arc<Mutex<FakeWorld>>) {
    let surface = FakeSurface::new(world);
    let handle = surface.world.clone();
    (
        SessionDriver::new(surface, settings, Diagnostics::disabled()),
        handle,
    )
}

fn driver(world: FakeWorld) -> (SessionDriver<FakeSurface>, Arc<Mutex<FakeWorld>>) {
    driver_with(world, settings())
}

async fn logged_in(world: FakeWorld) -> (SessionDriver<FakeSurface>, Arc<Mutex<FakeWorld>>) {
    let (mut driver, handle) = driver(world);
    assert!(driver.login("u1", "u1-pw").await.success);
    assert!(driver.navigate_to_work_area().await.success);
    (driver, handle)
}

// ========== 登录 ==========

#[tokio::test]
async fn test_login_two_step_form() {
    let (mut driver, world) = driver(FakeWorld::happy());

    let report = driver.login("shipping_user", "secret").await;

    assert!(report.success, "{}", report.message);
    assert_eq!(report.url, DASHBOARD_URL);
    assert_eq!(driver.state(), SessionState::LoggedIn);

    let world = world.lock().unwrap();
    assert_eq!(world.gotos[0], LOGIN_URL);
    assert_eq!(
        world.fills,
        vec![
            (USERNAME_INPUT.candidates[0], "shipping_user".to_string()),
            (PASSWORD_INPUT.candidates[0], "secret".to_string()),
        ]
    );
    assert!(world.clicked(&CONTINUE_BUTTON.candidates[0]));
}

#[tokio::test]
async fn test_login_error_banner_fails_with_banner_text() {
    let mut world = FakeWorld::happy();
    let banner = LOGIN_ERROR_BANNER.candidates[2];
    world
        .texts
        .insert(banner, "Invalid   username or\n password".to_string());
    world
        .on_fill
        .insert("bad_user".to_string(), vec![Effect::Show(banner)]);
    let (mut driver, _) = driver(world);

    let report = driver.login("bad_user", "nope").await;

    assert!(!report.success);
    assert!(
        report.message.contains("Invalid username or password"),
        "{}",
        report.message
    );
    assert_eq!(driver.state(), SessionState::LoggedOut);
}

#[tokio::test]
async fn test_login_still_on_login_page_fails() {
    let mut world = FakeWorld::happy();
    world.on_click.remove(&LOGIN_SUBMIT.candidates[0]);
    let (mut driver, _) = driver(world);

    let report = driver.login("u1", "pw").await;

    assert!(!report.success);
    assert_eq!(report.url, LOGIN_URL);
}

#[tokio::test]
async fn test_login_missing_password_field_fails() {
    let mut world = FakeWorld::happy();
    world.hide_chain(&PASSWORD_INPUT);
    let (mut driver, _) = driver(world);

    let report = driver.login("u1", "pw").await;

    assert!(!report.success);
    assert!(report.message.contains("密码输入框"), "{}", report.message);
}

#[tokio::test]
async fn test_unclear_login_depends_on_strict_mode() {
    let unclear = || {
        let mut world = FakeWorld::happy();
        world.on_click.insert(
            LOGIN_SUBMIT.candidates[0],
            vec![Effect::SetUrl("https://www.ups.com/us/en/Home.page".to_string())],
        );
        world
    };

    let (mut lenient, _) = driver(unclear());
    assert!(lenient.login("u1", "pw").await.success);

    let strict_settings = DriverSettings {
        strict_login: true,
        ..settings()
    };
    let (mut strict, _) = driver_with(unclear(), strict_settings);
    let report = strict.login("u1", "pw").await;
    assert!(!report.success);
    assert!(report.message.contains("没有登录成功标记"));
}

// ========== 导航 ==========

#[tokio::test]
async fn test_navigation_uses_deep_link() {
    let (mut driver, world) = driver(FakeWorld::happy());
    driver.login("u1", "pw").await;

    let report = driver.navigate_to_work_area().await;

    assert!(report.success);
    assert_eq!(driver.state(), SessionState::OnWorkArea);
    assert_eq!(world.lock().unwrap().gotos.last().unwrap(), WORK_AREA_URL);
}

#[tokio::test]
async fn test_navigation_failure_reported() {
    let mut world = FakeWorld::happy();
    world.failing_urls.insert(WORK_AREA_URL.to_string());
    let (mut driver, _) = driver(world);
    driver.login("u1", "pw").await;

    let report = driver.navigate_to_work_area().await;

    assert!(!report.success);
    assert!(report.message.contains("导航到账单中心失败"));
    assert_ne!(driver.state(), SessionState::OnWorkArea);
}

#[tokio::test]
async fn test_navigation_to_unexpected_page_fails() {
    let other = DriverSettings {
        work_area_url: "https://www.ups.com/us/en/Home.page".to_string(),
        ..settings()
    };
    let (mut driver, _) = driver_with(FakeWorld::happy(), other);
    driver.login("u1", "pw").await;

    assert!(!driver.navigate_to_work_area().await.success);
}

// ========== 查询与争议 ==========

#[tokio::test]
async fn test_commit_submits_and_closes_detail_tab() {
    let (mut driver, world) = logged_in(FakeWorld::happy()).await;

    let outcome = driver.search_and_dispute("1Z_A", true).await;

    assert_eq!(outcome.status, DisputeStatus::Voided);
    assert!(outcome.search_success);
    assert_eq!(driver.state(), SessionState::OnWorkArea);

    let world = world.lock().unwrap();
    assert!(world.clicked(&DISPUTE_SUBMIT.candidates[0]));
    assert!(world.clicked(&CONFIRMATION_CLOSE.candidates[0]));
    assert_eq!(
        world.selections,
        vec![
            (REASON_SELECT.candidates[0], REASON_LABEL.to_string()),
            (LEVEL_SELECT.candidates[0], LEVEL_LABEL.to_string()),
        ]
    );
    assert_eq!(world.contexts, vec![world.primary()]);
    assert_eq!(world.active, world.primary());
    assert_eq!(world.closed_contexts.len(), 1);
    assert_eq!(world.escapes, 0);
}

#[tokio::test]
async fn test_tracking_number_entered_in_both_searches() {
    let (mut driver, world) = logged_in(FakeWorld::happy()).await;

    driver.search_and_dispute("1Z_A", true).await;

    let world = world.lock().unwrap();
    assert!(world
        .fills
        .contains(&(TRACKING_NUMBER_INPUT.candidates[0], "1Z_A".to_string())));
    assert!(world
        .fills
        .contains(&(SEARCH_TABLE_INPUT.candidates[0], "1Z_A".to_string())));
}

#[tokio::test]
async fn test_confirmation_without_close_button_presses_escape() {
    let mut world = FakeWorld::happy();
    world.on_click.remove(&DISPUTE_SUBMIT.candidates[0]);
    let (mut driver, world) = logged_in(world).await;

    let outcome = driver.search_and_dispute("1Z_A", true).await;

    assert_eq!(outcome.status, DisputeStatus::Voided);
    assert_eq!(world.lock().unwrap().escapes, 1);
}

#[tokio::test]
async fn test_staged_mode_stops_at_form_ready() {
    let (mut driver, world) = logged_in(FakeWorld::happy()).await;

    let outcome = driver.search_and_dispute("1Z_A", false).await;

    assert_eq!(outcome.status, DisputeStatus::FormReady);
    let world = world.lock().unwrap();
    assert!(!world.clicked_any(&DISPUTE_SUBMIT));
    assert_eq!(world.selections.len(), 2);
    assert_eq!(world.contexts, vec![world.primary()]);
}

#[tokio::test]
async fn test_missing_dispute_option_is_terminal_not_error() {
    let mut world = FakeWorld::happy();
    world.hide_chain(&DISPUTE_OPTION);
    let (mut driver, world) = logged_in(world).await;

    let outcome = driver.search_and_dispute("1Z_A", true).await;

    assert_eq!(outcome.status, DisputeStatus::NoDisputeButton);
    assert!(outcome.search_success);
    let world = world.lock().unwrap();
    assert_eq!(world.escapes, 1);
    assert!(world.selections.is_empty());
    assert_eq!(world.contexts, vec![world.primary()]);
    assert_eq!(world.closed_contexts.len(), 1);
}

#[tokio::test]
async fn test_existing_dispute_concludes_already_voided() {
    let mut world = FakeWorld::happy();
    world.show(EXISTING_DISPUTE.candidates[0]);
    let (mut driver, world) = logged_in(world).await;

    let outcome = driver.search_and_dispute("1Z_A", true).await;

    assert_eq!(outcome.status, DisputeStatus::AlreadyVoided);
    let world = world.lock().unwrap();
    assert!(!world.clicked_any(&DISPUTE_OPTION));
    assert_eq!(world.contexts, vec![world.primary()]);
}

#[tokio::test]
async fn test_missing_level_select_is_error_and_tab_closed() {
    let mut world = FakeWorld::happy();
    world.hide_chain(&LEVEL_SELECT);
    let (mut driver, world) = logged_in(world).await;

    let outcome = driver.search_and_dispute("1Z_A", true).await;

    assert_eq!(outcome.status, DisputeStatus::Error);
    assert!(outcome.search_success);
    assert!(outcome.message.contains("争议级别下拉框"), "{}", outcome.message);

    let world = world.lock().unwrap();
    assert!(!world.clicked_any(&DISPUTE_SUBMIT));
    assert_eq!(world.contexts, vec![world.primary()]);
    assert_eq!(world.active, world.primary());
}

#[tokio::test]
async fn test_missing_reason_option_is_error() {
    let mut world = FakeWorld::happy();
    world.options.insert(
        REASON_SELECT.candidates[0],
        vec!["Billing Error".to_string()],
    );
    let (mut driver, _) = logged_in(world).await;

    let outcome = driver.search_and_dispute("1Z_A", true).await;

    assert_eq!(outcome.status, DisputeStatus::Error);
    assert!(outcome.message.contains(REASON_LABEL), "{}", outcome.message);
}

#[tokio::test]
async fn test_search_failure_returns_to_work_area() {
    let mut world = FakeWorld::happy();
    world.hide_chain(&RESULTS_TABLE);
    let (mut driver, world) = logged_in(world).await;

    let outcome = driver.search_and_dispute("1Z_A", true).await;

    assert_eq!(outcome.status, DisputeStatus::Error);
    assert!(!outcome.search_success);
    assert!(outcome.message.contains("查询结果表格"), "{}", outcome.message);
    assert_eq!(driver.state(), SessionState::OnWorkArea);
    assert_eq!(world.lock().unwrap().gotos.last().unwrap(), WORK_AREA_URL);
}

#[tokio::test]
async fn test_same_tab_detail_navigates_back() {
    let mut world = FakeWorld::happy();
    world.on_click.remove(&INVOICE_LINK.candidates[0]);
    let (mut driver, world) = logged_in(world).await;

    let outcome = driver.search_and_dispute("1Z_A", true).await;

    assert_eq!(outcome.status, DisputeStatus::Voided);
    let world = world.lock().unwrap();
    assert!(world.closed_contexts.is_empty());
    assert_eq!(world.gotos.last().unwrap(), WORK_AREA_URL);
}

/// 详情页元素只存在于新页签
fn detail_only_in_new_tab() -> FakeWorld {
    let mut world = FakeWorld::happy();
    for chain in DETAIL_CHAINS {
        for locator in chain.candidates {
            world.visible.remove(locator);
        }
    }
    world
}

#[tokio::test]
async fn test_dispute_runs_in_spawned_tab() {
    let (mut driver, world) = logged_in(detail_only_in_new_tab()).await;

    let outcome = driver.search_and_dispute("1Z_A", true).await;

    assert_eq!(outcome.status, DisputeStatus::Voided, "{}", outcome.message);
    let world = world.lock().unwrap();
    assert!(world.clicked(&ACTION_MENU_BUTTON.candidates[0]));
    assert!(world.clicked(&DISPUTE_SUBMIT.candidates[0]));
    assert_eq!(world.active, world.primary());
    assert!(world.pages.is_empty());
    // 主页签上没有留下确认弹窗
    assert!(!world.visible.contains(&CONFIRMATION_CLOSE.candidates[0]));
}

#[tokio::test]
async fn test_dispute_not_attempted_on_opener_page() {
    let mut world = detail_only_in_new_tab();
    world.on_click.remove(&INVOICE_LINK.candidates[0]);
    let (mut driver, world) = logged_in(world).await;

    let outcome = driver.search_and_dispute("1Z_A", true).await;

    assert_eq!(outcome.status, DisputeStatus::Error);
    assert!(outcome.message.contains("'Search Table' 输入框"), "{}", outcome.message);
    assert!(!world.lock().unwrap().clicked_any(&ACTION_MENU_BUTTON));
}

#[tokio::test]
async fn test_stray_tabs_are_swept() {
    let mut world = FakeWorld::happy();
    world.on_click.insert(
        INVOICE_LINK.candidates[0],
        vec![Effect::OpenContext, Effect::OpenContext],
    );
    let (mut driver, world) = logged_in(world).await;

    driver.search_and_dispute("1Z_A", true).await;
    driver.search_and_dispute("1Z_B", true).await;

    let world = world.lock().unwrap();
    assert_eq!(world.contexts, vec![world.primary()]);
    assert_eq!(world.closed_contexts.len(), 4);
}

#[tokio::test]
async fn test_close_shuts_down_surface() {
    let (mut driver, world) = logged_in(FakeWorld::happy()).await;

    driver.close().await.unwrap();

    assert_eq!(driver.state(), SessionState::LoggedOut);
    assert_eq!(world.lock().unwrap().shutdowns, 1);
}

#[tokio::test]
async fn test_diagnostics_capture_numbered_screenshots() {
    let dir = tempfile::tempdir().unwrap();
    let surface = FakeSurface::new(FakeWorld::happy());
    let world = surface.world.clone();
    let mut driver = SessionDriver::new(surface, settings(), Diagnostics::new(dir.path()));

    driver.login("u1", "pw").await;

    let world = world.lock().unwrap();
    assert!(!world.screenshots.is_empty());
    let first = world.screenshots[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(first.starts_with("01_login_page_"), "{}", first);
    assert!(world.screenshots[0].starts_with(dir.path()));
}
