//! 单个账号组处理器 - 编排层
//!
//! ## 职责
//!
//! 一个账号组只登录一次，组内运单依次处理：
//!
//! 1. **打开会话**：每组一个独立浏览器
//! 2. **登录 / 导航**：失败时整组记为 error
//! 3. **逐条处理**：委托 `SessionDriver::search_and_dispute`
//! 4. **写状态**：每条运单得到终态后立即写入状态文件
//! 5. **释放会话**：任何路径下都会关闭浏览器

use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::error::AppError;
use crate::infrastructure::{SessionOpener, Surface};
use crate::models::{DisputeStatus, MappedWorkItem, SessionResult, WorkflowStatus};
use crate::services::{Diagnostics, StateStore};
use crate::utils::logging::{log_group_complete, log_group_start};
use crate::workflow::{DriverSettings, SessionDriver};

/// 同一账号的运单
#[derive(Debug, Clone)]
pub struct AccountGroup {
    pub account_key: String,
    pub username: String,
    pub password: String,
    pub items: Vec<MappedWorkItem>,
}

/// 按账号键分组，保持首次出现的顺序
pub fn group_by_account(items: Vec<MappedWorkItem>) -> Vec<AccountGroup> {
    let mut groups: Vec<AccountGroup> = Vec::new();

    for item in items {
        match groups.iter_mut().find(|g| g.account_key == item.account_key) {
            Some(group) => group.items.push(item),
            None => groups.push(AccountGroup {
                account_key: item.account_key.clone(),
                username: item.username.clone(),
                password: item.password.clone(),
                items: vec![item],
            }),
        }
    }

    groups
}

/// 账号组处理参数
#[derive(Debug, Clone)]
pub struct GroupOptions {
    pub settings: DriverSettings,
    /// 是否真正提交争议
    pub commit: bool,
    /// 截图根目录，`None` 表示不截图
    pub screenshot_dir: Option<PathBuf>,
}

/// 账号组处理结果
#[derive(Debug, Default)]
pub struct GroupOutcome {
    pub login_attempted: bool,
    pub login_success: bool,
    pub navigation_success: bool,
    pub results: Vec<SessionResult>,
}

impl GroupOutcome {
    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_error()).count()
    }
}

/// 处理一个账号组
///
/// 不返回错误：所有失败都折算为组内运单的 error 结果
pub async fn process_account_group<O>(
    opener: &O,
    group: &AccountGroup,
    store: &mut StateStore,
    options: &GroupOptions,
    group_index: usize,
    total_groups: usize,
) -> GroupOutcome
where
    O: SessionOpener,
{
    log_group_start(
        group_index,
        total_groups,
        &group.account_key,
        &group.username,
        group.items.len(),
    );

    let mut outcome = GroupOutcome::default();
    let tag = format!("[账号 {}/{}]", group_index, total_groups);

    let surface = match opener.open().await {
        Ok(surface) => surface,
        Err(e) => {
            error!("{} ❌ 无法打开浏览器会话: {}", tag, e);
            mark_remaining(
                group,
                store,
                &mut outcome,
                &format!("无法打开浏览器会话: {}", e),
            );
            return outcome;
        }
    };

    let diagnostics = match &options.screenshot_dir {
        Some(dir) => Diagnostics::new(dir.join(&group.account_key)),
        None => Diagnostics::disabled(),
    };
    let mut driver = SessionDriver::new(surface, options.settings.clone(), diagnostics);

    if let Err(e) = drive_group(&mut driver, group, store, options.commit, &mut outcome, &tag).await
    {
        error!("{} ❌ 账号组处理中断: {}", tag, e);
        mark_remaining(group, store, &mut outcome, &e.to_string());
    }

    if let Err(e) = driver.close().await {
        warn!("{} ⚠️ 关闭浏览器失败: {}", tag, e);
    }

    let success = outcome.results.len() - outcome.error_count();
    log_group_complete(group_index, success, outcome.results.len());
    outcome
}

async fn drive_group<S>(
    driver: &mut SessionDriver<S>,
    group: &AccountGroup,
    store: &mut StateStore,
    commit: bool,
    outcome: &mut GroupOutcome,
    tag: &str,
) -> Result<(), AppError>
where
    S: Surface,
{
    outcome.login_attempted = true;
    let login = driver.login(&group.username, &group.password).await;
    if !login.success {
        mark_remaining(group, store, outcome, &login.message);
        return Ok(());
    }
    outcome.login_success = true;

    let navigation = driver.navigate_to_work_area().await;
    if !navigation.success {
        let message = format!("登录成功但无法进入账单中心: {}", navigation.message);
        mark_remaining(group, store, outcome, &message);
        return Ok(());
    }
    outcome.navigation_success = true;

    let total = group.items.len();
    for (index, item) in group.items.iter().enumerate() {
        info!(
            "\n{} [运单 {}] 处理第 {}/{} 条",
            tag,
            item.tracking_number,
            index + 1,
            total
        );

        let dispute = driver.search_and_dispute(&item.tracking_number, commit).await;
        let error_message = if dispute.status == DisputeStatus::Error {
            dispute.message.clone()
        } else {
            String::new()
        };

        let mut result = SessionResult {
            tracking_number: item.tracking_number.clone(),
            account_number: item.full_account_number.clone(),
            username: item.username.clone(),
            login_success: true,
            navigation_success: true,
            search_success: dispute.search_success,
            dispute_status: dispute.status,
            error: error_message.clone(),
        };

        // 状态写入失败的运单记为 error
        match dispute.status.workflow_status() {
            Some(status) => {
                if let Err(e) = store.update(
                    &item.tracking_number,
                    status,
                    &item.full_account_number,
                    &error_message,
                ) {
                    result.dispute_status = DisputeStatus::Error;
                    result.error = format!("写入状态失败 ({}): {}", status, e);
                    outcome.results.push(result);
                    return Err(e.into());
                }
            }
            None => info!(
                "{} [运单 {}] 📝 表单未提交，不写入状态",
                tag, item.tracking_number
            ),
        }
        outcome.results.push(result);
    }

    Ok(())
}

/// 把尚未有结果的运单全部记为 error
fn mark_remaining(
    group: &AccountGroup,
    store: &mut StateStore,
    outcome: &mut GroupOutcome,
    message: &str,
) {
    let done = outcome.results.len();
    for item in group.items.iter().skip(done) {
        warn!("[运单 {}] ❌ {}", item.tracking_number, message);

        if let Err(e) = store.update(
            &item.tracking_number,
            WorkflowStatus::Error,
            &item.full_account_number,
            message,
        ) {
            error!("[运单 {}] ❌ 写入状态失败: {}", item.tracking_number, e);
        }

        outcome.results.push(SessionResult {
            tracking_number: item.tracking_number.clone(),
            account_number: item.full_account_number.clone(),
            username: item.username.clone(),
            login_success: outcome.login_success,
            navigation_success: outcome.navigation_success,
            search_success: false,
            dispute_status: DisputeStatus::Error,
            error: message.to_string(),
        });
    }
}
