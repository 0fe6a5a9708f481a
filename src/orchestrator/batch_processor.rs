//! 批量处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次批量运行：
//!
//! 1. **加载输入**：候选运单 CSV（未指定时取输出目录中最新的抽取文件）与凭据目录
//! 2. **账号映射**：运单账号后缀 → 凭据，映射失败的运单记录原因后丢弃
//! 3. **状态过滤**：已有终态的运单跳过
//! 4. **按账号分组**：每组委托 `account_processor` 处理，组之间严格串行
//! 5. **汇总输出**：结果 CSV 与运行统计

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tracing::{info, warn};

use crate::browser::LaunchOptions;
use crate::config::Config;
use crate::infrastructure::{ChromeOpener, SessionOpener};
use crate::models::{
    find_latest_extract, load_candidates, CredentialDirectory, CsvCredentialDirectory,
    DisputeStatus, SessionResult,
};
use crate::orchestrator::account_processor::{
    group_by_account, process_account_group, GroupOptions,
};
use crate::services::{partition_pending, AccountMapper, ResultLog, StateStore};
use crate::utils::logging::log_startup;
use crate::workflow::DriverSettings;

/// 一次运行的开关（来自命令行）
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// 候选运单 CSV，未指定时自动查找
    pub csv: Option<PathBuf>,
    /// 运行前删除状态文件
    pub reset_tracking: bool,
    /// 重新处理 error 状态的运单
    pub retry_errors: bool,
    /// 真正提交争议（否则只填写表单）
    pub commit: bool,
    pub headed: bool,
    pub screenshots: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            csv: None,
            reset_tracking: false,
            retry_errors: false,
            commit: false,
            headed: false,
            screenshots: true,
        }
    }
}

/// 运行统计
#[derive(Debug, Default)]
pub struct RunSummary {
    pub candidates: usize,
    /// 映射成功的运单数
    pub mapped: usize,
    /// 没有凭据或账号的运单数
    pub unmapped: usize,
    /// 因已有状态而跳过的运单数
    pub skipped: usize,
    pub login_attempts: usize,
    pub logins: usize,
    pub work_area_arrivals: usize,
    pub results: Vec<SessionResult>,
    pub results_path: Option<PathBuf>,
}

impl RunSummary {
    /// 本次处理的运单数
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn count(&self, status: DisputeStatus) -> usize {
        self.results
            .iter()
            .filter(|r| r.dispute_status == status)
            .count()
    }

    pub fn errors(&self) -> usize {
        self.count(DisputeStatus::Error)
    }

    /// 非 error 结果占比（百分比）
    pub fn success_rate(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        (self.total() - self.errors()) as f64 / self.total() as f64 * 100.0
    }

    /// 跳过和 no_dispute_button 都不算失败
    pub fn is_success(&self) -> bool {
        self.errors() == 0
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    options: RunOptions,
}

impl App {
    pub fn new(config: Config, options: RunOptions) -> Self {
        Self { config, options }
    }

    /// 使用真实浏览器和 CSV 凭据目录运行
    pub async fn run(&self) -> Result<RunSummary> {
        let launch = LaunchOptions {
            headed: self.options.headed,
            executable: self.config.chrome_executable.as_ref().map(PathBuf::from),
        };
        let opener = ChromeOpener::new(launch, self.config.timings().navigation);
        let directory = CsvCredentialDirectory::new(&self.config.credentials_csv);

        self.run_with(&opener, &directory).await
    }

    /// 运行主逻辑
    pub async fn run_with<O>(
        &self,
        opener: &O,
        directory: &dyn CredentialDirectory,
    ) -> Result<RunSummary>
    where
        O: SessionOpener,
    {
        log_startup(
            self.options.commit,
            self.options.headed,
            self.options.retry_errors,
        );

        let state_path = self.config.state_file_path();
        if self.options.reset_tracking {
            StateStore::reset(&state_path)?;
        }

        let mut summary = RunSummary::default();

        // 加载候选运单
        let csv_path = self.resolve_candidates_csv().await?;
        let candidates = load_candidates(&csv_path).await?;
        summary.candidates = candidates.len();
        if candidates.is_empty() {
            warn!("⚠️ 没有候选运单，程序结束");
            print_final_stats(&summary);
            return Ok(summary);
        }

        // 加载凭据并映射
        info!("\n🔑 正在加载凭据...");
        let filter = &self.config.account_type_filter;
        let credentials = directory.fetch(filter).await?;
        let mapper = AccountMapper::new(&credentials, filter);
        info!("✅ 可用凭据 {} 个 (类型: {})", mapper.credential_count(), filter);

        let report = mapper.map_all(&candidates);
        summary.mapped = report.items.len();
        summary.unmapped = report.skipped.len();
        if report.items.is_empty() {
            bail!("没有任何运单映射到凭据 (共 {} 个候选运单)", candidates.len());
        }

        // 状态过滤
        let mut store = StateStore::open(&state_path);
        let (pending, skipped) =
            partition_pending(report.items, store.state(), self.options.retry_errors);
        summary.skipped = skipped;
        info!("📋 待处理 {} 个，跳过 {} 个", pending.len(), skipped);

        if pending.is_empty() {
            info!("✅ 所有运单都已处理过，没有需要处理的运单");
            print_final_stats(&summary);
            return Ok(summary);
        }

        // 按账号分组处理
        let groups = group_by_account(pending);
        let group_options = GroupOptions {
            settings: DriverSettings::from_config(&self.config),
            commit: self.options.commit,
            screenshot_dir: self
                .options
                .screenshots
                .then(|| Path::new(&self.config.output_dir).join("screenshots")),
        };

        let total_groups = groups.len();
        for (index, group) in groups.iter().enumerate() {
            let outcome = process_account_group(
                opener,
                group,
                &mut store,
                &group_options,
                index + 1,
                total_groups,
            )
            .await;

            summary.login_attempts += usize::from(outcome.login_attempted);
            summary.logins += usize::from(outcome.login_success);
            summary.work_area_arrivals += usize::from(outcome.navigation_success);
            summary.results.extend(outcome.results);
        }

        // 结果日志
        match ResultLog::new(&self.config.output_dir).write(&summary.results) {
            Ok(path) => summary.results_path = path,
            Err(e) => warn!("⚠️ 结果日志写入失败: {}", e),
        }

        print_final_stats(&summary);
        Ok(summary)
    }

    async fn resolve_candidates_csv(&self) -> Result<PathBuf> {
        if let Some(path) = &self.options.csv {
            return Ok(path.clone());
        }

        info!("\n📁 正在查找最新的候选运单文件...");
        let path = find_latest_extract(
            Path::new(&self.config.output_dir),
            &self.config.candidates_prefix,
        )
        .await?;
        info!("✓ 使用: {}", path.display());
        Ok(path)
    }
}

// ========== 日志辅助函数 ==========

fn print_final_stats(summary: &RunSummary) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!(
        "📦 候选运单: {} | 映射成功: {} | 无凭据: {} | 已处理跳过: {}",
        summary.candidates, summary.mapped, summary.unmapped, summary.skipped
    );
    info!("📄 本次处理: {}", summary.total());
    info!("🔐 登录成功: {}/{}", summary.logins, summary.login_attempts);
    info!("🧭 到达账单中心: {}", summary.work_area_arrivals);
    info!("✅ 已作废: {}", summary.count(DisputeStatus::Voided));
    info!("♻️ 之前已作废: {}", summary.count(DisputeStatus::AlreadyVoided));
    info!("🚫 没有争议按钮: {}", summary.count(DisputeStatus::NoDisputeButton));
    info!("📝 表单已填写未提交: {}", summary.count(DisputeStatus::FormReady));
    info!("❌ 失败: {}", summary.errors());
    if summary.total() > 0 {
        info!("📈 成功率: {:.1}%", summary.success_rate());
    }
    info!("{}", "=".repeat(60));
    if let Some(path) = &summary.results_path {
        info!("\n结果已保存至: {}", path.display());
    }
}
