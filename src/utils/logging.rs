/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use tracing::info;

/// 记录程序启动信息
pub fn log_startup(commit: bool, headed: bool, retry_errors: bool) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - UPS 运单作废争议批处理");
    info!(
        "📊 模式: {} | 浏览器: {} | 重试错误: {}",
        if commit { "提交争议" } else { "只填写表单" },
        if headed { "有界面" } else { "无头" },
        if retry_errors { "是" } else { "否" }
    );
    info!("{}", "=".repeat(60));
}

/// 记录账号组开始信息
///
/// # 参数
/// - `group_index`: 账号组编号（从 1 开始）
/// - `total_groups`: 账号组总数
/// - `account_key`: 账号键
/// - `username`: 登录用户名（只显示前几位）
/// - `items`: 本组运单数
pub fn log_group_start(
    group_index: usize,
    total_groups: usize,
    account_key: &str,
    username: &str,
    items: usize,
) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 个账号: {}", group_index, total_groups, account_key);
    info!("👤 用户: {} | 📄 运单数: {}", mask_username(username), items);
    info!("{}", "=".repeat(60));
}

/// 记录账号组完成信息
pub fn log_group_complete(group_index: usize, success: usize, total: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 第 {} 个账号完成: 成功 {}/{}", group_index, success, total);
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

/// 用户名只保留前 4 位
pub fn mask_username(username: &str) -> String {
    let visible: String = username.chars().take(4).collect();
    if username.chars().count() > 4 {
        format!("{}****", visible)
    } else {
        visible
    }
}
