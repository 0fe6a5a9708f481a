use crate::error::LoadError;
use crate::models::shipment::Candidate;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::{info, warn};

/// 从 CSV 文件加载候选运单
///
/// 表头需包含 tracking_number / account_number，状态列可选
pub async fn load_candidates(csv_path: &Path) -> Result<Vec<Candidate>, LoadError> {
    let shown = csv_path.display().to_string();

    if !csv_path.exists() {
        return Err(LoadError::NotFound(shown));
    }

    let content = fs::read_to_string(csv_path)
        .await
        .map_err(|source| LoadError::Io {
            path: shown.clone(),
            source,
        })?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut candidates = Vec::new();
    for row in reader.deserialize::<Candidate>() {
        let candidate = row.map_err(|source| LoadError::Csv {
            path: shown.clone(),
            source,
        })?;
        if candidate.tracking_number.is_empty() {
            warn!("跳过没有运单号的行 (账号: {})", candidate.account_number);
            continue;
        }
        candidates.push(candidate);
    }

    info!("✅ 从 {} 加载了 {} 个候选运单", shown, candidates.len());
    for candidate in candidates.iter().take(3) {
        info!(
            "   📦 {} (账号: {})",
            candidate.tracking_number, candidate.account_number
        );
    }

    Ok(candidates)
}

/// 在输出目录中查找最新的 `<prefix>*.csv`（按修改时间）
pub async fn find_latest_extract(dir: &Path, prefix: &str) -> Result<PathBuf, LoadError> {
    let no_extract = || LoadError::NoExtract {
        dir: dir.display().to_string(),
        prefix: prefix.to_string(),
    };

    if !dir.exists() {
        return Err(no_extract());
    }

    let mut entries = fs::read_dir(dir).await.map_err(|source| LoadError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let mut latest: Option<(SystemTime, PathBuf)> = None;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(prefix) && name.ends_with(".csv"))
            .unwrap_or(false);
        if !matches {
            continue;
        }

        let modified = match entry.metadata().await.and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                warn!("无法读取文件时间 {}: {}", path.display(), e);
                continue;
            }
        };

        if latest.as_ref().map_or(true, |(time, _)| modified > *time) {
            latest = Some((modified, path));
        }
    }

    let (modified, path) = latest.ok_or_else(no_extract)?;
    info!("📁 找到最新的运单文件: {}", path.display());
    info!(
        "   修改时间: {}",
        chrono::DateTime::<chrono::Local>::from(modified).format("%Y-%m-%d %H:%M:%S")
    );

    Ok(path)
}
