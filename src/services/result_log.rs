//! 结果日志 - 业务能力层
//!
//! 只负责把本次运行的 [`SessionResult`] 写成 CSV，不关心流程

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::models::SessionResult;

/// 结果日志写入服务
pub struct ResultLog {
    output_dir: PathBuf,
}

impl ResultLog {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// 写入 `ups_void_automation_results_<时间>.csv`
    ///
    /// 没有结果时不生成文件
    pub fn write(&self, results: &[SessionResult]) -> Result<Option<PathBuf>> {
        if results.is_empty() {
            debug!("没有结果需要写入");
            return Ok(None);
        }

        std::fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("无法创建输出目录: {}", self.output_dir.display()))?;

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = self
            .output_dir
            .join(format!("ups_void_automation_results_{}.csv", timestamp));

        write_results(&path, results)?;
        info!("💾 结果已保存: {}", path.display());
        Ok(Some(path))
    }
}

/// 写入指定文件（覆盖）
pub fn write_results(path: &Path, results: &[SessionResult]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("无法创建结果文件: {}", path.display()))?;

    for result in results {
        writer.serialize(result)?;
    }
    writer.flush()?;
    Ok(())
}
