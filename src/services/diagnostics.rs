//! 诊断截图 - 业务能力层
//!
//! 每个阶段留一张截图，文件名 `NN_阶段_时间.png`。截图失败只记录日志

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::infrastructure::Surface;

/// 截图记录器
pub struct Diagnostics {
    dir: Option<PathBuf>,
    counter: usize,
}

impl Diagnostics {
    /// 截图保存到 `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            counter: 0,
        }
    }

    /// 不截图
    pub fn disabled() -> Self {
        Self {
            dir: None,
            counter: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    /// 截取当前页面
    ///
    /// 返回保存的路径；未启用或失败时返回 `None`
    pub async fn capture<S>(&mut self, surface: &mut S, name: &str) -> Option<PathBuf>
    where
        S: Surface + ?Sized,
    {
        let dir = self.dir.as_ref()?;

        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!("⚠️ 无法创建截图目录 {}: {}", dir.display(), e);
            return None;
        }

        self.counter += 1;
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let path = dir.join(screenshot_name(self.counter, name, &timestamp));

        match surface.screenshot(&path).await {
            Ok(()) => {
                debug!("📸 截图: {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("⚠️ 截图失败 ({}): {}", name, e);
                None
            }
        }
    }
}

fn screenshot_name(index: usize, name: &str, timestamp: &str) -> String {
    let name: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{:02}_{}_{}.png", index, name, timestamp)
}
