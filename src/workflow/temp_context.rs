//! 临时浏览上下文
//!
//! 打开发票详情可能弹出新页签，也可能在当前页签跳转。
//! 打开方调用 [`TemporaryContext::detect`] 得到句柄，流程结束时必须调用
//! [`TemporaryContext::release`]：关闭新页签并回到主页签，或把当前页签导航回工作区

use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::infrastructure::{ContextId, Surface};

/// 一条运单的详情页上下文
#[derive(Debug)]
#[must_use = "临时上下文必须调用 release 释放"]
pub struct TemporaryContext {
    id: ContextId,
    spawned: bool,
}

impl TemporaryContext {
    /// 点击后比较页签列表，有新页签则切换过去
    ///
    /// `before` 为点击前的页签列表
    pub async fn detect<S>(surface: &mut S, before: &[ContextId]) -> Result<Self, SessionError>
    where
        S: Surface + ?Sized,
    {
        let after = surface
            .contexts()
            .await
            .map_err(|e| SessionError::ContextHandling(format!("无法获取页签列表: {}", e)))?;

        debug!("📊 页签数: 点击前 {} / 点击后 {}", before.len(), after.len());

        match after.into_iter().filter(|id| !before.contains(id)).last() {
            Some(id) => {
                surface.switch_to(&id).await.map_err(|e| {
                    SessionError::ContextHandling(format!("无法切换到新页签: {}", e))
                })?;
                info!("✅ 检测到新页签，已切换");
                Ok(Self { id, spawned: true })
            }
            None => {
                info!("ℹ️ 没有新页签，详情在当前页签打开");
                Ok(Self {
                    id: surface.active_context(),
                    spawned: false,
                })
            }
        }
    }

    pub fn id(&self) -> &ContextId {
        &self.id
    }

    /// 是否是新弹出的页签
    pub fn is_spawned(&self) -> bool {
        self.spawned
    }

    /// 释放上下文，回到工作区
    pub async fn release<S>(self, surface: &mut S, work_area_url: &str) -> Result<(), SessionError>
    where
        S: Surface + ?Sized,
    {
        if self.spawned {
            surface
                .close_context(&self.id)
                .await
                .map_err(|e| SessionError::ContextHandling(format!("无法关闭详情页签: {}", e)))?;
            let primary = surface.primary_context();
            surface
                .switch_to(&primary)
                .await
                .map_err(|e| SessionError::ContextHandling(format!("无法回到主页签: {}", e)))?;
            debug!("🗑️ 已关闭详情页签");
        } else {
            surface.goto(work_area_url).await.map_err(|e| {
                SessionError::ContextHandling(format!("无法返回账单中心: {}", e))
            })?;
            debug!("↩️ 已返回账单中心");
        }
        Ok(())
    }
}

/// 关闭主页签以外的所有页签并切回主页签，返回关闭的数量
pub async fn close_extra_contexts<S>(surface: &mut S) -> usize
where
    S: Surface + ?Sized,
{
    let primary = surface.primary_context();
    let contexts = match surface.contexts().await {
        Ok(contexts) => contexts,
        Err(e) => {
            warn!("⚠️ 无法获取页签列表: {}", e);
            return 0;
        }
    };

    let mut closed = 0;
    for id in contexts.iter().filter(|id| **id != primary) {
        match surface.close_context(id).await {
            Ok(()) => closed += 1,
            Err(e) => warn!("⚠️ 无法关闭多余页签 {}: {}", id, e),
        }
    }

    if surface.active_context() != primary {
        if let Err(e) = surface.switch_to(&primary).await {
            warn!("⚠️ 无法回到主页签: {}", e);
        }
    }

    if closed > 0 {
        info!("🧹 清理了 {} 个多余页签", closed);
    }
    closed
}
