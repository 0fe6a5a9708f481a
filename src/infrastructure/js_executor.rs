//! 页面脚本执行 - 基础设施层
//!
//! 会话里同一时刻只有一个活动页签，切换页签就是替换这里持有的 [`Page`]

use anyhow::{Context, Result};
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// 活动页签上的脚本执行器
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 当前活动页签
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 切换活动页签，返回之前的页签
    pub fn replace_page(&mut self, page: Page) -> Page {
        std::mem::replace(&mut self.page, page)
    }

    /// 在活动页签执行脚本，返回 JSON 结果（脚本返回 undefined 时为 null）
    pub async fn eval(&self, script: impl Into<String>) -> Result<JsonValue> {
        let result = self
            .page
            .evaluate(script.into())
            .await
            .context("页面脚本执行失败")?;
        Ok(result.value().cloned().unwrap_or(JsonValue::Null))
    }

    pub async fn eval_as<T: DeserializeOwned>(&self, script: impl Into<String>) -> Result<T> {
        let value = self.eval(script).await?;
        serde_json::from_value(value).context("页面脚本返回了意外的结果")
    }
}
