//! 页面内执行的定位脚本
//!
//! 把 [`Locator`] 序列化后嵌入同一段脚本，由脚本在页面中解析元素并执行动作

use anyhow::Result;
use serde::Serialize;

use crate::services::locator::Locator;

/// 对定位到的元素执行的动作
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomAction<'a> {
    /// 是否可见，返回 bool
    Probe,
    /// 返回 "ok" / "missing"
    Click,
    Fill { value: &'a str },
    /// 返回 "ok" / "missing" / "no-option"
    Select { label: &'a str },
    /// 返回文本或 null
    Text,
}

const RESOLVER: &str = r#"
(() => {
    const desc = __LOCATOR__;
    const action = __ACTION__;
    const norm = (t) => (t || '').replace(/\s+/g, ' ').trim();
    const visible = (el) => {
        if (!el || !el.isConnected) return false;
        const style = window.getComputedStyle(el);
        if (style.visibility === 'hidden' || style.display === 'none') return false;
        const rect = el.getBoundingClientRect();
        return rect.width > 0 && rect.height > 0;
    };

    const roots = desc.within
        ? Array.from(document.querySelectorAll(desc.within)).filter(visible)
        : [document];

    let matches = [];
    for (const root of roots) {
        for (const el of root.querySelectorAll(desc.css)) {
            if (desc.text != null) {
                const text = norm(el.innerText || el.textContent);
                const hit = desc.exact
                    ? text === desc.text
                    : text.toLowerCase().includes(desc.text.toLowerCase());
                if (!hit) continue;
            }
            matches.push(el);
        }
    }

    // 文本匹配时只保留最内层元素
    if (desc.text != null) {
        matches = matches.filter((m) => !matches.some((o) => o !== m && m.contains(o)));
    }

    if (desc.adjacent) {
        const targets = [];
        for (const el of matches) {
            for (let sib = el.nextElementSibling; sib; sib = sib.nextElementSibling) {
                if (sib.matches(desc.adjacent)) {
                    if (!targets.includes(sib)) targets.push(sib);
                    break;
                }
            }
        }
        matches = targets;
    }

    const el = matches.filter(visible)[desc.nth] || null;

    switch (action.kind) {
        case 'probe':
            return el !== null;
        case 'text':
            return el ? norm(el.innerText || el.textContent) : null;
        case 'click':
            if (!el) return 'missing';
            el.scrollIntoView({ block: 'center' });
            el.click();
            return 'ok';
        case 'fill': {
            if (!el) return 'missing';
            el.focus();
            const proto = el instanceof HTMLTextAreaElement
                ? HTMLTextAreaElement.prototype
                : HTMLInputElement.prototype;
            const setter = Object.getOwnPropertyDescriptor(proto, 'value').set;
            setter.call(el, action.value);
            el.dispatchEvent(new Event('input', { bubbles: true }));
            el.dispatchEvent(new Event('change', { bubbles: true }));
            return 'ok';
        }
        case 'select': {
            if (!el || el.tagName !== 'SELECT') return 'missing';
            const option = Array.from(el.options).find((o) => norm(o.textContent) === action.label);
            if (!option) return 'no-option';
            el.value = option.value;
            el.dispatchEvent(new Event('input', { bubbles: true }));
            el.dispatchEvent(new Event('change', { bubbles: true }));
            return 'ok';
        }
        default:
            return null;
    }
})()
"#;

/// 生成针对 `locator` 执行 `action` 的脚本
pub fn locator_script(locator: &Locator, action: &DomAction<'_>) -> Result<String> {
    let desc = serde_json::to_string(locator)?;
    let action = serde_json::to_string(action)?;
    Ok(RESOLVER
        .replacen("__LOCATOR__", &desc, 1)
        .replacen("__ACTION__", &action, 1))
}

/// 收集可见元素文本
pub fn visible_texts_script(css: &str, limit: usize) -> Result<String> {
    Ok(format!(
        r#"
        (() => {{
            const norm = (t) => (t || '').replace(/\s+/g, ' ').trim();
            const out = [];
            for (const el of document.querySelectorAll({})) {{
                const rect = el.getBoundingClientRect();
                if (rect.width === 0 || rect.height === 0) continue;
                const text = norm(el.innerText || el.textContent);
                if (text && !out.includes(text)) out.push(text);
                if (out.length >= {}) break;
            }}
            return out;
        }})()
        "#,
        serde_json::to_string(css)?,
        limit
    ))
}

pub const BODY_TEXT_SCRIPT: &str = "document.body ? document.body.innerText : ''";
