//! In-page probes run at a screen coordinate.
//!
//! Each script is a function of `(x, y)` returning `{ok: true, ...}` or
//! `{ok: false, code, message}` with a capability error code.

use chromiumoxide::Page;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use khamsang_engine::backend::CapabilityError;
use khamsang_engine::error_mapping::{classify_message, map_error_code};
use khamsang_engine::protocol::Point;
use serde_json::{Value, json};
use std::time::Duration;

/// Dialogs can block the JS thread; do not wait on them forever.
const EVAL_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) const PROBE_JS: &str = r#"(x, y) => {
    const el = document.elementFromPoint(x, y);
    if (!el) return { ok: false, code: 'ELEMENT_GONE', message: 'nothing at point' };
    if (el.disabled) return { ok: false, code: 'ELEMENT_NOT_INTERACTABLE', message: 'element is disabled' };
    if (getComputedStyle(el).pointerEvents === 'none') {
        return { ok: false, code: 'ELEMENT_NOT_INTERACTABLE', message: 'pointer events disabled' };
    }
    return { ok: true, tag: el.tagName.toLowerCase(), editable: el.isContentEditable || ['input', 'textarea', 'select'].includes(el.tagName.toLowerCase()) };
}"#;

pub(crate) const SCROLL_JS: &str = r#"(x, y) => {
    const el = document.elementFromPoint(x, y);
    if (!el) return { ok: false, code: 'ELEMENT_GONE', message: 'nothing at point' };
    el.scrollIntoView({ block: 'center', inline: 'center' });
    return { ok: true, tag: el.tagName.toLowerCase() };
}"#;

pub(crate) async fn run_at(page: &Page, script: &str, point: Point) -> Result<Value, CapabilityError> {
    let expression = format!("({})({}, {})", script, point.x, point.y);
    let value = evaluate_with_timeout(page, &expression).await?;

    if value.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(value);
    }
    let code = value
        .get("code")
        .and_then(Value::as_str)
        .unwrap_or("SCRIPT_ERROR");
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("script returned no result");
    Err(map_error_code(
        code,
        message,
        Some(&json!({ "x": point.x, "y": point.y })),
    ))
}

async fn evaluate_with_timeout(page: &Page, expression: &str) -> Result<Value, CapabilityError> {
    // Plain expression evaluation; the call is already applied to its arguments.
    let mut params = EvaluateParams::new(expression);
    params.return_by_value = Some(true);

    match tokio::time::timeout(EVAL_TIMEOUT, page.evaluate_expression(params)).await {
        Err(_) => Err(CapabilityError::Timeout {
            operation: "evaluate".into(),
        }),
        Ok(Err(e)) => Err(classify_message(&e.to_string())),
        Ok(Ok(result)) => result
            .into_value::<Value>()
            .map_err(|e| CapabilityError::Serialization(e.to_string())),
    }
}
