use serde_json::Value;
use tracing::warn;

use crate::context::PageContext;

#[derive(Debug, Clone, Default)]
pub struct InjectOutcome {
    pub success: bool,
    pub widget_available: bool,
    pub init_available: bool,
    pub error: Option<String>,
}

/// Renders a string as a JS string literal, JSON-escaped.
pub fn js_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

/// Executes the widget script inside the page's own realm, rebuilt there
/// with `new Function` (which sidesteps the page CSP's `script-src` check on
/// injected `<script>` tags). Page throws and transport failures both land
/// in the outcome; neither propagates.
pub async fn inject(page: &dyn PageContext, script_body: &str) -> InjectOutcome {
    let wrapper = executor_wrapper(script_body);
    match page.evaluate(&wrapper).await {
        Ok(value) => parse_outcome(&value),
        Err(e) => InjectOutcome {
            success: false,
            error: Some(e.to_string()),
            ..Default::default()
        },
    }
}

fn executor_wrapper(script_body: &str) -> String {
    // The body travels as a JSON string literal so its content cannot break
    // out of the wrapper.
    let body_literal = js_string(script_body);
    format!(
        r#"(function() {{
  try {{
    var run = new Function({body_literal});
    run();
    var jupiterExists = typeof window.Jupiter !== 'undefined';
    return {{
      success: true,
      jupiterExists: jupiterExists,
      initAvailable: jupiterExists && typeof window.Jupiter.init === 'function'
    }};
  }} catch (e) {{
    return {{ success: false, error: String(e && e.message || e) }};
  }}
}})()"#
    )
}

fn parse_outcome(value: &Value) -> InjectOutcome {
    let outcome = InjectOutcome {
        success: value.get("success").and_then(Value::as_bool).unwrap_or(false),
        widget_available: value
            .get("jupiterExists")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        init_available: value
            .get("initAvailable")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        error: value.get("error").and_then(Value::as_str).map(str::to_string),
    };
    if outcome.success && !outcome.widget_available {
        warn!("script executed but window.Jupiter is undefined");
    }
    outcome
}
