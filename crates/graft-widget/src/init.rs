use graft_page::PageContext;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::WidgetConfig;
use crate::styler::{self, StylerConfig, StylerState};

#[derive(Debug, Clone, Default)]
pub struct InitOutcome {
    pub success: bool,
    pub jupiter_exists: bool,
    pub init_available: bool,
    pub error: Option<String>,
}

/// Calls the widget's init entry point with a freshly built config, then runs
/// the container styler. The styler runs even when init reports failure: the
/// widget may still be rendering asynchronously.
pub async fn initialize(
    page: &dyn PageContext,
    token_address: Option<&str>,
    styler_config: &StylerConfig,
) -> (InitOutcome, StylerState) {
    let outcome = call_init(page, token_address).await;
    if outcome.success {
        info!(token = token_address.unwrap_or("none"), "Jupiter.init called");
    } else {
        warn!(
            error = outcome.error.as_deref().unwrap_or("unknown"),
            "widget init failed"
        );
    }

    let styled = styler::run(page, styler_config).await;
    (outcome, styled)
}

async fn call_init(page: &dyn PageContext, token_address: Option<&str>) -> InitOutcome {
    let config = WidgetConfig::for_token(token_address);
    let config_json = match serde_json::to_string(&config) {
        Ok(json) => json,
        Err(e) => {
            return InitOutcome {
                error: Some(e.to_string()),
                ..Default::default()
            }
        }
    };

    match page.evaluate(&init_wrapper(&config_json)).await {
        Ok(value) => parse_init(&value),
        Err(e) => InitOutcome {
            error: Some(e.to_string()),
            ..Default::default()
        },
    }
}

// Probes for init before calling; reports back instead of throwing.
fn init_wrapper(config_json: &str) -> String {
    format!(
        r#"(function(config) {{
  var jupiterExists = typeof window.Jupiter !== 'undefined';
  var initAvailable = jupiterExists && typeof window.Jupiter.init === 'function';
  if (!initAvailable) {{
    return {{ success: false, error: 'Jupiter.init not available', jupiterExists: jupiterExists, initAvailable: false }};
  }}
  try {{
    window.Jupiter.init(config);
    return {{ success: true, jupiterExists: true, initAvailable: true }};
  }} catch (e) {{
    return {{ success: false, error: String(e && e.message || e), jupiterExists: true, initAvailable: true }};
  }}
}})({config_json})"#
    )
}

fn parse_init(value: &Value) -> InitOutcome {
    InitOutcome {
        success: value.get("success").and_then(Value::as_bool).unwrap_or(false),
        jupiter_exists: value
            .get("jupiterExists")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        init_available: value
            .get("initAvailable")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        error: value.get("error").and_then(Value::as_str).map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use graft_page::testing::ScriptedPage;
    use serde_json::json;

    use super::*;

    fn fast_styler() -> StylerConfig {
        StylerConfig {
            settle_delay_ms: 1,
            poll_interval_ms: 1,
            max_polls: 2,
            interactive_delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn init_config_reaches_the_page() {
        let page = ScriptedPage::new("https://gmgn.ai/");
        page.push_value(json!({ "success": true, "jupiterExists": true, "initAvailable": true }));
        page.push_value(json!(true)); // container probe
        page.push_value(json!(true)); // style apply
        page.push_value(json!(0)); // interactive pass

        let address = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";
        let (outcome, styled) = initialize(&page, Some(address), &fast_styler()).await;

        assert!(outcome.success);
        assert_eq!(styled, StylerState::Found);

        let init_exprs = page.evaluated_matching("Jupiter.init(config)");
        assert_eq!(init_exprs.len(), 1);
        assert!(init_exprs[0].contains(r#""swapMode":"ExactIn""#));
        assert!(init_exprs[0].contains(address));
    }

    #[tokio::test]
    async fn missing_init_is_a_soft_failure_and_styler_still_runs() {
        let page = ScriptedPage::new("https://gmgn.ai/");
        page.push_value(json!({
            "success": false,
            "error": "Jupiter.init not available",
            "jupiterExists": false,
            "initAvailable": false
        }));
        page.push_value(json!(false)); // probe 1
        page.push_value(json!(false)); // probe 2 -> given up

        let (outcome, styled) = initialize(&page, None, &fast_styler()).await;

        assert!(!outcome.success);
        assert!(!outcome.init_available);
        assert_eq!(outcome.error.as_deref(), Some("Jupiter.init not available"));
        assert_eq!(styled, StylerState::GivenUp);
        assert_eq!(page.evaluated_count(), 3);
    }

    #[tokio::test]
    async fn null_token_builds_config_without_swap_fields() {
        let page = ScriptedPage::new("https://gmgn.ai/");
        page.push_value(json!({ "success": true, "jupiterExists": true, "initAvailable": true }));
        page.push_value(json!(true));
        page.push_value(json!(true));
        page.push_value(json!(0));

        initialize(&page, None, &fast_styler()).await;

        let init_exprs = page.evaluated_matching("Jupiter.init(config)");
        assert!(!init_exprs[0].contains("swapMode"));
        assert!(!init_exprs[0].contains("initialOutputMint"));
    }
}
