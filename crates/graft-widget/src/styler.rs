use std::time::Duration;

use graft_page::{js_string, PageContext};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::CONTAINER_ID;

// Forced onto the container once it appears. Pointer events stay off until
// the interactive pass so the fixed overlay cannot swallow clicks meant for
// the page underneath.
const CONTAINER_BASE_STYLES: &str = "position: fixed !important; \
z-index: 2147483647 !important; \
display: block !important; \
visibility: visible !important; \
opacity: 1 !important; \
pointer-events: none !important; \
max-width: 100vw !important; \
max-height: 100vh !important;";

const INTERACTIVE_SELECTORS: &[&str] = &[
    "button",
    "input",
    "select",
    "textarea",
    "a",
    "[role=\"button\"]",
    "[role=\"link\"]",
    "[tabindex]",
    "[onclick]",
    ".jupiter-widget",
    "[class*=\"widget\"]",
    "[class*=\"form\"]",
    "[class*=\"swap\"]",
    "[class*=\"button\"]",
    "[class*=\"input\"]",
];

#[derive(Debug, Clone)]
pub struct StylerConfig {
    pub settle_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub max_polls: u32,
    pub interactive_delay_ms: u64,
}

impl Default for StylerConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 2_000,
            poll_interval_ms: 500,
            max_polls: 10,
            interactive_delay_ms: 1_000,
        }
    }
}

/// The widget never signals readiness, so the container is polled to a bound
/// and styled on sight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StylerState {
    Waiting(u32),
    Found,
    GivenUp,
}

impl StylerState {
    pub fn advance(self, container_present: bool, max_polls: u32) -> StylerState {
        match self {
            StylerState::Waiting(_) if container_present => StylerState::Found,
            StylerState::Waiting(attempt) if attempt + 1 >= max_polls => StylerState::GivenUp,
            StylerState::Waiting(attempt) => StylerState::Waiting(attempt + 1),
            done => done,
        }
    }
}

/// Drives the container through Waiting → Found | GivenUp. On Found, applies
/// the style override, then after a further delay re-enables pointer events
/// on the interactive descendants (the widget keeps re-rendering after init
/// returns; styling applied too early is overwritten).
pub async fn run(page: &dyn PageContext, config: &StylerConfig) -> StylerState {
    tokio::time::sleep(Duration::from_millis(config.settle_delay_ms)).await;

    let mut state = StylerState::Waiting(0);
    loop {
        let present = container_present(page).await;
        state = state.advance(present, config.max_polls);
        match state {
            StylerState::Waiting(attempt) => {
                debug!(attempt, container = CONTAINER_ID, "container not present yet");
                tokio::time::sleep(Duration::from_millis(config.poll_interval_ms)).await;
            }
            StylerState::Found => {
                apply_container_styles(page).await;
                tokio::time::sleep(Duration::from_millis(config.interactive_delay_ms)).await;
                enable_interactive_elements(page).await;
                return state;
            }
            StylerState::GivenUp => {
                warn!(
                    polls = config.max_polls,
                    container = CONTAINER_ID,
                    "container never appeared, skipping style override"
                );
                return state;
            }
        }
    }
}

async fn container_present(page: &dyn PageContext) -> bool {
    let expr = format!("!!document.getElementById({})", js_string(CONTAINER_ID));
    match page.evaluate(&expr).await {
        Ok(Value::Bool(present)) => present,
        Ok(_) => false,
        Err(e) => {
            // Tab may already be gone; treat as absent and let the bound expire.
            debug!(error = %e, "container probe failed");
            false
        }
    }
}

async fn apply_container_styles(page: &dyn PageContext) {
    let expr = format!(
        r#"(function() {{
  var container = document.getElementById({id});
  if (!container) return false;
  container.style.cssText += {styles};
  return true;
}})()"#,
        id = js_string(CONTAINER_ID),
        styles = js_string(CONTAINER_BASE_STYLES),
    );
    match page.evaluate(&expr).await {
        Ok(Value::Bool(true)) => info!(container = CONTAINER_ID, "container styles applied"),
        Ok(_) => warn!("container disappeared before styling"),
        Err(e) => warn!(error = %e, "container styling failed"),
    }
}

async fn enable_interactive_elements(page: &dyn PageContext) {
    let selectors =
        serde_json::to_string(INTERACTIVE_SELECTORS).expect("static selector list serializes");
    let expr = format!(
        r#"(function() {{
  var container = document.getElementById({id});
  if (!container) return 0;
  var selectors = {selectors};
  var touched = 0;
  for (var i = 0; i < selectors.length; i++) {{
    try {{
      var matches = container.querySelectorAll(selectors[i]);
      for (var j = 0; j < matches.length; j++) {{
        matches[j].style.pointerEvents = 'auto';
        touched++;
      }}
    }} catch (e) {{}}
  }}
  var children = container.children;
  for (var k = 0; k < children.length; k++) {{
    children[k].style.pointerEvents = 'auto';
    touched++;
  }}
  return touched;
}})()"#,
        id = js_string(CONTAINER_ID),
    );
    match page.evaluate(&expr).await {
        Ok(Value::Number(count)) => {
            info!(elements = %count, "interactive elements enabled");
        }
        Ok(_) => warn!("container disappeared before interactive pass"),
        Err(e) => warn!(error = %e, "interactive pass failed"),
    }
}

#[cfg(test)]
mod tests {
    use graft_page::testing::ScriptedPage;
    use serde_json::json;

    use super::*;

    fn fast_config(max_polls: u32) -> StylerConfig {
        StylerConfig {
            settle_delay_ms: 1,
            poll_interval_ms: 1,
            max_polls,
            interactive_delay_ms: 1,
        }
    }

    #[test]
    fn advance_finds_container() {
        let state = StylerState::Waiting(4).advance(true, 10);
        assert_eq!(state, StylerState::Found);
    }

    #[test]
    fn advance_gives_up_at_bound() {
        let mut state = StylerState::Waiting(0);
        for _ in 0..9 {
            state = state.advance(false, 10);
        }
        assert_eq!(state, StylerState::Waiting(9));
        state = state.advance(false, 10);
        assert_eq!(state, StylerState::GivenUp);
    }

    #[test]
    fn terminal_states_stay_put() {
        assert_eq!(StylerState::Found.advance(false, 10), StylerState::Found);
        assert_eq!(StylerState::GivenUp.advance(true, 10), StylerState::GivenUp);
    }

    #[tokio::test]
    async fn gives_up_after_exactly_max_polls_probes() {
        let page = ScriptedPage::new("https://gmgn.ai/");
        // Every probe comes back false; queue is longer than the bound.
        for _ in 0..20 {
            page.push_value(json!(false));
        }

        let state = run(&page, &fast_config(3)).await;
        assert_eq!(state, StylerState::GivenUp);
        assert_eq!(page.evaluated_count(), 3);
    }

    #[tokio::test]
    async fn styles_and_enables_interactivity_once_found() {
        let page = ScriptedPage::new("https://gmgn.ai/");
        page.push_value(json!(false)); // probe 1
        page.push_value(json!(false)); // probe 2
        page.push_value(json!(true)); // probe 3: container appeared
        page.push_value(json!(true)); // style apply
        page.push_value(json!(5)); // interactive pass

        let state = run(&page, &fast_config(10)).await;
        assert_eq!(state, StylerState::Found);
        assert_eq!(page.evaluated_count(), 5);

        assert_eq!(page.evaluated_matching("cssText").len(), 1);
        assert_eq!(page.evaluated_matching("pointerEvents").len(), 1);
        // The style override rides in as an escaped string literal.
        let style_expr = &page.evaluated_matching("cssText")[0];
        assert!(style_expr.contains("z-index: 2147483647"));
        assert!(style_expr.contains("pointer-events: none"));
    }

    #[tokio::test]
    async fn probe_errors_count_against_the_bound() {
        let page = ScriptedPage::new("https://gmgn.ai/");
        page.push_error("target closed");
        page.push_error("target closed");

        let state = run(&page, &fast_config(2)).await;
        assert_eq!(state, StylerState::GivenUp);
        assert_eq!(page.evaluated_count(), 2);
    }
}
