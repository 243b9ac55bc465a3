use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use graft_core::{InjectionRequest, InjectionResult};
use graft_page::PageContext;
use graft_script::ScriptFetcher;
use graft_widget::StylerConfig;
use tracing::{info, warn};

pub type TabRegistry = DashMap<u32, Arc<dyn PageContext>>;

pub struct Pipeline {
    pub fetcher: ScriptFetcher,
    pub tabs: Arc<TabRegistry>,
    pub settle_delay_ms: u64,
    pub styler: StylerConfig,
}

impl Pipeline {
    /// One injection request, handled to completion: fetch, execute in the
    /// page, settle, init, container styling. The first failing stage
    /// short-circuits; everything is recovered into the result.
    pub async fn handle(&self, request: InjectionRequest) -> InjectionResult {
        let Some(page) = self.tabs.get(&request.tab_id).map(|entry| entry.value().clone())
        else {
            warn!(tab = request.tab_id, "injection requested for unknown tab");
            return InjectionResult::failed("no such tab");
        };

        let Some(script) = self.fetcher.get_script().await else {
            warn!(tab = request.tab_id, "widget script unavailable");
            return InjectionResult::failed("widget script unavailable");
        };

        let injected = graft_page::inject(page.as_ref(), &script).await;
        if !injected.success {
            return InjectionResult::failed(
                injected
                    .error
                    .unwrap_or_else(|| "script execution failed".to_string()),
            );
        }

        // Let the widget script's top-level execution finish before init.
        tokio::time::sleep(Duration::from_millis(self.settle_delay_ms)).await;

        let (init, styled) = graft_widget::initialize(
            page.as_ref(),
            request.token_address.as_deref(),
            &self.styler,
        )
        .await;

        info!(
            tab = request.tab_id,
            success = init.success,
            widget = injected.widget_available,
            container = ?styled,
            "injection pipeline finished"
        );

        InjectionResult {
            success: init.success,
            error: init.error,
            widget_available: Some(injected.widget_available),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use graft_core::CachedScript;
    use graft_page::testing::ScriptedPage;
    use graft_script::{FetcherConfig, MemoryStore, ScriptStore};
    use serde_json::json;

    use super::*;

    const TAB: u32 = 7;
    const ADDRESS: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

    fn pipeline(page: Arc<ScriptedPage>, seed_cache: bool) -> Pipeline {
        let store = Arc::new(MemoryStore::new());
        let config = FetcherConfig {
            // Nothing listens on port 9; every network attempt fails fast.
            script_url: "http://127.0.0.1:9/plugin-v1.js".to_string(),
            cache_ttl_ms: 3_600_000,
            max_attempts: 1,
            backoff_base_ms: 1,
        };
        if seed_cache {
            store
                .put(
                    &config.script_url,
                    &CachedScript {
                        body: "window.Jupiter = { init: function () {} };".to_string(),
                        fetched_at_ms: Utc::now().timestamp_millis(),
                    },
                )
                .unwrap();
        }

        let tabs: Arc<TabRegistry> = Arc::new(DashMap::new());
        tabs.insert(TAB, page as Arc<dyn PageContext>);

        Pipeline {
            fetcher: ScriptFetcher::new(config, store),
            tabs,
            settle_delay_ms: 1,
            styler: StylerConfig {
                settle_delay_ms: 1,
                poll_interval_ms: 1,
                max_polls: 2,
                interactive_delay_ms: 1,
            },
        }
    }

    fn happy_page() -> Arc<ScriptedPage> {
        let page = Arc::new(ScriptedPage::new("https://gmgn.ai/"));
        page.push_value(json!({ "success": true, "jupiterExists": true, "initAvailable": true }));
        page.push_value(json!({ "success": true, "jupiterExists": true, "initAvailable": true }));
        page.push_value(json!(true)); // container probe
        page.push_value(json!(true)); // style apply
        page.push_value(json!(2)); // interactive pass
        page
    }

    #[tokio::test]
    async fn token_request_pins_the_output_mint() {
        let page = happy_page();
        let result = pipeline(page.clone(), true)
            .handle(InjectionRequest {
                tab_id: TAB,
                token_address: Some(ADDRESS.to_string()),
            })
            .await;

        assert!(result.success);
        assert_eq!(result.widget_available, Some(true));

        let init_exprs = page.evaluated_matching("Jupiter.init(config)");
        assert_eq!(init_exprs.len(), 1);
        assert!(init_exprs[0].contains(r#""swapMode":"ExactIn""#));
        assert!(init_exprs[0].contains(ADDRESS));
    }

    #[tokio::test]
    async fn null_token_request_keeps_the_default_form() {
        let page = happy_page();
        let result = pipeline(page.clone(), true)
            .handle(InjectionRequest {
                tab_id: TAB,
                token_address: None,
            })
            .await;

        assert!(result.success);
        let init_exprs = page.evaluated_matching("Jupiter.init(config)");
        assert!(!init_exprs[0].contains("swapMode"));
        assert!(!init_exprs[0].contains("initialOutputMint"));
    }

    #[tokio::test]
    async fn unknown_tab_short_circuits() {
        let page = Arc::new(ScriptedPage::new("https://gmgn.ai/"));
        let result = pipeline(page.clone(), true)
            .handle(InjectionRequest {
                tab_id: 999,
                token_address: None,
            })
            .await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("no such tab"));
        assert_eq!(page.evaluated_count(), 0);
    }

    #[tokio::test]
    async fn unavailable_script_short_circuits_before_any_evaluate() {
        let page = Arc::new(ScriptedPage::new("https://gmgn.ai/"));
        let result = pipeline(page.clone(), false)
            .handle(InjectionRequest {
                tab_id: TAB,
                token_address: None,
            })
            .await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("widget script unavailable"));
        assert_eq!(page.evaluated_count(), 0);
    }

    #[tokio::test]
    async fn failed_execution_skips_init() {
        let page = Arc::new(ScriptedPage::new("https://gmgn.ai/"));
        page.push_value(json!({ "success": false, "error": "csp sandbox rejected eval" }));

        let result = pipeline(page.clone(), true)
            .handle(InjectionRequest {
                tab_id: TAB,
                token_address: Some(ADDRESS.to_string()),
            })
            .await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("csp sandbox rejected eval"));
        assert_eq!(page.evaluated_count(), 1);
        assert!(page.evaluated_matching("Jupiter.init(config)").is_empty());
    }
}
