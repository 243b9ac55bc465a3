use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use graft_core::{CachedScript, GraftError, GraftResult};
use tracing::{info, warn};

use crate::store::ScriptStore;

pub const DEFAULT_SCRIPT_URL: &str = "https://jupiter-plugin-plus.pages.dev/plugin-v1.js";

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub script_url: String,
    pub cache_ttl_ms: i64,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            script_url: DEFAULT_SCRIPT_URL.to_string(),
            cache_ttl_ms: 3_600_000,
            max_attempts: 3,
            backoff_base_ms: 1_000,
        }
    }
}

pub struct ScriptFetcher {
    client: reqwest::Client,
    config: FetcherConfig,
    store: Arc<dyn ScriptStore>,
}

impl ScriptFetcher {
    pub fn new(config: FetcherConfig, store: Arc<dyn ScriptStore>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; Graft/0.1)")
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build http client");
        Self {
            client,
            config,
            store,
        }
    }

    /// Cached body if still inside the TTL, otherwise a fresh download.
    /// `None` means the script is unavailable and injection must be aborted.
    pub async fn get_script(&self) -> Option<String> {
        self.get_script_at(Utc::now().timestamp_millis()).await
    }

    pub(crate) async fn get_script_at(&self, now_ms: i64) -> Option<String> {
        match self.store.get(&self.config.script_url) {
            Ok(Some(entry)) if entry.is_fresh(now_ms, self.config.cache_ttl_ms) => {
                return Some(entry.body);
            }
            // Missing and expired entries behave identically.
            Ok(_) => {}
            Err(e) => warn!(error = %e, "script cache read failed"),
        }
        self.download().await
    }

    /// Bounded-retry download with linearly increasing backoff; refreshes the
    /// cache on success, returns `None` once every attempt has failed.
    pub async fn download(&self) -> Option<String> {
        for attempt in 1..=self.config.max_attempts {
            match self.try_fetch().await {
                Ok(body) => {
                    let entry = CachedScript {
                        body: body.clone(),
                        fetched_at_ms: Utc::now().timestamp_millis(),
                    };
                    if let Err(e) = self.store.put(&self.config.script_url, &entry) {
                        warn!(error = %e, "script cache write failed");
                    }
                    info!(
                        attempt,
                        bytes = body.len(),
                        url = %self.config.script_url,
                        "widget script downloaded"
                    );
                    return Some(body);
                }
                Err(e) => {
                    warn!(
                        attempt,
                        max = self.config.max_attempts,
                        error = %e,
                        "widget script download failed"
                    );
                    if attempt < self.config.max_attempts {
                        let backoff = self.config.backoff_base_ms * attempt as u64;
                        tokio::time::sleep(Duration::from_millis(backoff)).await;
                    }
                }
            }
        }
        None
    }

    async fn try_fetch(&self) -> GraftResult<String> {
        let resp = self.client.get(&self.config.script_url).send().await?;
        if !resp.status().is_success() {
            return Err(GraftError::Script(format!("http status {}", resp.status())));
        }
        let body = resp.text().await?;
        if body.is_empty() {
            return Err(GraftError::Script("empty script body".to_string()));
        }
        Ok(body)
    }
}
