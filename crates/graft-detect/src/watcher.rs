use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    pub debounce_ms: u64,
    pub initial_delay_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            initial_delay_ms: 500,
        }
    }
}

/// Coalesces bursts of URL-change signals into single re-detection events:
/// one emit for the initial load, then one per net URL change, with signals
/// inside the quiet window collapsing to the most recent.
pub async fn watch_urls(
    mut signals: mpsc::Receiver<String>,
    initial_url: String,
    config: WatcherConfig,
    detections: mpsc::Sender<String>,
) {
    let window = Duration::from_millis(config.debounce_ms);

    tokio::time::sleep(Duration::from_millis(config.initial_delay_ms)).await;
    let mut last_seen = initial_url.clone();
    if detections.send(initial_url).await.is_err() {
        return;
    }

    while let Some(first) = signals.recv().await {
        let mut latest = first;
        while let Ok(Some(url)) = timeout(window, signals.recv()).await {
            latest = url;
        }

        if latest == last_seen {
            continue;
        }
        debug!(url = %latest, "url change detected");
        last_seen = latest.clone();
        if detections.send(latest).await.is_err() {
            return;
        }
    }
}
