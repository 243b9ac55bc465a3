use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::target::TargetId;
use chromiumoxide::Browser;
use dashmap::DashMap;
use graft_core::{InjectionRequest, InjectionResult};
use graft_detect::watcher::watch_urls;
use graft_page::{CdpPage, PageContext};
use graft_script::{MemoryStore, ScriptFetcher, ScriptStore, SqliteStore};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::config::GraftConfig;
use crate::pipeline::{Pipeline, TabRegistry};

type RequestSender = mpsc::Sender<(InjectionRequest, oneshot::Sender<InjectionResult>)>;

pub fn open_store(config: &GraftConfig) -> Result<Arc<dyn ScriptStore>, Box<dyn std::error::Error>> {
    match &config.cache {
        Some(cache) => {
            if let Some(parent) = std::path::Path::new(&cache.path).parent() {
                std::fs::create_dir_all(parent)?;
            }
            let store = SqliteStore::open(&cache.path)?;
            info!(path = %cache.path, "script cache opened");
            Ok(Arc::new(store))
        }
        None => {
            info!("no cache path configured, using in-memory script cache");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

pub async fn run_daemon(config: GraftConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(&config)?;
    let fetcher = ScriptFetcher::new(config.fetcher_config(), store);

    // Predownload so the first injection is served from cache; a failure here
    // is retried per request.
    if fetcher.get_script().await.is_none() {
        warn!("widget script predownload failed");
    }

    let (browser, driver) = graft_page::attach(&config.browser.ws_url).await?;

    let tabs: Arc<TabRegistry> = Arc::new(DashMap::new());
    let pipeline = Arc::new(Pipeline {
        fetcher,
        tabs: tabs.clone(),
        settle_delay_ms: config.inject.settle_delay_ms,
        styler: config.styler_config(),
    });

    let (request_tx, mut request_rx) =
        mpsc::channel::<(InjectionRequest, oneshot::Sender<InjectionResult>)>(32);

    let orchestrator = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            while let Some((request, respond)) = request_rx.recv().await {
                let pipeline = pipeline.clone();
                tokio::spawn(async move {
                    let result = pipeline.handle(request).await;
                    let _ = respond.send(result);
                });
            }
        })
    };

    let discovery = tokio::spawn(discover_tabs(
        browser,
        tabs,
        request_tx,
        config.clone(),
    ));

    info!("graft daemon running");

    tokio::select! {
        _ = driver => error!("cdp connection closed"),
        _ = orchestrator => error!("orchestrator task exited"),
        _ = discovery => error!("tab discovery task exited"),
        _ = tokio::signal::ctrl_c() => info!("shutting down"),
    }

    Ok(())
}

/// Polls the browser's target list, registers unseen tabs under fresh numeric
/// ids and spawns a watcher per tab; deregisters tabs whose target is gone.
async fn discover_tabs(
    browser: Browser,
    tabs: Arc<TabRegistry>,
    requests: RequestSender,
    config: GraftConfig,
) {
    let mut known: HashMap<TargetId, u32> = HashMap::new();
    let mut watchers: HashMap<u32, JoinHandle<()>> = HashMap::new();
    let mut next_tab_id: u32 = 1;
    let mut tick = interval(Duration::from_secs(config.browser.tab_poll_secs));

    loop {
        tick.tick().await;

        let pages = match browser.pages().await {
            Ok(pages) => pages,
            Err(e) => {
                warn!(error = %e, "target listing failed");
                continue;
            }
        };

        let mut live: HashSet<TargetId> = HashSet::new();
        for page in pages {
            let target = page.target_id().clone();
            live.insert(target.clone());
            if known.contains_key(&target) {
                continue;
            }

            let initial_url = page.url().await.ok().flatten().unwrap_or_default();
            let tab_id = next_tab_id;
            next_tab_id += 1;
            known.insert(target, tab_id);

            let cdp = Arc::new(CdpPage::new(page));
            tabs.insert(tab_id, cdp.clone() as Arc<dyn PageContext>);
            info!(tab = tab_id, url = %initial_url, "tab registered");

            let handle = tokio::spawn(watch_tab(
                tab_id,
                cdp,
                initial_url,
                config.clone(),
                requests.clone(),
            ));
            watchers.insert(tab_id, handle);
        }

        known.retain(|target, tab_id| {
            if live.contains(target) {
                return true;
            }
            tabs.remove(tab_id);
            if let Some(handle) = watchers.remove(tab_id) {
                handle.abort();
            }
            info!(tab = *tab_id, "tab closed");
            false
        });
    }
}

/// Per-tab loop: debounced navigation signals become injection requests.
async fn watch_tab(
    tab_id: u32,
    page: Arc<CdpPage>,
    initial_url: String,
    config: GraftConfig,
    requests: RequestSender,
) {
    let signals =
        page.navigation_events(Duration::from_millis(config.watch.url_poll_interval_ms));

    let (detect_tx, mut detect_rx) = mpsc::channel(8);
    tokio::spawn(watch_urls(
        signals,
        initial_url,
        config.watcher_config(),
        detect_tx,
    ));

    while let Some(url) = detect_rx.recv().await {
        if !graft_detect::is_supported(&url) {
            continue;
        }

        let detection = graft_detect::detect(&url);
        let token_address = detection.address().map(str::to_string);
        match &token_address {
            Some(address) => info!(tab = tab_id, token = %address, "token page detected"),
            None => info!(tab = tab_id, url = %url, "supported page without token"),
        }

        let (respond, response) = oneshot::channel();
        let request = InjectionRequest {
            tab_id,
            token_address,
        };
        if requests.send((request, respond)).await.is_err() {
            return;
        }

        match response.await {
            Ok(result) if result.success => info!(tab = tab_id, "widget grafted"),
            Ok(result) => warn!(
                tab = tab_id,
                error = result.error.as_deref().unwrap_or("unknown"),
                "widget injection failed"
            ),
            Err(_) => return,
        }
    }
}
