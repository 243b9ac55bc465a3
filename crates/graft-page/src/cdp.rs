use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::{
    EventFrameNavigated, EventNavigatedWithinDocument,
};
use chromiumoxide::cdp::browser_protocol::target::TargetId;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use graft_core::{GraftError, GraftResult};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::context::PageContext;

/// Attach to a running Chromium over its DevTools websocket. The spawned
/// task drives the CDP message loop and must stay alive with the `Browser`.
pub async fn attach(ws_url: &str) -> GraftResult<(Browser, JoinHandle<()>)> {
    let (browser, mut handler) = Browser::connect(ws_url)
        .await
        .map_err(|e| GraftError::Messaging(format!("cdp connect failed: {e}")))?;
    info!(ws = %ws_url, "attached to browser");

    let driver = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                debug!(error = %e, "cdp handler error");
            }
        }
    });

    Ok((browser, driver))
}

pub struct CdpPage {
    page: Page,
}

impl CdpPage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn target_id(&self) -> TargetId {
        self.page.target_id().clone()
    }

    /// Merges the navigation signal sources into one channel: frame
    /// navigations, within-document (history API) navigations, and a
    /// current-URL poll as catch-all for routers neither event covers.
    /// The downstream debounce eats the duplicates.
    pub fn navigation_events(&self, poll_interval: Duration) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(32);

        let page = self.page.clone();
        let frame_tx = tx.clone();
        tokio::spawn(async move {
            let Ok(mut events) = page.event_listener::<EventFrameNavigated>().await else {
                return;
            };
            while let Some(event) = events.next().await {
                if frame_tx.send(event.frame.url.clone()).await.is_err() {
                    return;
                }
            }
        });

        let page = self.page.clone();
        let history_tx = tx.clone();
        tokio::spawn(async move {
            let Ok(mut events) = page.event_listener::<EventNavigatedWithinDocument>().await
            else {
                return;
            };
            while let Some(event) = events.next().await {
                if history_tx.send(event.url.clone()).await.is_err() {
                    return;
                }
            }
        });

        let page = self.page.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(poll_interval).await;
                match page.url().await {
                    Ok(Some(url)) => {
                        if tx.send(url).await.is_err() {
                            return;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        debug!(error = %e, "url poll failed, stopping source");
                        return;
                    }
                }
            }
        });

        rx
    }
}

#[async_trait]
impl PageContext for CdpPage {
    async fn evaluate(&self, expr: &str) -> GraftResult<Value> {
        let result = self
            .page
            .evaluate(expr.to_string())
            .await
            .map_err(|e| GraftError::Execution(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn current_url(&self) -> GraftResult<String> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| GraftError::Execution(e.to_string()))?;
        url.ok_or_else(|| GraftError::Execution("page has no url".to_string()))
    }
}
