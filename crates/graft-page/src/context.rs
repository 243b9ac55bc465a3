use async_trait::async_trait;
use graft_core::GraftResult;
use serde_json::Value;

/// The single seam for running code inside a tab's own JS realm. Everything
/// the pipeline does to a page goes through `evaluate`, so the execution
/// primitive can be swapped without touching callers.
#[async_trait]
pub trait PageContext: Send + Sync {
    async fn evaluate(&self, expr: &str) -> GraftResult<Value>;
    async fn current_url(&self) -> GraftResult<String>;
}
