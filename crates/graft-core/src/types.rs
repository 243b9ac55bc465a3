use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedScript {
    pub body: String,
    pub fetched_at_ms: i64,
}

impl CachedScript {
    pub fn is_fresh(&self, now_ms: i64, ttl_ms: i64) -> bool {
        now_ms - self.fetched_at_ms < ttl_ms
    }
}

/// Outcome of running the address detector over one URL. A candidate that
/// fails validation is indistinguishable from no candidate at all as far as
/// injection is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub raw_address: Option<String>,
    pub is_valid: bool,
}

impl DetectionResult {
    pub fn address(&self) -> Option<&str> {
        if self.is_valid {
            self.raw_address.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjectionRequest {
    pub tab_id: u32,
    pub token_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjectionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget_available: Option<bool>,
}

impl InjectionResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            widget_available: None,
        }
    }
}
