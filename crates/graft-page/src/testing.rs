use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use graft_core::{GraftError, GraftResult};
use serde_json::Value;

use crate::context::PageContext;

/// Scripted page realm for tests: pops one canned response per `evaluate`
/// call (falling back to `null`) and records every expression it was given.
#[derive(Default)]
pub struct ScriptedPage {
    url: String,
    responses: Mutex<VecDeque<GraftResult<Value>>>,
    pub evaluated: Mutex<Vec<String>>,
}

impl ScriptedPage {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Default::default()
        }
    }

    pub fn push_value(&self, value: Value) {
        self.responses.lock().unwrap().push_back(Ok(value));
    }

    pub fn push_error(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(GraftError::Execution(message.to_string())));
    }

    pub fn evaluated_count(&self) -> usize {
        self.evaluated.lock().unwrap().len()
    }

    pub fn evaluated_matching(&self, needle: &str) -> Vec<String> {
        self.evaluated
            .lock()
            .unwrap()
            .iter()
            .filter(|expr| expr.contains(needle))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PageContext for ScriptedPage {
    async fn evaluate(&self, expr: &str) -> GraftResult<Value> {
        self.evaluated.lock().unwrap().push(expr.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Value::Null))
    }

    async fn current_url(&self) -> GraftResult<String> {
        Ok(self.url.clone())
    }
}
