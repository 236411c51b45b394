//! Shared test backend.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use coverage_core::prelude::*;

/// A backend that replays scripted outcomes and records every request it sees.
pub struct ScriptedBackend {
    outcomes: Mutex<VecDeque<Result<String, BackendError>>>,
    seen: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedBackend {
    pub fn new(outcomes: Vec<Result<&str, BackendError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().map(|o| o.map(String::from)).collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn answers(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(*t)).collect())
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn create_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResult, BackendError> {
        self.seen.lock().unwrap().push(request.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Other("script exhausted".into())))
            .map(CompletionResult::from_text)
    }
}

pub fn fast_retry(max_attempts: usize) -> RetryPolicy {
    RetryPolicy::default()
        .with_max_attempts(max_attempts)
        .with_initial_delay(std::time::Duration::from_millis(1))
}

pub fn fast_config() -> ExtractionConfig {
    ExtractionConfig::default().with_retry(fast_retry(3))
}
