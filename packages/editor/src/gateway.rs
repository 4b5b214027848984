//! # Persistence Gateway
//!
//! Async boundary between the store and the backend. The store only ever
//! talks to the two slots through this trait:
//!
//! - `fetch_document(key)`: absent slots yield the default template
//! - `save_draft(doc)`: idempotent upsert of `draft`
//! - `publish()`: copy `draft` verbatim into `published`
//!
//! [`MemoryGateway`] keeps both slots in process, for tests and headless
//! sessions. The HTTP client lives in the workspace crate.

use crate::defaults::default_document;
use crate::{ConfigDocument, DocumentKey};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Raw payload stored under `key`, or the default template if the slot
    /// was never written
    async fn fetch_document(&self, key: DocumentKey) -> Result<Value, GatewayError>;

    async fn save_draft(&self, document: &ConfigDocument) -> Result<(), GatewayError>;

    /// Promote the current draft; fails if no draft exists
    async fn publish(&self) -> Result<(), GatewayError>;
}

/// A call observed by [`MemoryGateway`]
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    Fetch(DocumentKey),
    SaveDraft(ConfigDocument),
    Publish,
}

#[derive(Debug, Default)]
struct MemoryState {
    draft: Option<Value>,
    published: Option<Value>,
    calls: Vec<GatewayCall>,
    failing_saves: usize,
    fail_publish: bool,
    fail_fetches: bool,
    save_delay: Option<Duration>,
}

/// In-process gateway with a call log and failure injection
#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway whose draft slot already holds `draft`
    pub fn with_draft(draft: Value) -> Self {
        let gateway = Self::new();
        gateway.state().draft = Some(draft);
        gateway
    }

    /// Every save sleeps for `delay` before completing
    pub fn with_save_delay(self, delay: Duration) -> Self {
        self.state().save_delay = Some(delay);
        self
    }

    /// The next `count` saves fail with a network error
    pub fn fail_next_saves(&self, count: usize) {
        self.state().failing_saves = count;
    }

    /// The next publish fails with a server error
    pub fn fail_next_publish(&self) {
        self.state().fail_publish = true;
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.state().fail_fetches = fail;
    }

    pub fn draft(&self) -> Option<Value> {
        self.state().draft.clone()
    }

    pub fn published(&self) -> Option<Value> {
        self.state().published.clone()
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state().calls.clone()
    }

    pub fn save_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| matches!(call, GatewayCall::SaveDraft(_)))
            .count()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn fetch_document(&self, key: DocumentKey) -> Result<Value, GatewayError> {
        let mut state = self.state();
        state.calls.push(GatewayCall::Fetch(key));

        if state.fail_fetches {
            return Err(GatewayError::Network("fetch failed".to_string()));
        }

        let slot = match key {
            DocumentKey::Draft => &state.draft,
            DocumentKey::Published => &state.published,
        };
        Ok(slot
            .clone()
            .unwrap_or_else(|| default_document().into_value()))
    }

    async fn save_draft(&self, document: &ConfigDocument) -> Result<(), GatewayError> {
        let delay = {
            let mut state = self.state();
            state.calls.push(GatewayCall::SaveDraft(document.clone()));
            state.save_delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        if state.failing_saves > 0 {
            state.failing_saves -= 1;
            return Err(GatewayError::Network("save failed".to_string()));
        }

        state.draft = Some(document.clone().into_value());
        Ok(())
    }

    async fn publish(&self) -> Result<(), GatewayError> {
        let mut state = self.state();
        state.calls.push(GatewayCall::Publish);

        if state.fail_publish {
            state.fail_publish = false;
            return Err(GatewayError::Status {
                status: 500,
                message: "publish failed".to_string(),
            });
        }

        let draft = state
            .draft
            .clone()
            .ok_or_else(|| GatewayError::NotFound("draft".to_string()))?;
        state.published = Some(draft);
        Ok(())
    }
}
