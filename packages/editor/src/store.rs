//! # Configuration Store
//!
//! Holds the authoritative document for one editing session and composes
//! history, dirty tracking, debounced persistence and override resolution.
//!
//! ## Flow
//!
//! ```text
//! set_config(next)
//!   ├─ deep-equal to current? → ignored
//!   ├─ history.record(current)
//!   ├─ current = next, revision += 1
//!   └─ arm debounce timer ──(3s)──→ save_draft(current)
//!
//! publish_config()
//!   ├─ dirty? → save_draft(current)   (failure aborts the publish)
//!   └─ publish()
//! ```
//!
//! ## Concurrency
//!
//! Document, history and dirty state sit behind one mutex and are updated
//! together, never across an await. Saves are serialised by an async lock:
//! a save requested while another is in flight waits for it and then
//! re-checks whether anything is still unsaved.
//!
//! Timer-driven work needs a tokio runtime.

use crate::document::DocumentKey;
use crate::gateway::{GatewayError, PersistenceGateway};
use crate::history::{History, DEFAULT_HISTORY_CAPACITY};
use crate::merge::hydrate;
use crate::overrides::{resolve, EffectiveDocument};
use crate::scheduler::{DirtyTracker, SaveTimer, DEFAULT_DEBOUNCE};
use crate::{defaults::default_document, ConfigDocument, Device, EditorError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Tunables for a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreOptions {
    /// Quiet period after the last edit before the draft is saved
    #[serde(rename = "debounceMs", with = "duration_ms", default = "default_debounce")]
    pub debounce: Duration,

    /// Maximum undo levels (0 = unlimited)
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_debounce() -> Duration {
    DEFAULT_DEBOUNCE
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            debounce: default_debounce(),
            history_capacity: default_history_capacity(),
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Where the current document came from after a load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Fetched from the gateway and hydrated against the defaults
    Remote,
    /// The fetch failed; the session is editing the default document
    Fallback,
}

/// Notifications for UI layers (toasts, re-render triggers)
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Loaded { key: DocumentKey, outcome: LoadOutcome },
    Changed { revision: u64 },
    Saved { at: DateTime<Utc> },
    SaveFailed { message: String },
    Published,
}

struct StoreState {
    current: Arc<ConfigDocument>,
    history: History,
    dirty: DirtyTracker,
    timer: SaveTimer,
    session_key: DocumentKey,
    loading: bool,
    fallback: bool,
    disposed: bool,
}

impl StoreState {
    fn ensure_writable(&self) -> Result<(), EditorError> {
        if self.disposed {
            return Err(EditorError::Disposed);
        }
        if self.loading {
            return Err(EditorError::Loading);
        }
        if self.session_key == DocumentKey::Published {
            return Err(EditorError::ReadOnly);
        }
        Ok(())
    }
}

struct StoreInner {
    gateway: Arc<dyn PersistenceGateway>,
    options: StoreOptions,
    state: Mutex<StoreState>,
    /// Held for the whole of a save (and of a publish)
    save_lock: tokio::sync::Mutex<()>,
    events: broadcast::Sender<StoreEvent>,
}

/// Handle to one editing session
///
/// Clones share the same session.
#[derive(Clone)]
pub struct ConfigStore {
    inner: Arc<StoreInner>,
}

impl ConfigStore {
    /// Create a store in the loading state, holding the default document
    pub fn new(gateway: Arc<dyn PersistenceGateway>, options: StoreOptions) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let history = History::with_capacity(options.history_capacity);

        Self {
            inner: Arc::new(StoreInner {
                gateway,
                options,
                state: Mutex::new(StoreState {
                    current: Arc::new(default_document()),
                    history,
                    dirty: DirtyTracker::new(),
                    timer: SaveTimer::new(),
                    session_key: DocumentKey::Draft,
                    loading: true,
                    fallback: false,
                    disposed: false,
                }),
                save_lock: tokio::sync::Mutex::new(()),
                events,
            }),
        }
    }

    /// Create a store and load the document for `key`
    ///
    /// `Draft` opens an editing session; `Published` opens a read-only
    /// preview. Check [`is_fallback`](Self::is_fallback) before saving
    /// from a session that must not overwrite the remote document.
    pub async fn create(
        gateway: Arc<dyn PersistenceGateway>,
        key: DocumentKey,
        options: StoreOptions,
    ) -> Self {
        let store = Self::new(gateway, options);
        store.load(key).await;
        store
    }

    /// Fetch `key`, hydrate it against the defaults and make it current
    ///
    /// A failed fetch is not fatal: the session continues on the default
    /// document and the result is [`LoadOutcome::Fallback`]. History is
    /// reset and the store is clean afterwards. Edits are rejected with
    /// [`EditorError::Loading`] until this returns.
    pub async fn load(&self, key: DocumentKey) -> LoadOutcome {
        {
            let mut state = self.state();
            if state.disposed {
                return if state.fallback {
                    LoadOutcome::Fallback
                } else {
                    LoadOutcome::Remote
                };
            }
            state.loading = true;
        }

        let (document, outcome) = match self.inner.gateway.fetch_document(key).await {
            Ok(payload) => (hydrate(&payload), LoadOutcome::Remote),
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to load configuration, using defaults");
                (default_document(), LoadOutcome::Fallback)
            }
        };

        {
            let mut state = self.state();
            state.timer.cancel();
            state.current = Arc::new(document);
            state.history.reset();
            state.dirty.mark_clean();
            state.session_key = key;
            state.loading = false;
            state.fallback = outcome == LoadOutcome::Fallback;
        }

        info!(key = %key, ?outcome, "Configuration loaded");
        self.emit(StoreEvent::Loaded { key, outcome });
        outcome
    }

    /// Current (desktop) document
    pub fn get_config(&self) -> Arc<ConfigDocument> {
        self.state().current.clone()
    }

    /// Current document with `device` overrides resolved
    pub fn get_effective_config(&self, device: Device) -> EffectiveDocument {
        let current = self.get_config();
        resolve(&current, device)
    }

    /// Replace the whole document
    ///
    /// Returns `Ok(false)` when `next` is structurally equal to the current
    /// document: no history entry, no save.
    pub fn set_config(&self, next: ConfigDocument) -> Result<bool, EditorError> {
        let revision = {
            let mut state = self.state();
            state.ensure_writable()?;

            if *state.current == next {
                debug!("Ignoring edit identical to current document");
                return Ok(false);
            }

            let previous = std::mem::replace(&mut state.current, Arc::new(next));
            state.history.record(previous);
            let revision = state.dirty.mark_changed();
            self.schedule_save(&mut state);
            revision
        };

        self.emit(StoreEvent::Changed { revision });
        Ok(true)
    }

    /// Step back one edit; `false` if there is nothing to undo
    pub fn undo(&self) -> bool {
        self.step(|history, current| history.undo(current), "undo")
    }

    /// Re-apply an undone edit; `false` if there is nothing to redo
    pub fn redo(&self) -> bool {
        self.step(|history, current| history.redo(current), "redo")
    }

    fn step<F>(&self, apply: F, label: &'static str) -> bool
    where
        F: FnOnce(&mut History, Arc<ConfigDocument>) -> Option<Arc<ConfigDocument>>,
    {
        let revision = {
            let mut state = self.state();
            if state.disposed || state.loading {
                return false;
            }

            let current = state.current.clone();
            let Some(next) = apply(&mut state.history, current) else {
                debug!(action = label, "Nothing to {}", label);
                return false;
            };

            // An undo/redo is itself an edit that has to reach the draft
            state.current = next;
            let revision = state.dirty.mark_changed();
            self.schedule_save(&mut state);
            revision
        };

        self.emit(StoreEvent::Changed { revision });
        true
    }

    pub fn reset_history(&self) {
        self.state().history.reset();
    }

    /// Save the draft now
    ///
    /// Cancels the pending debounce. If another save is in flight this waits
    /// for it first.
    pub async fn save_config(&self) -> Result<(), EditorError> {
        {
            let mut state = self.state();
            state.ensure_writable()?;
            state.timer.cancel();
        }
        let mut abandoned = AbandonedFlush::new(self);

        let _guard = self.inner.save_lock.lock().await;
        let result = self.save_locked().await.map_err(EditorError::Save);
        abandoned.completed();
        result
    }

    /// Promote the draft to published
    ///
    /// Unsaved edits are saved first; if that save fails nothing is
    /// published and the error is [`EditorError::SaveBeforePublish`].
    pub async fn publish_config(&self) -> Result<(), EditorError> {
        {
            let mut state = self.state();
            state.ensure_writable()?;
            state.timer.cancel();
        }
        let mut abandoned = AbandonedFlush::new(self);

        let _guard = self.inner.save_lock.lock().await;

        let dirty = self.state().dirty.is_dirty();
        if dirty {
            let saved = self.save_locked().await;
            if let Err(e) = saved {
                abandoned.completed();
                return Err(EditorError::SaveBeforePublish(e));
            }
        }

        let published = self.inner.gateway.publish().await;
        abandoned.completed();
        if let Err(e) = published {
            warn!(error = %e, "Publish failed");
            return Err(EditorError::Publish(e));
        }

        info!("Draft published");
        self.emit(StoreEvent::Published);
        Ok(())
    }

    /// End the session: cancel any pending save and reject further edits
    ///
    /// Saves already in flight are left to finish.
    pub fn dispose(&self) {
        let mut state = self.state();
        if state.disposed {
            return;
        }
        state.disposed = true;
        state.timer.cancel();
        debug!("Configuration store disposed");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    pub fn is_dirty(&self) -> bool {
        self.state().dirty.is_dirty()
    }

    pub fn is_saving(&self) -> bool {
        self.state().dirty.is_saving()
    }

    pub fn can_undo(&self) -> bool {
        self.state().history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.state().history.can_redo()
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.state().dirty.last_saved()
    }

    pub fn session_key(&self) -> DocumentKey {
        self.state().session_key
    }

    /// Whether the last load failed and the session holds the defaults
    pub fn is_fallback(&self) -> bool {
        self.state().fallback
    }

    pub fn is_disposed(&self) -> bool {
        self.state().disposed
    }

    /// Whether a debounced save is waiting to fire
    pub fn has_pending_save(&self) -> bool {
        self.state().timer.is_armed()
    }

    pub fn options(&self) -> &StoreOptions {
        &self.inner.options
    }

    fn schedule_save(&self, state: &mut StoreState) {
        let weak: Weak<StoreInner> = Arc::downgrade(&self.inner);
        state.timer.arm(self.inner.options.debounce, async move {
            if let Some(inner) = weak.upgrade() {
                ConfigStore { inner }.flush_debounced().await;
            }
        });
    }

    /// Timer-driven save; failures are logged, never raised
    async fn flush_debounced(&self) {
        let _guard = self.inner.save_lock.lock().await;

        let should_save = {
            let state = self.state();
            state.dirty.is_dirty() && !state.disposed
        };
        if !should_save {
            debug!("Debounced save skipped, nothing unsaved");
            return;
        }

        if let Err(e) = self.save_locked().await {
            warn!(error = %e, "Debounced save failed, will retry on next edit or manual save");
        }
    }

    /// Save the current document; the caller holds `save_lock`
    async fn save_locked(&self) -> Result<(), GatewayError> {
        let (snapshot, revision) = {
            let mut state = self.state();
            let revision = state.dirty.begin_save();
            (state.current.clone(), revision)
        };

        debug!(revision, "Saving draft");
        let mut in_flight = InFlightSave { store: self, pending: true };
        let result = self.inner.gateway.save_draft(&snapshot).await;
        in_flight.pending = false;

        match result {
            Ok(()) => {
                let at = Utc::now();
                self.state().dirty.save_succeeded(revision, at);
                info!(revision, "Draft saved");
                self.emit(StoreEvent::Saved { at });
                Ok(())
            }
            Err(e) => {
                self.state().dirty.save_failed();
                self.emit(StoreEvent::SaveFailed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the saving flag when a save future is dropped mid-request
struct InFlightSave<'a> {
    store: &'a ConfigStore,
    pending: bool,
}

impl Drop for InFlightSave<'_> {
    fn drop(&mut self) {
        if self.pending {
            self.store.state().dirty.save_failed();
            warn!("Draft save dropped before the gateway answered");
        }
    }
}

/// Re-arms the debounce when a manual save or publish is dropped before it
/// finishes, so its cancelled timer does not strand unsaved edits
struct AbandonedFlush<'a> {
    store: &'a ConfigStore,
    pending: bool,
}

impl<'a> AbandonedFlush<'a> {
    fn new(store: &'a ConfigStore) -> Self {
        Self { store, pending: true }
    }

    fn completed(&mut self) {
        self.pending = false;
    }
}

impl Drop for AbandonedFlush<'_> {
    fn drop(&mut self) {
        if !self.pending {
            return;
        }
        let mut state = self.store.state();
        if state.dirty.is_dirty() && !state.disposed {
            debug!("Manual save abandoned, re-arming debounce");
            self.store.schedule_save(&mut state);
        }
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("ConfigStore")
            .field("session_key", &state.session_key)
            .field("revision", &state.dirty.revision())
            .field("dirty", &state.dirty.is_dirty())
            .field("loading", &state.loading)
            .field("fallback", &state.fallback)
            .field("disposed", &state.disposed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayCall, MemoryGateway};
    use serde_json::json;

    fn edit(store: &ConfigStore, title: &str) -> ConfigDocument {
        let next = store
            .get_config()
            .with_section("hero", json!({ "title": title }));
        store.set_config(next.clone()).unwrap();
        next
    }

    async fn draft_store(gateway: &Arc<MemoryGateway>) -> ConfigStore {
        ConfigStore::create(gateway.clone(), DocumentKey::Draft, StoreOptions::default()).await
    }

    #[test]
    fn test_options_from_json() {
        let options: StoreOptions =
            serde_json::from_str(r#"{ "debounceMs": 500, "historyCapacity": 10 }"#).unwrap();
        assert_eq!(options.debounce, Duration::from_millis(500));
        assert_eq!(options.history_capacity, 10);

        let defaults: StoreOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults, StoreOptions::default());
    }

    #[tokio::test]
    async fn test_new_store_is_loading_until_loaded() {
        let gateway = Arc::new(MemoryGateway::new());
        let store = ConfigStore::new(gateway.clone(), StoreOptions::default());
        assert!(store.is_loading());

        store.load(DocumentKey::Draft).await;
        assert!(!store.is_loading());
        assert!(!store.is_dirty());
        assert_eq!(gateway.calls(), vec![GatewayCall::Fetch(DocumentKey::Draft)]);
    }

    #[tokio::test]
    async fn test_load_hydrates_against_defaults() {
        let gateway = Arc::new(MemoryGateway::with_draft(json!({ "hero": { "title": "Mine" } })));
        let store = draft_store(&gateway).await;

        let config = store.get_config();
        assert_eq!(config.get_path("hero.title"), Some(&json!("Mine")));
        assert!(config.get_path("hero.subtitle").is_some());
        assert!(config.section("theme").is_some());
    }

    #[tokio::test]
    async fn test_load_failure_falls_back_to_defaults() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.fail_fetches(true);
        let store = draft_store(&gateway).await;

        assert!(!store.is_loading());
        assert!(store.is_fallback());
        assert_eq!(*store.get_config(), default_document());
    }

    #[tokio::test]
    async fn test_load_reports_where_the_document_came_from() {
        let gateway = Arc::new(MemoryGateway::with_draft(json!({ "hero": { "title": "Real" } })));
        let store = ConfigStore::new(gateway.clone(), StoreOptions::default());
        let mut events = store.subscribe();

        assert_eq!(store.load(DocumentKey::Draft).await, LoadOutcome::Remote);
        assert!(!store.is_fallback());
        assert_eq!(
            events.recv().await.unwrap(),
            StoreEvent::Loaded { key: DocumentKey::Draft, outcome: LoadOutcome::Remote }
        );

        // The real draft still exists, the session just cannot see it
        gateway.fail_fetches(true);
        assert_eq!(store.load(DocumentKey::Draft).await, LoadOutcome::Fallback);
        assert!(store.is_fallback());
        assert_eq!(*store.get_config(), default_document());
        assert_eq!(
            events.recv().await.unwrap(),
            StoreEvent::Loaded { key: DocumentKey::Draft, outcome: LoadOutcome::Fallback }
        );

        gateway.fail_fetches(false);
        assert_eq!(store.load(DocumentKey::Draft).await, LoadOutcome::Remote);
        assert!(!store.is_fallback());
        assert_eq!(store.get_config().get_path("hero.title"), Some(&json!("Real")));
    }

    #[tokio::test]
    async fn test_edits_rejected_while_loading() {
        let gateway = Arc::new(MemoryGateway::new());
        let store = ConfigStore::new(gateway.clone(), StoreOptions::default());

        let next = store.get_config().with_section("hero", json!({ "title": "Early" }));
        assert!(matches!(store.set_config(next.clone()), Err(EditorError::Loading)));
        assert!(matches!(store.save_config().await, Err(EditorError::Loading)));
        assert!(!store.undo());
        assert!(!store.is_dirty());
        assert!(!store.has_pending_save());

        store.load(DocumentKey::Draft).await;
        assert!(store.set_config(next).unwrap());
        assert_eq!(gateway.save_count(), 0);
    }

    #[tokio::test]
    async fn test_set_config_records_history_and_marks_dirty() {
        let gateway = Arc::new(MemoryGateway::new());
        let store = draft_store(&gateway).await;

        edit(&store, "One");
        assert!(store.is_dirty());
        assert!(store.can_undo());
        assert!(!store.can_redo());
        assert!(store.has_pending_save());
    }

    #[tokio::test]
    async fn test_identical_edit_is_ignored() {
        let gateway = Arc::new(MemoryGateway::new());
        let store = draft_store(&gateway).await;

        let same = (*store.get_config()).clone();
        assert!(!store.set_config(same).unwrap());
        assert!(!store.can_undo());
        assert!(!store.is_dirty());
        assert!(!store.has_pending_save());
    }

    #[tokio::test]
    async fn test_undo_marks_dirty_and_rearms_save() {
        let gateway = Arc::new(MemoryGateway::new());
        let store = draft_store(&gateway).await;
        let original = store.get_config();

        edit(&store, "One");
        store.save_config().await.unwrap();
        assert!(!store.is_dirty());
        assert!(!store.has_pending_save());

        assert!(store.undo());
        assert_eq!(store.get_config(), original);
        assert!(store.is_dirty());
        assert!(store.has_pending_save());
        assert!(store.can_redo());
    }

    #[tokio::test]
    async fn test_published_session_is_read_only() {
        let gateway = Arc::new(MemoryGateway::new());
        let store =
            ConfigStore::create(gateway.clone(), DocumentKey::Published, StoreOptions::default())
                .await;

        let next = store.get_config().with_section("hero", json!({ "title": "x" }));
        assert!(matches!(store.set_config(next), Err(EditorError::ReadOnly)));
        assert!(matches!(store.save_config().await, Err(EditorError::ReadOnly)));
        assert!(matches!(store.publish_config().await, Err(EditorError::ReadOnly)));
        assert_eq!(gateway.save_count(), 0);
    }

    #[tokio::test]
    async fn test_disposed_store_rejects_edits() {
        let gateway = Arc::new(MemoryGateway::new());
        let store = draft_store(&gateway).await;

        edit(&store, "One");
        store.dispose();
        assert!(!store.has_pending_save());
        assert!(store.is_disposed());

        let next = store.get_config().with_section("hero", json!({ "title": "Two" }));
        assert!(matches!(store.set_config(next), Err(EditorError::Disposed)));
        assert!(!store.undo());
    }

    #[tokio::test]
    async fn test_events_are_broadcast() {
        let gateway = Arc::new(MemoryGateway::new());
        let store = draft_store(&gateway).await;
        let mut events = store.subscribe();

        edit(&store, "One");
        store.save_config().await.unwrap();

        assert_eq!(events.recv().await.unwrap(), StoreEvent::Changed { revision: 1 });
        assert!(matches!(events.recv().await.unwrap(), StoreEvent::Saved { .. }));
    }

    #[tokio::test]
    async fn test_effective_config_resolves_overrides() {
        let gateway = Arc::new(MemoryGateway::with_draft(json!({
            "hero": { "titleSize": 64, "mobile": { "titleSize": 32 } }
        })));
        let store = draft_store(&gateway).await;

        let mobile = store.get_effective_config(Device::Mobile);
        assert_eq!(mobile.get_path("hero.titleSize"), Some(&json!(32)));
        assert!(mobile.get_path("hero.mobile").is_none());

        let desktop = store.get_effective_config(Device::Desktop);
        assert_eq!(desktop.get_path("hero.titleSize"), Some(&json!(64)));
    }
}
