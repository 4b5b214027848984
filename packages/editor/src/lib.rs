//! # Folio Editor
//!
//! Configuration state engine for the Folio site builder.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ editor panels: read-modify-write documents  │
//! └─────────────────────────────────────────────┘
//!                     ↓ set_config / undo / redo
//! ┌─────────────────────────────────────────────┐
//! │ ConfigStore                                 │
//! │  - History (bounded undo/redo snapshots)    │
//! │  - DirtyTracker + SaveTimer (debounce)      │
//! │  - PersistenceGateway (draft / published)   │
//! └─────────────────────────────────────────────┘
//!                     ↓ get_effective_config(device)
//! ┌─────────────────────────────────────────────┐
//! │ overrides::resolve → merge                  │
//! │ landing-page renderer                       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Whole-document edits**: panels send complete documents, never patches
//! 2. **Linear history**: a fresh edit discards the redo branch
//! 3. **One save in flight**: bursts of edits collapse into one draft write
//! 4. **Publish never outruns the draft**: unsaved edits are flushed first
//! 5. **Pure resolution**: effective configs depend only on (document, device)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_editor::{ConfigStore, Device, DocumentKey, MemoryGateway, StoreOptions};
//!
//! let gateway = Arc::new(MemoryGateway::new());
//! let store = ConfigStore::create(gateway, DocumentKey::Draft, StoreOptions::default()).await;
//!
//! let next = store.get_config().with_section("hero", json!({ "title": "Hi" }));
//! store.set_config(next)?;
//!
//! let mobile = store.get_effective_config(Device::Mobile);
//! store.publish_config().await?;
//! store.dispose();
//! ```

pub mod defaults;
mod document;
mod errors;
mod gateway;
mod history;
pub mod merge;
pub mod overrides;
mod scheduler;
mod store;

pub use defaults::default_document;
pub use document::{
    supports_overrides, ConfigDocument, Device, DocumentKey, DEVICE_OVERRIDE_KEYS,
    OVERRIDE_SECTIONS,
};
pub use errors::EditorError;
pub use gateway::{GatewayCall, GatewayError, MemoryGateway, PersistenceGateway};
pub use history::{History, HistoryEntry, DEFAULT_HISTORY_CAPACITY};
pub use merge::{hydrate, merge, merge_documents};
pub use overrides::{resolve, EffectiveDocument};
pub use scheduler::{DirtyTracker, SaveTimer, DEFAULT_DEBOUNCE};
pub use store::{ConfigStore, LoadOutcome, StoreEvent, StoreOptions};

// Re-export so gateway implementors don't need their own dependency
pub use async_trait::async_trait;
