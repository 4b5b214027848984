//! # Folio Workspace
//!
//! Backend for the Folio site builder: draft/published document storage,
//! media uploads, and the HTTP client the editor persists through.
//!
//! ```text
//! ConfigStore ──► HttpGateway ──HTTP──► router() ──► DocumentRepository
//!                                                └─► MediaLibrary
//! ```

pub mod client;
pub mod media;
pub mod repository;
pub mod server;

pub use client::HttpGateway;
pub use media::{is_valid_media_name, MediaEntry, MediaLibrary};
pub use repository::{DocumentRepository, StorageError};
pub use server::{router, AppState, ServerError, MAX_UPLOAD_BYTES};
