//! Error types for the editor

use crate::gateway::GatewayError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Failed to save draft: {0}")]
    Save(#[source] GatewayError),

    #[error("Failed to save before publishing: {0}")]
    SaveBeforePublish(#[source] GatewayError),

    #[error("Failed to publish: {0}")]
    Publish(#[source] GatewayError),

    #[error("Section '{0}' does not support device overrides")]
    OverrideNotSupported(String),

    #[error("Invalid document path: {0}")]
    InvalidPath(String),

    #[error("Document is read-only")]
    ReadOnly,

    #[error("Document is still loading")]
    Loading,

    #[error("Store has been disposed")]
    Disposed,
}

impl EditorError {
    /// The gateway failure behind a save/publish error, if any
    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            EditorError::Save(e) | EditorError::SaveBeforePublish(e) | EditorError::Publish(e) => {
                Some(e)
            }
            _ => None,
        }
    }
}
