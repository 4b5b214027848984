pub mod init;
pub mod publish;
pub mod set;
pub mod show;

pub use init::{init, InitArgs};
pub use publish::{publish, PublishArgs};
pub use set::{set, SetArgs};
pub use show::{show, ShowArgs};

use crate::config::Config;
use anyhow::bail;
use folio_editor::{ConfigStore, DocumentKey, PersistenceGateway, StoreOptions};
use folio_workspace::HttpGateway;
use std::sync::Arc;

/// Open an editing session on `key` against the configured backend
pub(crate) async fn open_session(config: &Config, key: DocumentKey) -> anyhow::Result<ConfigStore> {
    let mut gateway = HttpGateway::new(&config.server_url)?;
    if let Some(token) = &config.token {
        gateway = gateway.with_token(token);
    }

    session_from(Arc::new(gateway), key, config.editor.clone(), &config.server_url).await
}

/// Load `key` and refuse sessions that fell back to the default document
///
/// A headless edit on a fallback session would save the defaults over the
/// real draft.
async fn session_from(
    gateway: Arc<dyn PersistenceGateway>,
    key: DocumentKey,
    options: StoreOptions,
    source: &str,
) -> anyhow::Result<ConfigStore> {
    let store = ConfigStore::create(gateway, key, options).await;
    if store.is_fallback() {
        store.dispose();
        bail!(
            "Could not load the {} document from {}; refusing to edit the defaults",
            key,
            source
        );
    }
    Ok(store)
}
