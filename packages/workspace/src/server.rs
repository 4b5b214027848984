//! HTTP API consumed by the editor and the public site
//!
//! ```text
//! GET    /api/config/:key      draft | published (default template if never written)
//! PUT    /api/config/draft     replace the draft            (admin)
//! POST   /api/publish          copy draft → published       (admin)
//! GET    /api/media            list uploaded assets
//! PUT    /api/media/:name      upload raw bytes             (admin)
//! DELETE /api/media/:name      remove an asset              (admin)
//! GET    /media/*              static asset files
//! ```

use crate::media::{MediaEntry, MediaLibrary};
use crate::repository::{DocumentRepository, StorageError};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use folio_editor::{default_document, DocumentKey};
use serde_json::{json, Value};
use std::path::Path as FsPath;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

/// Upper bound for a single media upload
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Missing or invalid admin token")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Document '{0}' is read-only")]
    ReadOnly(DocumentKey),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::ReadOnly(_) => StatusCode::METHOD_NOT_ALLOWED,
            ServerError::Storage(StorageError::NoDraft) => StatusCode::NOT_FOUND,
            ServerError::Storage(StorageError::InvalidMediaName(_)) => StatusCode::BAD_REQUEST,
            ServerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub struct AppState {
    pub documents: DocumentRepository,
    pub media: MediaLibrary,
    /// Writes are refused outright when no token is configured
    pub admin_token: Option<String>,
}

impl AppState {
    pub async fn open(data_dir: &FsPath, admin_token: Option<String>) -> Result<Self, StorageError> {
        let admin_token = admin_token.filter(|t| !t.is_empty());
        if admin_token.is_none() {
            tracing::warn!("No admin token configured, all writes will be rejected");
        }

        Ok(Self {
            documents: DocumentRepository::open(data_dir).await?,
            media: MediaLibrary::open(data_dir).await?,
            admin_token,
        })
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), ServerError> {
        let expected = self.admin_token.as_deref().ok_or(ServerError::Unauthorized)?;

        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim);

        match presented {
            Some(token) if token == expected => Ok(()),
            _ => Err(ServerError::Unauthorized),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let media_dir = state.media.dir().to_path_buf();

    Router::new()
        .route("/api/config/:key", get(get_document).put(put_document))
        .route("/api/publish", post(publish))
        .route("/api/media", get(list_media))
        .route(
            "/api/media/:name",
            put(upload_media)
                .delete(delete_media)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .with_state(state)
        .nest_service("/media", ServeDir::new(media_dir))
        .layer(CorsLayer::permissive())
}

fn parse_key(raw: &str) -> Result<DocumentKey, ServerError> {
    raw.parse()
        .map_err(|_| ServerError::NotFound(format!("document '{}'", raw)))
}

async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<Value>, ServerError> {
    let key = parse_key(&key)?;

    let document = match state.documents.get(key).await? {
        Some(document) => document,
        None => {
            tracing::debug!(key = %key, "Slot never written, serving default template");
            default_document().into_value()
        }
    };
    Ok(Json(document))
}

async fn put_document(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<StatusCode, ServerError> {
    state.authorize(&headers)?;

    let key = parse_key(&key)?;
    if key != DocumentKey::Draft {
        return Err(ServerError::ReadOnly(key));
    }
    if !body.is_object() {
        return Err(ServerError::BadRequest(
            "Configuration document must be a JSON object".to_string(),
        ));
    }

    state.documents.put(key, &body).await?;
    tracing::info!("Draft saved");
    Ok(StatusCode::NO_CONTENT)
}

async fn publish(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, ServerError> {
    state.authorize(&headers)?;

    state.documents.publish().await?;
    tracing::info!("Draft published");
    Ok(StatusCode::NO_CONTENT)
}

async fn list_media(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MediaEntry>>, ServerError> {
    Ok(Json(state.media.list().await?))
}

async fn upload_media(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<MediaEntry>), ServerError> {
    state.authorize(&headers)?;

    if body.is_empty() {
        return Err(ServerError::BadRequest("Empty upload".to_string()));
    }

    let entry = state.media.put(&name, &body).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn delete_media(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ServerError> {
    state.authorize(&headers)?;

    if state.media.delete(&name).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServerError::NotFound(format!("media '{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use tempfile::TempDir;

    async fn state_with_token(dir: &TempDir, token: Option<&str>) -> AppState {
        AppState::open(dir.path(), token.map(String::from))
            .await
            .unwrap()
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn test_authorize() {
        let dir = TempDir::new().unwrap();
        let state = state_with_token(&dir, Some("secret")).await;

        assert!(state.authorize(&bearer("secret")).is_ok());
        assert!(matches!(
            state.authorize(&bearer("wrong")),
            Err(ServerError::Unauthorized)
        ));
        assert!(matches!(
            state.authorize(&HeaderMap::new()),
            Err(ServerError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_missing_or_empty_token_rejects_everything() {
        let dir = TempDir::new().unwrap();

        for token in [None, Some("")] {
            let state = state_with_token(&dir, token).await;
            assert!(state.authorize(&bearer("")).is_err());
            assert!(state.authorize(&bearer("anything")).is_err());
        }
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(ServerError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ServerError::Storage(StorageError::NoDraft).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::Storage(StorageError::InvalidMediaName("..".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::ReadOnly(DocumentKey::Published).status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }
}
