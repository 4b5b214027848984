//! `PersistenceGateway` over the folio-server HTTP API

use async_trait::async_trait;
use folio_editor::{ConfigDocument, DocumentKey, GatewayError, PersistenceGateway};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Bearer token sent with writes
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        check_status(response).await
    }
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

async fn check_status(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = error_message(response).await;
    Err(if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        GatewayError::Unauthorized
    } else if status == StatusCode::NOT_FOUND {
        GatewayError::NotFound(message)
    } else {
        GatewayError::Status {
            status: status.as_u16(),
            message,
        }
    })
}

/// The server answers errors with `{"error": "..."}`; fall back to the raw body
async fn error_message(response: Response) -> String {
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| value.get("error").and_then(Value::as_str).map(String::from))
        .unwrap_or(body)
}

#[async_trait]
impl PersistenceGateway for HttpGateway {
    async fn fetch_document(&self, key: DocumentKey) -> Result<Value, GatewayError> {
        let request = self.client.get(self.url(&format!("/api/config/{}", key)));
        let response = self.send(request).await?;

        response
            .json::<Value>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }

    async fn save_draft(&self, document: &ConfigDocument) -> Result<(), GatewayError> {
        let request = self
            .client
            .put(self.url(&format!("/api/config/{}", DocumentKey::Draft)))
            .json(document);
        self.send(self.authorized(request)).await?;

        tracing::debug!(url = %self.base_url, "Draft uploaded");
        Ok(())
    }

    async fn publish(&self) -> Result<(), GatewayError> {
        let request = self.client.post(self.url("/api/publish"));
        self.send(self.authorized(request)).await?;

        tracing::debug!(url = %self.base_url, "Publish requested");
        Ok(())
    }
}
