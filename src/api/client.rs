use crate::error::QueryError;
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::{Client, StatusCode};
use serde::Serialize;

/// Raw body chunks in arrival order.
pub type ChunkStream = BoxStream<'static, Result<Vec<u8>, QueryError>>;

/// Transport seam between the request drivers and the agent service.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Send `content` and read the whole body as one JSON value.
    async fn complete(&self, content: &str) -> Result<String, QueryError>;

    /// Send `content` and hand back the body as a chunk stream.
    ///
    /// `Ok(None)` means the server answered without a body.
    async fn open_stream(&self, content: &str) -> Result<Option<ChunkStream>, QueryError>;

    fn endpoint(&self) -> &str;
}

#[derive(Serialize)]
struct CallRequest<'a> {
    content: &'a str,
}

/// `POST {"content": ...}` against a fixed endpoint.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    endpoint: String,
}

impl HttpBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    async fn send(&self, content: &str) -> Result<reqwest::Response, QueryError> {
        // reqwest's .json() sets Content-Type: application/json
        let response = self
            .client
            .post(&self.endpoint)
            .json(&CallRequest { content })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

/// Render a one-shot body for display: strings verbatim, other JSON pretty-printed,
/// anything unparseable as raw text.
pub fn display_body(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(text)) => text,
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| body.to_string()),
        Err(_) => body.to_string(),
    }
}

#[async_trait]
impl QueryBackend for HttpBackend {
    async fn complete(&self, content: &str) -> Result<String, QueryError> {
        let response = self.send(content).await?;
        let body = response.text().await?;
        Ok(display_body(&body))
    }

    async fn open_stream(&self, content: &str) -> Result<Option<ChunkStream>, QueryError> {
        let response = self.send(content).await?;
        if response.status() == StatusCode::NO_CONTENT || response.content_length() == Some(0) {
            return Ok(None);
        }

        let chunks = response
            .bytes_stream()
            .map(|item| item.map(|bytes| bytes.to_vec()).map_err(QueryError::from));
        Ok(Some(chunks.boxed()))
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
