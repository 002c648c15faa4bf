//! HTTP transport abstraction
//!
//! The services in this crate never touch reqwest directly; they go
//! through the `Transport` trait so tests can script responses and so a
//! host application can substitute its own HTTP stack.

use async_trait::async_trait;
use mtc_common::{Error, Result};
use serde_json::Value;
use std::time::Duration;

const USER_AGENT: &str = "MTC/0.1.0 (+https://github.com/mtc/mtc)";

/// A structured status-plus-body response from the remote service
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code (always 2xx for an Ok return)
    pub status: u16,
    /// Parsed JSON body, when the response carried one
    pub data: Option<Value>,
}

/// GET/POST with JSON bodies against the remote translation service
///
/// Failures carry a numeric status where one exists (`Error::Http`);
/// requests that never produced a response map to `Error::Network`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str) -> Result<HttpResponse>;
    async fn post(&self, path: &str, body: Option<Value>) -> Result<HttpResponse>;
}

/// reqwest-backed transport against a configured base URL
pub struct HttpTransport {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            http_client,
            base_url,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn into_response(response: reqwest::Response) -> Result<HttpResponse> {
        let status = response.status().as_u16();

        if !(200..300).contains(&status) {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Http { status, message });
        }

        // Empty and non-JSON bodies are legal (e.g. 204 from a command)
        let data = response.json::<Value>().await.ok();
        Ok(HttpResponse { status, data })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<HttpResponse> {
        let url = self.url(path);
        tracing::debug!(url = %url, "GET");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Self::into_response(response).await
    }

    async fn post(&self, path: &str, body: Option<Value>) -> Result<HttpResponse> {
        let url = self.url(path);
        tracing::debug!(url = %url, "POST");

        let mut request = self.http_client.post(&url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Self::into_response(response).await
    }
}
