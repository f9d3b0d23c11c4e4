//! docchat API client struct and builder.

use std::time::Duration;

use docchat_types::{ApiError, ChatRequest};
use futures::StreamExt;
use serde::de::DeserializeOwned;

use crate::controller::ChatStream;
use crate::error::{check_status, map_reqwest_error};

/// Default API base URL.
const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Path prefix shared by every endpoint.
const API_PREFIX: &str = "/api";

/// Detail used when a failed chat request carries no readable `detail`.
pub const CHAT_REQUEST_FAILED: &str = "Chat request failed";

/// Client for the docchat HTTP API.
///
/// # Example
///
/// ```no_run
/// use docchat_client::DocChat;
/// use std::time::Duration;
///
/// let client = DocChat::new("http://localhost:8000")
///     .timeout(Duration::from_secs(120));
/// ```
#[derive(Debug, Clone)]
pub struct DocChat {
    /// API origin, without the `/api` prefix.
    pub(crate) base_url: String,
    /// Per-request timeout; `None` waits indefinitely.
    pub(crate) timeout: Option<Duration>,
    /// Shared HTTP client.
    pub(crate) client: reqwest::Client,
}

impl Default for DocChat {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl DocChat {
    /// Create a client for the API at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: None,
            client: reqwest::Client::new(),
        }
    }

    /// Fail requests that take longer than `timeout`, including the whole
    /// streamed body of a chat answer.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use a preconfigured HTTP client (proxies, TLS roots, default headers).
    #[must_use]
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// API origin this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the URL of an API path such as `/chat`.
    #[must_use]
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{API_PREFIX}{path}", self.base_url)
    }

    /// Start streaming the assistant's answer to `request`.
    ///
    /// Returns immediately; the request is sent when the returned
    /// [`ChatStream`] is first polled. Every failure, including a rejected
    /// request, is reported through the stream's final update.
    pub fn send_message(&self, request: ChatRequest) -> ChatStream {
        let url = self.api_url("/chat");
        let http_client = self.client.clone();
        let timeout = self.timeout;
        let message_id = format!("assistant-{}", uuid::Uuid::new_v4());

        let connect = async move {
            tracing::debug!(
                url = %url,
                conversation_id = %request.conversation_id,
                documents = request.document_ids.as_ref().map_or(0, Vec::len),
                "sending chat request"
            );

            let mut builder = http_client.post(&url).json(&request);
            if let Some(timeout) = timeout {
                builder = builder.timeout(timeout);
            }
            let response = builder
                .send()
                .await
                .map_err(|e| map_reqwest_error(e, timeout))?;
            let response = check_status(response, CHAT_REQUEST_FAILED).await?;

            Ok(response
                .bytes_stream()
                .map(move |chunk| chunk.map_err(|e| map_reqwest_error(e, timeout))))
        };

        ChatStream::connect(message_id, connect)
    }

    /// Send a request and decode a JSON success body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let response = self.send_checked(builder, fallback).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout))
    }

    /// Send a request and check its status, discarding the body.
    pub(crate) async fn send_checked(
        &self,
        builder: reqwest::RequestBuilder,
        fallback: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let builder = match self.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        };
        let response = builder
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout))?;
        check_status(response, fallback).await
    }
}
