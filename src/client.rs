// Copyright 2026 The Shopclerk Project
// SPDX-License-Identifier: Apache-2.0

// HTTP transport to the chat backend.
//
// The backend is an opaque collaborator with three endpoints:
// - POST /chat                    -> streamed `data: <json>\n\n` records
// - GET  /chat?history=true&...   -> {messages: [{role, content}]}
// - GET  /auth/token-status?...   -> {status}
//
// The transport is a trait so tests and embedders can substitute their
// own; `HttpTransport` is the reqwest implementation.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_stream::Stream;

/// Byte stream of one chat response body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from the chat backend transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status: {0}")]
    Status(u16),
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Body of a `POST /chat` request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: Option<String>,
    pub prompt_type: String,
}

/// One stored message from the history endpoint.
///
/// `content` is itself JSON-encoded content blocks on newer
/// conversations and plain text on older ones; parsing is best-effort.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
}

impl HistoryMessage {
    /// Extract the displayable text blocks of this message.
    ///
    /// Falls back to the raw content when it is not a JSON block array.
    pub fn text_blocks(&self) -> Vec<String> {
        match serde_json::from_str::<Vec<ContentBlock>>(&self.content) {
            Ok(blocks) => blocks
                .into_iter()
                .filter(|b| b.kind == "text")
                .map(|b| b.text)
                .collect(),
            Err(_) => vec![self.content.clone()],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub messages: Vec<HistoryMessage>,
}

/// Response of the token-status endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenStatus {
    #[serde(default)]
    pub status: String,
}

impl TokenStatus {
    pub fn authorized(&self) -> bool {
        self.status == "authorized"
    }
}

// ---------------------------------------------------------------------------
// Transport trait
// ---------------------------------------------------------------------------

/// Chat backend operations.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Start a chat turn; returns the response body stream.
    async fn send_chat(&self, request: &ChatRequest) -> Result<ByteStream, TransportError>;

    /// Fetch stored conversation history.
    async fn fetch_history(&self, conversation_id: &str)
        -> Result<HistoryResponse, TransportError>;

    /// Check whether the user has completed authentication.
    async fn token_status(&self, conversation_id: &str) -> Result<TokenStatus, TransportError>;
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// reqwest-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    shop_id: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, shop_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            shop_id: shop_id.into(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send_chat(&self, request: &ChatRequest) -> Result<ByteStream, TransportError> {
        let response = self
            .client
            .post(format!("{}/chat", self.base_url))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .header("X-Shopify-Shop-Id", &self.shop_id)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let stream = response
            .bytes_stream()
            .map(|item| item.map_err(TransportError::Http));
        Ok(Box::pin(stream))
    }

    async fn fetch_history(
        &self,
        conversation_id: &str,
    ) -> Result<HistoryResponse, TransportError> {
        let response = self
            .client
            .get(format!("{}/chat", self.base_url))
            .query(&[("history", "true"), ("conversation_id", conversation_id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }

    async fn token_status(&self, conversation_id: &str) -> Result<TokenStatus, TransportError> {
        let response = self
            .client
            .get(format!("{}/auth/token-status", self.base_url))
            .query(&[("conversation_id", conversation_id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }
}
