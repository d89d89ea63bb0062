//! HTTP implementation of [`ChatClient`].
//!
//! Two reply shapes are supported (see [`ChatMode`]):
//! - `Structured`: the route answers with `{response, emotion, type}`.
//! - `Stream`: the route streams raw text chunks from the hosted model.
//!   Chunks are forwarded to an optional sink as they arrive so a renderer
//!   can show the reply incrementally; the bubble emotion is then derived
//!   locally from the finished text.

use super::{ChatClient, ChatReply, ChatRequest, StructuredReply};
use crate::config::{ChatConfig, ChatMode};
use crate::emotion;
use crate::error::{Result, SamanthaError};
use async_trait::async_trait;
use futures_util::StreamExt;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Chat client speaking to the backend route over HTTP.
#[derive(Debug, Clone)]
pub struct HttpChatClient {
    client: reqwest::Client,
    endpoint: String,
    mode: ChatMode,
    chunk_tx: Option<mpsc::UnboundedSender<String>>,
}

impl HttpChatClient {
    /// Create a client from config.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SamanthaError::Chat(format!("failed to build HTTP client: {e}")))?;

        info!("chat endpoint: {} ({:?})", config.endpoint, config.mode);

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            mode: config.mode,
            chunk_tx: None,
        })
    }

    /// Forward streamed text chunks to `tx` as they arrive (stream mode only).
    #[must_use]
    pub fn with_chunk_sink(mut self, tx: mpsc::UnboundedSender<String>) -> Self {
        self.chunk_tx = Some(tx);
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, request: &ChatRequest) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| SamanthaError::Chat(format!("request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // The backend reports `{ "error": "..." }` on failure.
        let detail = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v["error"].as_str().map(str::to_owned))
            .unwrap_or_else(|| format!("a server error occurred (status: {status})"));
        Err(SamanthaError::Chat(format!(
            "chat endpoint returned {status}: {detail}"
        )))
    }

    async fn send_structured(&self, request: &ChatRequest) -> Result<ChatReply> {
        let response = self.post(request).await?;
        let raw: StructuredReply = response
            .json()
            .await
            .map_err(|e| SamanthaError::Chat(format!("invalid reply body: {e}")))?;
        Ok(raw.into())
    }

    async fn send_streaming(&self, request: &ChatRequest) -> Result<ChatReply> {
        let response = self.post(request).await?;
        let mut stream = response.bytes_stream();

        let mut text = String::new();
        let mut decoder = Utf8Chunks::default();
        let mut chunks = 0usize;

        while let Some(item) = stream.next().await {
            let bytes = item.map_err(|e| SamanthaError::Chat(format!("stream read error: {e}")))?;
            let Some(chunk) = decoder.push(&bytes)? else {
                continue;
            };

            chunks += 1;
            text.push_str(&chunk);
            if let Some(tx) = &self.chunk_tx {
                let _ = tx.send(chunk);
            }
        }

        if decoder.leftover() > 0 {
            warn!(
                "dropping {} trailing bytes of partial UTF-8",
                decoder.leftover()
            );
        }

        let text = text.trim().to_owned();
        if text.is_empty() {
            return Err(SamanthaError::Chat("empty streamed reply".into()));
        }
        debug!("assembled streamed reply from {chunks} chunks");

        let tone = emotion::analyze(&text).sentiment.display_emotion();
        Ok(ChatReply::standard(text, tone))
    }
}

/// Decodes a byte stream as UTF-8, holding back a character split across
/// chunk boundaries until the rest of it arrives.
#[derive(Debug, Default)]
struct Utf8Chunks {
    pending: Vec<u8>,
}

impl Utf8Chunks {
    /// Append `bytes` and return the text that is now complete, if any.
    fn push(&mut self, bytes: &[u8]) -> Result<Option<String>> {
        self.pending.extend_from_slice(bytes);
        let valid = match std::str::from_utf8(&self.pending) {
            Ok(s) => s.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => return Err(SamanthaError::Chat(format!("stream is not UTF-8: {e}"))),
        };
        if valid == 0 {
            return Ok(None);
        }
        let rest = self.pending.split_off(valid);
        let complete = std::mem::replace(&mut self.pending, rest);
        String::from_utf8(complete)
            .map(Some)
            .map_err(|e| SamanthaError::Chat(format!("stream is not UTF-8: {e}")))
    }

    /// Bytes still waiting for the end of a character.
    fn leftover(&self) -> usize {
        self.pending.len()
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply> {
        let started = Instant::now();
        let reply = match self.mode {
            ChatMode::Structured => self.send_structured(request).await,
            ChatMode::Stream => self.send_streaming(request).await,
        }?;
        info!(
            "chat reply in {:.0}ms ({:?}, {})",
            started.elapsed().as_millis(),
            reply.turn_type,
            reply.emotion.as_str()
        );
        Ok(reply)
    }
}
