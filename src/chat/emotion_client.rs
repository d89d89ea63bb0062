//! Remote emotion route (`POST {text}` → `EmotionState`).

use crate::emotion::{EmotionDetector, EmotionState};
use crate::error::{Result, SamanthaError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

/// [`EmotionDetector`] backed by the emotion HTTP route.
///
/// Lookup failures degrade to [`EmotionState::neutral`] so a missing
/// route never blocks a turn.
#[derive(Debug, Clone)]
pub struct HttpEmotionClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpEmotionClient {
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SamanthaError::Chat(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Query the route, surfacing failures.
    ///
    /// # Errors
    ///
    /// Returns [`SamanthaError::Chat`] on transport, status or decoding failure.
    pub async fn try_detect(&self, text: &str) -> Result<EmotionState> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| SamanthaError::Chat(format!("emotion request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SamanthaError::Chat(format!(
                "emotion endpoint returned {status}"
            )));
        }

        let mut state: EmotionState = response
            .json()
            .await
            .map_err(|e| SamanthaError::Chat(format!("invalid emotion body: {e}")))?;
        state.intensity = state.intensity.clamp(1, 10);
        Ok(state)
    }
}

#[async_trait]
impl EmotionDetector for HttpEmotionClient {
    async fn detect(&self, text: &str) -> EmotionState {
        match self.try_detect(text).await {
            Ok(state) => state,
            Err(e) => {
                warn!("emotion detection failed, assuming neutral: {e}");
                EmotionState::neutral()
            }
        }
    }
}
