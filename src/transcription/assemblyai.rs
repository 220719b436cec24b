//! AssemblyAI transcription over its REST API

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::config::{Settings, MIN_POLL_INTERVAL_MS};
use crate::transcription::client::{
    TranscriptResult, TranscriptionOptions, TranscriptionProvider, Utterance,
};

const DEFAULT_ASSEMBLYAI_ENDPOINT: &str = "https://api.assemblyai.com/v2";

pub struct AssemblyAiClient {
    http: Client,
    api_key: String,
    endpoint: String,
    options: TranscriptionOptions,
    poll_interval: Duration,
}

impl AssemblyAiClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.transcription.api_key.trim().to_string();
        if api_key.is_empty() {
            anyhow::bail!(
                "AssemblyAI API key is missing. Set transcription.api_key in config or CLINIA_ASSEMBLYAI_API_KEY."
            );
        }

        let endpoint = if settings.transcription.endpoint.trim().is_empty() {
            DEFAULT_ASSEMBLYAI_ENDPOINT.to_string()
        } else {
            settings
                .transcription
                .endpoint
                .trim()
                .trim_end_matches('/')
                .to_string()
        };

        Ok(Self {
            http: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .context("Failed to build AssemblyAI HTTP client")?,
            api_key,
            endpoint,
            options: TranscriptionOptions::from_settings(&settings.transcription),
            poll_interval: poll_interval(settings.transcription.poll_interval_ms),
        })
    }

    async fn upload(&self, audio_path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(audio_path)
            .await
            .with_context(|| format!("Failed to read audio file: {}", audio_path.display()))?;

        tracing::debug!("Uploading {} bytes to AssemblyAI", bytes.len());

        let response: UploadResponse = self
            .http
            .post(format!("{}/upload", self.endpoint))
            .header("authorization", &self.api_key)
            .body(bytes)
            .send()
            .await
            .context("AssemblyAI upload failed")?
            .error_for_status()
            .context("AssemblyAI upload returned an error status")?
            .json()
            .await
            .context("Failed to parse AssemblyAI upload response")?;

        Ok(response.upload_url)
    }

    async fn submit(&self, audio_url: String) -> Result<String> {
        let body = TranscriptRequest {
            audio_url,
            options: &self.options,
        };

        let response: TranscriptResponse = self
            .http
            .post(format!("{}/transcript", self.endpoint))
            .header("authorization", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("AssemblyAI transcript request failed")?
            .error_for_status()
            .context("AssemblyAI transcript request returned an error status")?
            .json()
            .await
            .context("Failed to parse AssemblyAI transcript response")?;

        Ok(response.id)
    }

    async fn poll(&self, id: &str) -> Result<TranscriptResponse> {
        loop {
            let response: TranscriptResponse = self
                .http
                .get(format!("{}/transcript/{}", self.endpoint, id))
                .header("authorization", &self.api_key)
                .send()
                .await
                .context("AssemblyAI status request failed")?
                .error_for_status()
                .context("AssemblyAI status request returned an error status")?
                .json()
                .await
                .context("Failed to parse AssemblyAI status response")?;

            match response.status {
                TranscriptStatus::Completed => return Ok(response),
                TranscriptStatus::Error => anyhow::bail!(
                    "Transcription failed: {}",
                    response.error.as_deref().unwrap_or("unknown error")
                ),
                TranscriptStatus::Queued | TranscriptStatus::Processing => {
                    tracing::debug!("Transcript {} is {:?}, waiting", id, response.status);
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}

fn poll_interval(ms: u64) -> Duration {
    Duration::from_millis(ms.max(MIN_POLL_INTERVAL_MS))
}

#[async_trait]
impl TranscriptionProvider for AssemblyAiClient {
    async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptResult> {
        tracing::info!("Starting transcription for: {}", audio_path.display());

        let audio_url = self.upload(audio_path).await?;
        let id = self.submit(audio_url).await?;
        tracing::info!("Transcription {} submitted, waiting for completion", id);

        let response = self.poll(&id).await?;
        Ok(response.into_result())
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Serialize)]
struct TranscriptRequest<'a> {
    audio_url: String,
    #[serde(flatten)]
    options: &'a TranscriptionOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TranscriptStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    id: String,
    status: TranscriptStatus,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    /// Seconds
    #[serde(default)]
    audio_duration: Option<f64>,
    #[serde(default)]
    words: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    utterances: Option<Vec<UtteranceResponse>>,
}

#[derive(Debug, Deserialize)]
struct UtteranceResponse {
    speaker: String,
    text: String,
    confidence: f64,
    start: u64,
    end: u64,
}

impl TranscriptResponse {
    fn into_result(self) -> TranscriptResult {
        TranscriptResult {
            text: self.text.unwrap_or_default(),
            confidence: self.confidence.unwrap_or_default(),
            audio_duration_ms: self
                .audio_duration
                .map(|secs| (secs * 1000.0).round() as u64)
                .unwrap_or_default(),
            word_count: self.words.map(|w| w.len()).unwrap_or_default(),
            utterances: self
                .utterances
                .unwrap_or_default()
                .into_iter()
                .map(|u| Utterance {
                    speaker: u.speaker,
                    text: u.text,
                    confidence: u.confidence,
                    start_ms: u.start,
                    end_ms: u.end,
                })
                .collect(),
        }
    }
}
