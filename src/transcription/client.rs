use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::{Settings, TranscriptionSettings};
use crate::transcription::assemblyai::AssemblyAiClient;

/// Approximate provider price per second of audio, in USD
const COST_PER_SECOND_USD: f64 = 0.00025;

/// Options sent with every transcription request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptionOptions {
    pub language_code: String,
    pub punctuate: bool,
    pub format_text: bool,
    pub speaker_labels: bool,
}

impl TranscriptionOptions {
    pub fn from_settings(settings: &TranscriptionSettings) -> Self {
        Self {
            language_code: settings.language_code.clone(),
            punctuate: settings.punctuate,
            format_text: settings.format_text,
            speaker_labels: settings.speaker_labels,
        }
    }
}

/// Normalized transcription output.
///
/// Confidence and duration are the provider's values; nothing is re-scored locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptResult {
    pub text: String,

    /// 0.0 - 1.0
    pub confidence: f64,

    pub audio_duration_ms: u64,

    pub word_count: usize,

    /// Speaker-separated segments, empty without diarization
    #[serde(default)]
    pub utterances: Vec<Utterance>,
}

/// One diarized segment of speech
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker: String,
    pub text: String,
    pub confidence: f64,
    pub start_ms: u64,
    pub end_ms: u64,
}

impl TranscriptResult {
    pub fn duration_seconds(&self) -> f64 {
        self.audio_duration_ms as f64 / 1000.0
    }

    /// Rough provider cost for this audio
    pub fn estimated_cost_usd(&self) -> f64 {
        self.duration_seconds() * COST_PER_SECOND_USD
    }

    /// Multi-line echo of the transcript for operator verification
    pub fn raw_report(&self) -> String {
        let mut report = format!(
            "Duration: {:.2} seconds\nConfidence: {:.2}%\nWord count: {}\n\nFull Transcript:\n{}",
            self.duration_seconds(),
            self.confidence * 100.0,
            self.word_count,
            self.text
        );

        if !self.utterances.is_empty() {
            report.push_str("\n\nSpeaker-Separated Transcript:");
            for utterance in &self.utterances {
                report.push_str(&format!("\n[Speaker {}]: {}", utterance.speaker, utterance.text));
            }
        }

        report
    }
}

/// A remote speech-to-text backend.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Transcribe the audio file at `audio_path`. The file is left in place.
    async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptResult>;
}

/// Build a transcription provider from runtime settings.
pub fn build_provider(settings: &Settings) -> Result<Box<dyn TranscriptionProvider>> {
    match settings.transcription.provider.to_lowercase().as_str() {
        "assemblyai" => Ok(Box::new(AssemblyAiClient::from_settings(settings)?)),
        other => anyhow::bail!(
            "Unsupported transcription.provider '{}'. Supported providers: assemblyai",
            other
        ),
    }
}
