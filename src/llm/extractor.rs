//! Structured extraction with bounded retry on malformed output

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::llm::client::{GenerationConfig, LlmProvider};
use crate::llm::parser::{self, FormatError};
use crate::llm::prompts::{build_extraction_prompt, prompt_for_attempt};
use crate::record::ClinicalRecord;
use crate::{CliniaError, Result};

const PREVIEW_CHARS: usize = 500;

/// Turns transcripts into clinical records through an LLM provider.
///
/// Malformed responses are retried up to `max_attempts` total calls. When every
/// attempt fails to parse, the result is an error-marked record carrying the
/// last raw response; only provider failures surface as `CliniaError::Llm`.
pub struct Extractor {
    provider: Arc<dyn LlmProvider>,
    generation: GenerationConfig,
    max_attempts: u32,
}

impl Extractor {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        generation: GenerationConfig,
        max_attempts: u32,
    ) -> Self {
        Self {
            provider,
            generation,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_settings(provider: Arc<dyn LlmProvider>, settings: &Settings) -> Self {
        Self::new(
            provider,
            GenerationConfig::from_settings(&settings.llm),
            settings.llm.max_attempts,
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Extract a clinical record from a transcript.
    pub async fn extract(&self, transcript: &str) -> Result<ClinicalRecord> {
        info!("Extracting structured data ({} chars)", transcript.len());

        let base_prompt = build_extraction_prompt(transcript);
        let mut last_raw = String::new();

        for attempt in 1..=self.max_attempts {
            let prompt = prompt_for_attempt(&base_prompt, attempt);

            let raw = self
                .provider
                .generate(&prompt, &self.generation)
                .await
                .map_err(|e| CliniaError::Llm(format!("{:#}", e)))?;

            debug!(
                "Raw response (attempt {}/{}): {}",
                attempt,
                self.max_attempts,
                preview(&raw)
            );

            match parse_record(&raw) {
                Ok(record) => {
                    info!("Structured data extracted on attempt {}", attempt);
                    return Ok(record);
                }
                Err(e) => {
                    warn!(
                        "Unusable model output on attempt {}/{}: {}",
                        attempt, self.max_attempts, e
                    );
                    last_raw = raw;
                }
            }
        }

        warn!(
            "All {} extraction attempts failed, returning error record",
            self.max_attempts
        );
        Ok(ClinicalRecord::extraction_failed(last_raw))
    }
}

fn parse_record(raw: &str) -> std::result::Result<ClinicalRecord, FormatError> {
    let value = parser::parse(raw)?;
    ClinicalRecord::from_model_output(value).map_err(FormatError::Schema)
}

fn preview(raw: &str) -> String {
    if raw.chars().count() > PREVIEW_CHARS {
        let head: String = raw.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        raw.to_string()
    }
}
