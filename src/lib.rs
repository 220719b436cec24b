//! clinia - Turns recorded medical consultations into structured SOAP notes
//!
//! Audio goes to a transcription provider, the transcript goes to an LLM for
//! structured extraction, and the result can be written into a document.

pub mod cli;
pub mod config;
pub mod docs;
pub mod llm;
pub mod pipeline;
pub mod record;
pub mod server;
pub mod storage;
pub mod transcription;

use thiserror::Error;

/// Main error type for clinia
#[derive(Error, Debug)]
pub enum CliniaError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("File too large (limit {limit_bytes} bytes)")]
    PayloadTooLarge { limit_bytes: u64 },

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Document error: {0}")]
    Document(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CliniaError>;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "clinia";

/// Human-facing service name reported by the health endpoint
pub const SERVICE_NAME: &str = "ClinIA";
