//! Data models for storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::docs::DocumentInfo;
use crate::record::ClinicalRecord;
use crate::transcription::TranscriptResult;

/// Outcome reported to the caller for a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Success,
}

/// Transcript fields echoed in the response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSummary {
    pub text: String,
    pub confidence: f64,
    pub duration_seconds: f64,
    pub word_count: usize,
}

impl From<&TranscriptResult> for TranscriptSummary {
    fn from(result: &TranscriptResult) -> Self {
        Self {
            text: result.text.clone(),
            confidence: result.confidence,
            duration_seconds: result.duration_seconds(),
            word_count: result.word_count,
        }
    }
}

/// Everything one pipeline run produced. Never mutated after it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub status: SessionStatus,
    pub timestamp: DateTime<Utc>,
    pub transcript: TranscriptSummary,
    pub structured_data: ClinicalRecord,
    pub document: Option<DocumentInfo>,
}

impl SessionRecord {
    pub fn new(
        transcript: TranscriptSummary,
        structured_data: ClinicalRecord,
        document: Option<DocumentInfo>,
    ) -> Self {
        Self {
            session_id: new_session_id(),
            status: SessionStatus::Success,
            timestamp: Utc::now(),
            transcript,
            structured_data,
            document,
        }
    }

    /// Structured data as a standalone downloadable JSON document
    pub fn export(&self) -> serde_json::Result<StructuredExport> {
        Ok(StructuredExport {
            file_name: export_file_name(&self.session_id),
            body: serde_json::to_string_pretty(&self.structured_data)?,
        })
    }
}

/// Downloadable copy of a session's structured data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredExport {
    pub file_name: String,
    pub body: String,
}

pub fn new_session_id() -> String {
    format!("session_{}", uuid::Uuid::new_v4().simple())
}

pub fn export_file_name(session_id: &str) -> String {
    format!("clinia_{}.json", session_id)
}
