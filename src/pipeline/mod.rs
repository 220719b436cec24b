//! Pipeline module for clinia
//!
//! Runs one consultation through transcription, extraction and optional
//! document rendering, then stores the session.

mod orchestrator;
mod state;
mod upload;

pub use orchestrator::{document_title, Pipeline, ProcessOptions, TranscriptProcessing};
pub use state::{FailureKind, PipelineRun, PipelineStage};
pub use upload::{sanitize_filename, AudioUpload, StagedAudio, UploadLimits};
