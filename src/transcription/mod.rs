//! Transcription module for clinia
//!
//! Speech-to-text through a remote provider (AssemblyAI).

mod assemblyai;
mod client;

pub use assemblyai::AssemblyAiClient;
pub use client::{
    build_provider, TranscriptResult, TranscriptionOptions, TranscriptionProvider, Utterance,
};
