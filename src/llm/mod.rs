//! LLM module for clinia
//!
//! Extracts SOAP-structured data from transcripts using the Gemini API.

mod client;
mod extractor;
mod gemini;
pub mod parser;
pub mod prompts;

pub use client::{build_provider, GenerationConfig, LlmProvider};
pub use extractor::Extractor;
pub use gemini::GeminiClient;
pub use parser::FormatError;
