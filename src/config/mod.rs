//! Configuration module for clinia
//!
//! Handles loading and managing application settings from TOML files.

mod settings;

pub use settings::{
    DocsSettings, GeneralSettings, LlmSettings, ServerSettings, Settings, TranscriptionSettings,
    MIN_POLL_INTERVAL_MS,
};
