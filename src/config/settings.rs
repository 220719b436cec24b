//! Application settings management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const REDACTED: &str = "********";

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// General settings
    #[serde(default)]
    pub general: GeneralSettings,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Speech-to-text provider settings
    #[serde(default)]
    pub transcription: TranscriptionSettings,

    /// LLM extraction settings
    #[serde(default)]
    pub llm: LlmSettings,

    /// Document generation settings
    #[serde(default)]
    pub docs: DocsSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory where uploaded audio is staged while it is transcribed
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Accepted audio file extensions
    #[serde(default = "default_allowed_formats")]
    pub allowed_formats: Vec<String>,

    /// Transcripts shorter than this (after trimming) are rejected
    #[serde(default = "default_min_transcript_chars")]
    pub min_transcript_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upload size ceiling in megabytes
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,

    /// Origins allowed by CORS (empty = any)
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionSettings {
    /// Transcription provider (assemblyai)
    #[serde(default = "default_transcription_provider")]
    pub provider: String,

    /// API key
    #[serde(default)]
    pub api_key: String,

    /// API endpoint (empty = provider default)
    #[serde(default)]
    pub endpoint: String,

    /// Spoken language of the consultation
    #[serde(default = "default_language_code")]
    pub language_code: String,

    /// Ask the provider to add punctuation
    #[serde(default = "default_true")]
    pub punctuate: bool,

    /// Ask the provider to normalize casing and numbers
    #[serde(default = "default_true")]
    pub format_text: bool,

    /// Speaker diarization (doctor vs patient)
    #[serde(default = "default_true")]
    pub speaker_labels: bool,

    /// Delay between status polls while a transcript is processing
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// LLM provider (gemini)
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    /// API key
    #[serde(default)]
    pub api_key: String,

    /// Model name
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// API endpoint (empty = provider default)
    #[serde(default)]
    pub endpoint: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Total generation attempts before giving up on malformed output
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsSettings {
    /// Allow document creation at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Document copied for every new note
    #[serde(default = "default_template_id")]
    pub template_id: String,

    /// OAuth access token with documents and drive scopes
    #[serde(default)]
    pub access_token: String,

    /// Drive API endpoint (empty = provider default)
    #[serde(default)]
    pub drive_endpoint: String,

    /// Docs API endpoint (empty = provider default)
    #[serde(default)]
    pub docs_endpoint: String,
}

// Default value functions

fn default_log_level() -> String {
    "info".to_string()
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_allowed_formats() -> Vec<String> {
    ["wav", "mp3", "webm", "ogg", "m4a"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_min_transcript_chars() -> usize {
    10
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_upload_mb() -> u64 {
    50
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5000".to_string(),
    ]
}

fn default_transcription_provider() -> String {
    "assemblyai".to_string()
}

fn default_language_code() -> String {
    "es".to_string()
}

fn default_true() -> bool {
    true
}

/// Floor for the transcript status polling interval
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_llm_provider() -> String {
    "gemini".to_string()
}

fn default_llm_model() -> String {
    "gemini-flash-latest".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_top_p() -> f32 {
    0.95
}

fn default_top_k() -> u32 {
    40
}

fn default_max_output_tokens() -> u32 {
    2048
}

fn default_max_attempts() -> u32 {
    3
}

fn default_template_id() -> String {
    "1XVXnvw6JiAg1If3BUJtaAIrLdcpujAlovHVPyuUny1A".to_string()
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            temp_dir: default_temp_dir(),
            allowed_formats: default_allowed_formats(),
            min_transcript_chars: default_min_transcript_chars(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_mb: default_max_upload_mb(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            provider: default_transcription_provider(),
            api_key: String::new(),
            endpoint: String::new(),
            language_code: default_language_code(),
            punctuate: true,
            format_text: true,
            speaker_labels: true,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            api_key: String::new(),
            model: default_llm_model(),
            endpoint: String::new(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for DocsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            template_id: default_template_id(),
            access_token: String::new(),
            drive_endpoint: String::new(),
            docs_endpoint: String::new(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            server: ServerSettings::default(),
            transcription: TranscriptionSettings::default(),
            llm: LlmSettings::default(),
            docs: DocsSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from the configuration file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::debug!("No config file found, using defaults");
            let mut settings = Self::default();
            settings.apply_env_overrides();
            return Ok(settings);
        }

        let mut settings = Self::load_from(&config_path)?;
        settings.apply_env_overrides();

        Ok(settings)
    }

    /// Parse settings from an explicit file, without env overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        override_if_empty(
            &mut self.transcription.api_key,
            "CLINIA_ASSEMBLYAI_API_KEY",
        );
        override_if_empty(&mut self.llm.api_key, "CLINIA_GEMINI_API_KEY");
        override_if_empty(&mut self.docs.access_token, "CLINIA_GOOGLE_ACCESS_TOKEN");

        if let Ok(port) = std::env::var("PORT") {
            match port.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PORT value: {}", port),
            }
        }
    }

    /// Check that the providers every request needs are configured
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.transcription.api_key.trim().is_empty() {
            errors.push("transcription.api_key (or CLINIA_ASSEMBLYAI_API_KEY) is required");
        }
        if self.llm.api_key.trim().is_empty() {
            errors.push("llm.api_key (or CLINIA_GEMINI_API_KEY) is required");
        }
        if self.llm.max_attempts == 0 {
            errors.push("llm.max_attempts must be at least 1");
        }
        if self.transcription.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            errors.push("transcription.poll_interval_ms must be at least 100");
        }

        if !errors.is_empty() {
            anyhow::bail!("Configuration errors: {}", errors.join(", "));
        }

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "clinia", "clinia")
            .context("Could not determine config directory")?;

        let config_dir = dirs.config_dir();
        Ok(config_dir.join("config.toml"))
    }

    /// Write default configuration to a file
    pub fn write_default(path: &PathBuf) -> Result<()> {
        let settings = Self::default();
        let content = toml::to_string_pretty(&settings)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Copy with credentials masked, for display
    pub fn redacted(&self) -> Self {
        let mut settings = self.clone();
        for secret in [
            &mut settings.transcription.api_key,
            &mut settings.llm.api_key,
            &mut settings.docs.access_token,
        ] {
            if !secret.is_empty() {
                *secret = REDACTED.to_string();
            }
        }
        settings
    }

    /// Upload ceiling in bytes
    pub fn max_upload_bytes(&self) -> u64 {
        self.server.max_upload_mb * 1024 * 1024
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Ensure the upload staging directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.general.temp_dir)?;
        Ok(())
    }
}

fn override_if_empty(target: &mut String, var: &str) {
    if !target.trim().is_empty() {
        return;
    }
    if let Ok(value) = std::env::var(var) {
        if !value.trim().is_empty() {
            *target = value;
        }
    }
}
