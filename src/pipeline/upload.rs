//! Upload checks and scoped staging of audio on disk

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::config::Settings;
use crate::{CliniaError, Result};

/// An uploaded audio artifact
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub filename: String,
    pub data: Vec<u8>,
}

impl AudioUpload {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }
}

/// Limits applied to every upload before any remote call
#[derive(Debug, Clone)]
pub struct UploadLimits {
    pub temp_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub allowed_formats: Vec<String>,
    pub min_transcript_chars: usize,
}

impl UploadLimits {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            temp_dir: settings.general.temp_dir.clone(),
            max_upload_bytes: settings.max_upload_bytes(),
            allowed_formats: settings.general.allowed_formats.clone(),
            min_transcript_chars: settings.general.min_transcript_chars,
        }
    }

    pub fn check(&self, upload: &AudioUpload) -> Result<()> {
        if upload.filename.trim().is_empty() {
            return Err(CliniaError::Validation("Empty filename".to_string()));
        }
        if upload.data.is_empty() {
            return Err(CliniaError::Validation("No audio file provided".to_string()));
        }
        if upload.data.len() as u64 > self.max_upload_bytes {
            return Err(CliniaError::PayloadTooLarge {
                limit_bytes: self.max_upload_bytes,
            });
        }

        let extension = Path::new(&sanitize_filename(&upload.filename))
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if !self.allowed_formats.iter().any(|f| f.eq_ignore_ascii_case(&extension)) {
            return Err(CliniaError::Validation(format!(
                "Unsupported audio format '{}'. Allowed: {}",
                extension,
                self.allowed_formats.join(", ")
            )));
        }

        Ok(())
    }

    /// Whether a transcript has enough content to be worth extracting
    pub fn transcript_is_usable(&self, text: &str) -> bool {
        text.trim().chars().count() >= self.min_transcript_chars
    }
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Audio written to a uniquely named temp file.
///
/// The file is deleted when this value is dropped, so every exit path of the
/// request removes it; `remove` does the same but reports failures.
#[derive(Debug)]
pub struct StagedAudio {
    file: NamedTempFile,
}

impl StagedAudio {
    pub fn stage(dir: &Path, upload: &AudioUpload) -> Result<Self> {
        std::fs::create_dir_all(dir)?;

        let suffix = format!("_{}", sanitize_filename(&upload.filename));
        let mut file = tempfile::Builder::new()
            .prefix("clinia_")
            .suffix(&suffix)
            .tempfile_in(dir)?;
        file.write_all(&upload.data)?;
        file.flush()?;

        tracing::info!(
            "Audio saved to: {} ({:.2} MB)",
            file.path().display(),
            upload.data.len() as f64 / (1024.0 * 1024.0)
        );

        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn remove(self) -> Result<()> {
        let path = self.file.path().to_path_buf();
        self.file.close()?;
        tracing::debug!("Cleaned up temp file: {}", path.display());
        Ok(())
    }
}

/// Reduce a client-supplied filename to a safe ASCII basename.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}
