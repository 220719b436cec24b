//! End-to-end processing of one consultation

use anyhow::Context;
use chrono::Local;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Settings;
use crate::docs::{self, DocumentInfo, DocumentRenderer};
use crate::llm::{self, Extractor};
use crate::pipeline::state::{FailureKind, PipelineRun, PipelineStage};
use crate::pipeline::upload::{AudioUpload, StagedAudio, UploadLimits};
use crate::record::{self, ClinicalRecord};
use crate::storage::{
    InMemorySessionStore, SessionRecord, SessionStatus, SessionStore, StructuredExport,
    TranscriptSummary,
};
use crate::transcription::{self, TranscriptResult, TranscriptionProvider};
use crate::{CliniaError, Result};

const DEFAULT_PATIENT: &str = "Paciente";

/// Per-request switches for `Pipeline::process_audio`
#[derive(Debug, Clone, Copy)]
pub struct ProcessOptions {
    /// Log the full transcript with per-speaker utterances
    pub emit_raw_transcript: bool,
    pub create_document: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            emit_raw_transcript: true,
            create_document: true,
        }
    }
}

/// Result of running extraction on a transcript that was supplied directly
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptProcessing {
    pub status: SessionStatus,
    pub structured_data: ClinicalRecord,
    pub document: Option<DocumentInfo>,
}

pub struct Pipeline {
    transcriber: Arc<dyn TranscriptionProvider>,
    extractor: Extractor,
    renderer: Option<DocumentRenderer>,
    sessions: Arc<dyn SessionStore>,
    limits: UploadLimits,
}

impl Pipeline {
    pub fn new(
        transcriber: Arc<dyn TranscriptionProvider>,
        extractor: Extractor,
        renderer: Option<DocumentRenderer>,
        sessions: Arc<dyn SessionStore>,
        limits: UploadLimits,
    ) -> Self {
        Self {
            transcriber,
            extractor,
            renderer,
            sessions,
            limits,
        }
    }

    /// Wire up the configured providers with an in-memory session store.
    ///
    /// Document generation is optional: when it is disabled or cannot be
    /// configured, requests that ask for a document get an inline failure.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        settings.validate()?;

        let transcriber: Arc<dyn TranscriptionProvider> = Arc::from(
            transcription::build_provider(settings).context("Transcription provider")?,
        );
        let llm: Arc<dyn llm::LlmProvider> =
            Arc::from(llm::build_provider(settings).context("LLM provider")?);

        let renderer = if settings.docs.enabled {
            match docs::build_provider(settings) {
                Ok(provider) => Some(DocumentRenderer::from_settings(
                    Arc::from(provider),
                    settings,
                )),
                Err(e) => {
                    warn!("Document generation unavailable: {:#}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self::new(
            transcriber,
            Extractor::from_settings(llm, settings),
            renderer,
            Arc::new(InMemorySessionStore::new()),
            UploadLimits::from_settings(settings),
        ))
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    pub fn documents_enabled(&self) -> bool {
        self.renderer.is_some()
    }

    /// Transcribe, extract, optionally render, and store one consultation.
    pub async fn process_audio(
        &self,
        upload: AudioUpload,
        options: ProcessOptions,
    ) -> Result<Arc<SessionRecord>> {
        let mut run = PipelineRun::new();
        info!("Processing audio: {}", upload.filename);

        let transcript = self.transcribe_upload(&mut run, &upload).await?;

        if options.emit_raw_transcript {
            info!("\n{}", transcript.raw_report());
        }
        info!(
            "Transcription complete: {} words, {:.1}s, ~${:.4}",
            transcript.word_count,
            transcript.duration_seconds(),
            transcript.estimated_cost_usd()
        );

        if !self.limits.transcript_is_usable(&transcript.text) {
            return Err(run.fail(
                FailureKind::Validation,
                CliniaError::Validation("Transcription too short or empty".to_string()),
            ));
        }

        let structured = self.extract(&mut run, &transcript.text).await?;
        let document = self
            .maybe_render(&mut run, &structured, options.create_document)
            .await?;
        run.advance(PipelineStage::Completed)?;

        let summary = TranscriptSummary::from(&transcript);
        let session = SessionRecord::new(summary, structured, document);
        let stored = self.sessions.insert(session).await?;
        info!("Session stored: {}", stored.session_id);
        Ok(stored)
    }

    /// Transcribe an upload without extraction or storage.
    pub async fn transcribe_only(
        &self,
        upload: AudioUpload,
        emit_raw_transcript: bool,
    ) -> Result<TranscriptResult> {
        let mut run = PipelineRun::new();
        let transcript = self.transcribe_upload(&mut run, &upload).await?;
        if emit_raw_transcript {
            info!("\n{}", transcript.raw_report());
        }
        Ok(transcript)
    }

    /// Extract (and optionally render) from a transcript supplied as text.
    pub async fn process_transcript(
        &self,
        transcript: &str,
        create_document: bool,
    ) -> Result<TranscriptProcessing> {
        if transcript.trim().is_empty() {
            return Err(CliniaError::Validation("No transcript provided".to_string()));
        }

        let mut run = PipelineRun::new();
        run.advance(PipelineStage::Transcribing)?;
        run.advance(PipelineStage::Transcribed)?;

        let structured = self.extract(&mut run, transcript).await?;
        let document = self.maybe_render(&mut run, &structured, create_document).await?;
        run.advance(PipelineStage::Completed)?;

        Ok(TranscriptProcessing {
            status: SessionStatus::Success,
            structured_data: structured,
            document,
        })
    }

    pub async fn session(&self, session_id: &str) -> Result<Arc<SessionRecord>> {
        self.sessions.require(session_id).await
    }

    pub async fn export(&self, session_id: &str) -> Result<StructuredExport> {
        self.sessions.export(session_id).await
    }

    async fn transcribe_upload(
        &self,
        run: &mut PipelineRun,
        upload: &AudioUpload,
    ) -> Result<TranscriptResult> {
        if let Err(e) = self.limits.check(upload) {
            return Err(run.fail(FailureKind::Validation, e));
        }

        let staged = StagedAudio::stage(&self.limits.temp_dir, upload)?;
        run.advance(PipelineStage::Transcribing)?;

        // `staged` is dropped (and deleted) on the error path
        let transcript = match self.transcriber.transcribe(staged.path()).await {
            Ok(transcript) => transcript,
            Err(e) => {
                return Err(run.fail(
                    FailureKind::Transcription,
                    CliniaError::Transcription(format!("{:#}", e)),
                ))
            }
        };
        staged.remove()?;

        run.advance(PipelineStage::Transcribed)?;
        Ok(transcript)
    }

    async fn extract(&self, run: &mut PipelineRun, transcript: &str) -> Result<ClinicalRecord> {
        run.advance(PipelineStage::Extracting)?;
        let structured = match self.extractor.extract(transcript).await {
            Ok(structured) => structured,
            Err(e) => return Err(run.fail(FailureKind::Extraction, e)),
        };
        run.advance(PipelineStage::Extracted)?;

        if let Err(violation) = record::validate(&structured) {
            warn!("Data validation failed: {}", violation);
        }
        Ok(structured)
    }

    async fn maybe_render(
        &self,
        run: &mut PipelineRun,
        structured: &ClinicalRecord,
        requested: bool,
    ) -> Result<Option<DocumentInfo>> {
        if !requested {
            return Ok(None);
        }
        run.advance(PipelineStage::Rendering)?;

        let Some(renderer) = &self.renderer else {
            warn!("Document requested but document generation is not configured");
            return Ok(Some(DocumentInfo::failed(
                "Document generation is not configured",
            )));
        };

        let title = document_title(structured);
        match renderer.render(structured, Some(&title)).await {
            Ok(info) => {
                run.advance(PipelineStage::Rendered)?;
                Ok(Some(info))
            }
            Err(e) => {
                warn!("Document creation failed: {}", e);
                Ok(Some(DocumentInfo::failed(e.to_string())))
            }
        }
    }
}

/// Title for documents created by the pipeline
pub fn document_title(structured: &ClinicalRecord) -> String {
    format!(
        "ClinIA - {} - {}",
        structured.patient_name().unwrap_or(DEFAULT_PATIENT),
        Local::now().format("%Y-%m-%d %H:%M")
    )
}
