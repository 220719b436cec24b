//! Per-request pipeline state machine

use tracing::debug;

use crate::{CliniaError, Result};

/// Stage that caused a run to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    Transcription,
    Extraction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Transcribing,
    Transcribed,
    Extracting,
    Extracted,
    Rendering,
    Rendered,
    Completed,
    Failed(FailureKind),
}

impl PipelineStage {
    /// Whether `next` is a legal successor of this stage.
    ///
    /// Rendering may go straight to `Completed`: a render failure is embedded
    /// in the response rather than failing the run.
    pub fn can_advance_to(self, next: PipelineStage) -> bool {
        use FailureKind as F;
        use PipelineStage::*;

        matches!(
            (self, next),
            (Received, Transcribing)
                | (Received, Failed(F::Validation))
                | (Transcribing, Transcribed)
                | (Transcribing, Failed(F::Transcription))
                | (Transcribed, Extracting)
                | (Transcribed, Failed(F::Validation))
                | (Extracting, Extracted)
                | (Extracting, Failed(F::Extraction))
                | (Extracted, Rendering)
                | (Extracted, Completed)
                | (Rendering, Rendered)
                | (Rendering, Completed)
                | (Rendered, Completed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineStage::Completed | PipelineStage::Failed(_))
    }
}

/// Tracks the stages one request has passed through
#[derive(Debug, Clone)]
pub struct PipelineRun {
    history: Vec<PipelineStage>,
}

impl PipelineRun {
    pub fn new() -> Self {
        Self {
            history: vec![PipelineStage::Received],
        }
    }

    pub fn stage(&self) -> PipelineStage {
        *self
            .history
            .last()
            .unwrap_or(&PipelineStage::Received)
    }

    pub fn history(&self) -> &[PipelineStage] {
        &self.history
    }

    pub fn advance(&mut self, next: PipelineStage) -> Result<()> {
        let current = self.stage();
        if !current.can_advance_to(next) {
            return Err(CliniaError::Other(format!(
                "Illegal pipeline transition {:?} -> {:?}",
                current, next
            )));
        }
        debug!("Pipeline stage {:?} -> {:?}", current, next);
        self.history.push(next);
        Ok(())
    }

    /// Move to `Failed(kind)`, returning `error` for the caller to propagate.
    pub fn fail(&mut self, kind: FailureKind, error: CliniaError) -> CliniaError {
        if let Err(e) = self.advance(PipelineStage::Failed(kind)) {
            tracing::warn!("{}", e);
        }
        error
    }
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}
