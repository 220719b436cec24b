use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::docs::builder::DocumentOperation;
use crate::docs::google::GoogleDocsClient;

/// Structural element of a document body, as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralElement {
    #[serde(default)]
    pub start_index: Option<u32>,
    pub end_index: u32,
}

/// Body of an existing document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentContent {
    pub elements: Vec<StructuralElement>,
}

impl DocumentContent {
    /// Index just before the final newline of the body, where new text goes
    pub fn insertion_index(&self) -> u32 {
        self.elements
            .last()
            .map(|e| e.end_index.saturating_sub(1))
            .unwrap_or(1)
            .max(1)
    }
}

/// Outcome of document creation, embedded in the pipeline response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentInfo {
    Created {
        document_id: String,
        link: String,
        title: String,
    },
    Failed {
        error: String,
        details: String,
    },
}

impl DocumentInfo {
    pub fn failed(details: impl Into<String>) -> Self {
        Self::Failed {
            error: "Failed to create Google Doc".to_string(),
            details: details.into(),
        }
    }

    pub fn link(&self) -> Option<&str> {
        match self {
            Self::Created { link, .. } => Some(link),
            Self::Failed { .. } => None,
        }
    }
}

/// A remote document service that can copy a template and apply batch edits.
#[async_trait]
pub trait DocumentProvider: Send + Sync {
    /// Copy `template_id` under `name`, returning the new document id.
    async fn copy_template(&self, template_id: &str, name: &str) -> Result<String>;

    async fn get_document(&self, document_id: &str) -> Result<DocumentContent>;

    async fn batch_update(&self, document_id: &str, operations: &[DocumentOperation])
        -> Result<()>;

    /// Shareable link for a document id
    fn document_link(&self, document_id: &str) -> String;
}

/// Build a document provider from runtime settings.
pub fn build_provider(settings: &Settings) -> Result<Box<dyn DocumentProvider>> {
    Ok(Box::new(GoogleDocsClient::from_settings(settings)?))
}
