//! Google Drive / Docs REST client

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::docs::builder::DocumentOperation;
use crate::docs::client::{DocumentContent, DocumentProvider, StructuralElement};

const DEFAULT_DRIVE_ENDPOINT: &str = "https://www.googleapis.com/drive/v3";
const DEFAULT_DOCS_ENDPOINT: &str = "https://docs.googleapis.com/v1";

pub struct GoogleDocsClient {
    http: Client,
    access_token: String,
    drive_endpoint: String,
    docs_endpoint: String,
}

impl GoogleDocsClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let access_token = settings.docs.access_token.trim().to_string();
        if access_token.is_empty() {
            anyhow::bail!(
                "Google access token is missing. Set docs.access_token in config or CLINIA_GOOGLE_ACCESS_TOKEN."
            );
        }

        Ok(Self {
            http: Client::builder()
                .timeout(std::time::Duration::from_secs(45))
                .build()
                .context("Failed to build Google Docs HTTP client")?,
            access_token,
            drive_endpoint: endpoint_or(&settings.docs.drive_endpoint, DEFAULT_DRIVE_ENDPOINT),
            docs_endpoint: endpoint_or(&settings.docs.docs_endpoint, DEFAULT_DOCS_ENDPOINT),
        })
    }
}

fn endpoint_or(configured: &str, default: &str) -> String {
    let trimmed = configured.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl DocumentProvider for GoogleDocsClient {
    async fn copy_template(&self, template_id: &str, name: &str) -> Result<String> {
        let copied: CopyResponse = self
            .http
            .post(format!("{}/files/{}/copy", self.drive_endpoint, template_id))
            .bearer_auth(&self.access_token)
            .json(&CopyRequest { name })
            .send()
            .await
            .context("Drive copy request failed")?
            .error_for_status()
            .context("Drive copy returned an error status")?
            .json()
            .await
            .context("Failed to parse Drive copy response")?;

        Ok(copied.id)
    }

    async fn get_document(&self, document_id: &str) -> Result<DocumentContent> {
        let document: DocumentResponse = self
            .http
            .get(format!("{}/documents/{}", self.docs_endpoint, document_id))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .context("Docs get request failed")?
            .error_for_status()
            .context("Docs get returned an error status")?
            .json()
            .await
            .context("Failed to parse Docs document")?;

        Ok(DocumentContent {
            elements: document.body.map(|b| b.content).unwrap_or_default(),
        })
    }

    async fn batch_update(
        &self,
        document_id: &str,
        operations: &[DocumentOperation],
    ) -> Result<()> {
        self.http
            .post(format!(
                "{}/documents/{}:batchUpdate",
                self.docs_endpoint, document_id
            ))
            .bearer_auth(&self.access_token)
            .json(&BatchUpdateRequest {
                requests: operations,
            })
            .send()
            .await
            .context("Docs batchUpdate request failed")?
            .error_for_status()
            .context("Docs batchUpdate returned an error status")?;

        Ok(())
    }

    fn document_link(&self, document_id: &str) -> String {
        format!("https://docs.google.com/document/d/{}/edit", document_id)
    }
}

#[derive(Debug, Serialize)]
struct CopyRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct CopyResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DocumentResponse {
    #[serde(default)]
    body: Option<DocumentBody>,
}

#[derive(Debug, Deserialize)]
struct DocumentBody {
    #[serde(default)]
    content: Vec<StructuralElement>,
}

#[derive(Debug, Serialize)]
struct BatchUpdateRequest<'a> {
    requests: &'a [DocumentOperation],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_token_is_rejected() {
        let err = match GoogleDocsClient::from_settings(&Settings::default()) {
            Ok(_) => panic!("expected client creation to fail"),
            Err(e) => e.to_string(),
        };
        assert!(err.contains("Google access token is missing"));
    }

    #[test]
    fn document_body_reads_end_indexes() {
        let document: DocumentResponse = serde_json::from_str(
            r#"{"documentId":"d1","body":{"content":[
                {"endIndex":1,"sectionBreak":{}},
                {"startIndex":1,"endIndex":33,"paragraph":{"elements":[]}}
            ]}}"#,
        )
        .unwrap();

        let content = DocumentContent {
            elements: document.body.unwrap().content,
        };
        assert_eq!(content.insertion_index(), 32);
    }

    #[test]
    fn endpoints_fall_back_to_defaults() {
        assert_eq!(endpoint_or("  ", DEFAULT_DOCS_ENDPOINT), DEFAULT_DOCS_ENDPOINT);
        assert_eq!(
            endpoint_or("http://localhost:8080/v1/", DEFAULT_DOCS_ENDPOINT),
            "http://localhost:8080/v1"
        );
    }
}
