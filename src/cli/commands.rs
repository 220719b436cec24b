//! CLI command implementations

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::args::ConfigCommand;
use crate::config::Settings;
use crate::docs::{self, DocumentInfo, DocumentRenderer};
use crate::llm::{self, Extractor};
use crate::pipeline::{document_title, AudioUpload, Pipeline, ProcessOptions, TranscriptProcessing};
use crate::record;
use crate::storage::SessionStatus;

/// Run the HTTP API in the foreground
pub async fn serve(settings: &Settings, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut settings = settings.clone();
    if let Some(host) = host {
        settings.server.host = host;
    }
    if let Some(port) = port {
        settings.server.port = port;
    }

    crate::server::serve(&settings).await
}

/// Process one audio file end to end and print the session
pub async fn process_audio(
    settings: &Settings,
    audio: &Path,
    no_document: bool,
    raw_transcript: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let data = std::fs::read(audio)
        .with_context(|| format!("Failed to read audio file: {}", audio.display()))?;
    let filename = audio
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    settings.ensure_dirs()?;
    let pipeline = Pipeline::from_settings(settings)?;

    let options = ProcessOptions {
        emit_raw_transcript: raw_transcript,
        create_document: !no_document,
    };
    let session = pipeline
        .process_audio(AudioUpload::new(filename, data), options)
        .await?;

    write_output(&serde_json::to_string_pretty(session.as_ref())?, output)?;
    report_document(session.document.as_ref());

    Ok(())
}

/// Extract a record from a transcript file, optionally creating a document
pub async fn extract_transcript(settings: &Settings, path: &Path, document: bool) -> Result<()> {
    let transcript = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transcript: {}", path.display()))?;
    if transcript.trim().is_empty() {
        anyhow::bail!("Transcript file is empty: {}", path.display());
    }

    let provider: Arc<dyn llm::LlmProvider> = Arc::from(llm::build_provider(settings)?);
    let extractor = Extractor::from_settings(provider, settings);
    let structured = extractor.extract(&transcript).await?;

    if let Err(violation) = record::validate(&structured) {
        tracing::warn!("Data validation failed: {}", violation);
    }

    let document = if document {
        Some(create_document(settings, &structured).await)
    } else {
        None
    };
    report_document(document.as_ref());

    let processed = TranscriptProcessing {
        status: SessionStatus::Success,
        structured_data: structured,
        document,
    };
    println!("{}", serde_json::to_string_pretty(&processed)?);

    Ok(())
}

async fn create_document(settings: &Settings, structured: &record::ClinicalRecord) -> DocumentInfo {
    let provider = match docs::build_provider(settings) {
        Ok(provider) => provider,
        Err(e) => return DocumentInfo::failed(format!("{:#}", e)),
    };

    let renderer = DocumentRenderer::from_settings(Arc::from(provider), settings);
    let title = document_title(structured);
    match renderer.render(structured, Some(&title)).await {
        Ok(info) => info,
        Err(e) => DocumentInfo::failed(e.to_string()),
    }
}

fn report_document(document: Option<&DocumentInfo>) {
    match document {
        Some(DocumentInfo::Created { link, .. }) => eprintln!("Document: {}", link),
        Some(DocumentInfo::Failed { details, .. }) => {
            eprintln!("Document was not created: {}", details)
        }
        None => {}
    }
}

fn write_output(content: &str, output: Option<PathBuf>) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("Saved to: {}", path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

/// Handle config subcommands
pub fn config_command(settings: &Settings, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let toml = toml::to_string_pretty(&settings.redacted())?;
            println!("{}", toml);
        }
        ConfigCommand::Path => {
            let path = Settings::config_path()?;
            println!("{}", path.display());
        }
        ConfigCommand::Init { force } => {
            let path = Settings::config_path()?;
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            Settings::write_default(&path)?;
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: &'static str,
    detail: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    config_path: Option<String>,
    config_exists: bool,
    checks: Vec<DoctorCheck>,
    notes: Vec<String>,
}

/// Report which providers are configured. Never fails on missing keys.
pub async fn run_doctor(settings: &Settings, json: bool) -> Result<()> {
    let report = collect_doctor_report(settings);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("clinia doctor");
    match &report.config_path {
        Some(path) if report.config_exists => println!("config: {}", path),
        Some(path) => println!("config: {} (not found, using defaults)", path),
        None => println!("config: unavailable"),
    }
    println!();

    for check in &report.checks {
        println!("{:<14} {:<9} {}", check.name, check.status, check.detail);
    }

    if !report.notes.is_empty() {
        println!();
        for note in &report.notes {
            println!("{}", note);
        }
    }

    Ok(())
}

fn collect_doctor_report(settings: &Settings) -> DoctorReport {
    let config_path = Settings::config_path().ok();
    let config_exists = config_path.as_ref().is_some_and(|path| path.exists());

    let transcription_ok = !settings.transcription.api_key.trim().is_empty();
    let llm_ok = !settings.llm.api_key.trim().is_empty();
    let docs_token = !settings.docs.access_token.trim().is_empty();
    let temp_ok = tempfile::tempfile_in(&settings.general.temp_dir).is_ok();

    let mut notes = Vec::new();
    if !transcription_ok || !llm_ok {
        notes.push(
            "warning: `clinia serve` and `clinia process` need both transcription and LLM keys."
                .to_string(),
        );
    }
    if settings.docs.enabled && !docs_token {
        notes.push(
            "info: documents will be reported as failed until CLINIA_GOOGLE_ACCESS_TOKEN is set."
                .to_string(),
        );
    }

    let docs_status = match (settings.docs.enabled, docs_token) {
        (false, _) => "disabled",
        (true, true) => "ok",
        (true, false) => "missing",
    };

    DoctorReport {
        config_path: config_path.map(|path| path.display().to_string()),
        config_exists,
        checks: vec![
            DoctorCheck {
                name: "transcription",
                status: key_status(transcription_ok),
                detail: format!("{} API key", settings.transcription.provider),
            },
            DoctorCheck {
                name: "llm",
                status: key_status(llm_ok),
                detail: format!("{} ({})", settings.llm.provider, settings.llm.model),
            },
            DoctorCheck {
                name: "docs",
                status: docs_status,
                detail: format!("template {}", settings.docs.template_id),
            },
            DoctorCheck {
                name: "temp_dir",
                status: if temp_ok { "ok" } else { "error" },
                detail: settings.general.temp_dir.display().to_string(),
            },
        ],
        notes,
    }
}

fn key_status(present: bool) -> &'static str {
    if present {
        "ok"
    } else {
        "missing"
    }
}
