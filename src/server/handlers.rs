//! Request handlers for the ClinIA API

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Local;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::pipeline::{AudioUpload, ProcessOptions, TranscriptProcessing};
use crate::server::error::{multipart_error, multipart_rejection};
use crate::server::AppState;
use crate::storage::SessionRecord;
use crate::{CliniaError, Result, SERVICE_NAME, VERSION};

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": VERSION,
        "timestamp": Local::now().to_rfc3339(),
    }))
}

/// Full pipeline: multipart `audio` plus optional `print_raw` / `create_doc` flags
pub async fn process_audio(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<SessionRecord>> {
    let form = read_audio_form(multipart.map_err(multipart_rejection)?, &state).await?;
    info!(
        "New processing job: {} (print_raw={}, create_doc={})",
        form.upload.filename, form.print_raw, form.create_doc
    );

    let options = ProcessOptions {
        emit_raw_transcript: form.print_raw,
        create_document: form.create_doc,
    };
    let session = state.pipeline.process_audio(form.upload, options).await?;
    Ok(Json(session.as_ref().clone()))
}

pub async fn transcribe_only(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>> {
    let form = read_audio_form(multipart.map_err(multipart_rejection)?, &state).await?;
    let transcript = state
        .pipeline
        .transcribe_only(form.upload, form.print_raw)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "transcript": transcript,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ProcessTranscriptRequest {
    pub transcript: Option<String>,
    #[serde(default)]
    pub create_doc: bool,
}

pub async fn process_transcript(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ProcessTranscriptRequest>, JsonRejection>,
) -> Result<Json<TranscriptProcessing>> {
    let Json(request) = payload.map_err(|e| CliniaError::Validation(e.body_text()))?;
    let transcript = request
        .transcript
        .ok_or_else(|| CliniaError::Validation("No transcript provided".to_string()))?;

    let processed = state
        .pipeline
        .process_transcript(&transcript, request.create_doc)
        .await?;
    Ok(Json(processed))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionRecord>> {
    let session = state.pipeline.session(&session_id).await?;
    Ok(Json(session.as_ref().clone()))
}

pub async fn export_json(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse> {
    let export = state.pipeline.export(&session_id).await?;
    let disposition = format!("attachment; filename={}", export.file_name);

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.body,
    ))
}

struct AudioForm {
    upload: AudioUpload,
    print_raw: bool,
    create_doc: bool,
}

async fn read_audio_form(mut multipart: Multipart, state: &AppState) -> Result<AudioForm> {
    let limit = state.pipeline.limits().max_upload_bytes;
    let mut upload = None;
    let mut print_raw = true;
    let mut create_doc = true;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
                upload = Some(AudioUpload::new(filename, data.to_vec()));
            }
            "print_raw" | "create_doc" => {
                let value = field.text().await.map_err(|e| multipart_error(e, limit))?;
                if name == "print_raw" {
                    print_raw = parse_flag(&value);
                } else {
                    create_doc = parse_flag(&value);
                }
            }
            _ => {}
        }
    }

    let upload =
        upload.ok_or_else(|| CliniaError::Validation("No audio file provided".to_string()))?;
    Ok(AudioForm {
        upload,
        print_raw,
        create_doc,
    })
}

/// Form flags are true only when spelled `true` (any case)
fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}
