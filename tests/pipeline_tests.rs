mod common;

use std::sync::Arc;

use clinia::docs::DocumentInfo;
use clinia::pipeline::{AudioUpload, ProcessOptions};
use clinia::record::ClinicalRecord;
use clinia::CliniaError;

use common::{
    build_pipeline, limits, staged_files, FailingDocs, RecordingDocs, ScriptedLlm,
    StubTranscriber, UnreachableLlm, HEADACHE_RESPONSE, HEADACHE_TRANSCRIPT,
};

fn wav() -> AudioUpload {
    AudioUpload::new("consulta.wav", b"RIFF....WAVEfmt ".to_vec())
}

fn no_document() -> ProcessOptions {
    ProcessOptions {
        emit_raw_transcript: false,
        create_document: false,
    }
}

#[tokio::test]
async fn headache_consultation_without_document() {
    let tmp = tempfile::tempdir().unwrap();
    let transcriber = StubTranscriber::returning(HEADACHE_TRANSCRIPT);
    let llm = ScriptedLlm::new(&[HEADACHE_RESPONSE]);
    let pipeline = build_pipeline(transcriber.clone(), llm.clone(), None, limits(tmp.path()));

    let session = pipeline.process_audio(wav(), no_document()).await.unwrap();

    assert!(session.document.is_none());
    let subjective = session.structured_data.subjective.as_ref().unwrap();
    assert!(!subjective.is_empty());
    assert_eq!(session.transcript.text, HEADACHE_TRANSCRIPT);
    assert_eq!(session.transcript.duration_seconds, 4.0);
    assert_eq!(llm.calls(), 1);

    let json = serde_json::to_value(session.as_ref()).unwrap();
    assert!(json["document"].is_null());
    assert_eq!(json["status"], "success");
    assert!(json["structured_data"]["subjetivo"].is_object());
}

#[tokio::test]
async fn staged_audio_exists_during_transcription_and_is_removed_after() {
    let tmp = tempfile::tempdir().unwrap();
    let transcriber = StubTranscriber::returning(HEADACHE_TRANSCRIPT);
    let llm = ScriptedLlm::new(&[HEADACHE_RESPONSE]);
    let pipeline = build_pipeline(transcriber.clone(), llm, None, limits(tmp.path()));

    pipeline.process_audio(wav(), no_document()).await.unwrap();

    let seen = transcriber.seen();
    assert_eq!(seen.len(), 1);
    let (path, existed) = &seen[0];
    assert!(*existed, "audio should be on disk while transcribing");
    assert!(path.starts_with(tmp.path()));
    assert!(!path.exists());
    assert!(staged_files(tmp.path()).is_empty());
}

#[tokio::test]
async fn staged_audio_is_removed_when_transcription_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let transcriber = StubTranscriber::failing();
    let llm = ScriptedLlm::new(&[HEADACHE_RESPONSE]);
    let pipeline = build_pipeline(transcriber.clone(), llm.clone(), None, limits(tmp.path()));

    let err = pipeline.process_audio(wav(), no_document()).await.unwrap_err();

    assert!(matches!(err, CliniaError::Transcription(ref m) if m.contains("503")));
    assert_eq!(transcriber.calls(), 1);
    assert_eq!(llm.calls(), 0);
    assert!(staged_files(tmp.path()).is_empty());
}

#[tokio::test]
async fn staged_audio_is_removed_when_transcript_is_too_short() {
    let tmp = tempfile::tempdir().unwrap();
    let transcriber = StubTranscriber::returning("  hola  ");
    let llm = ScriptedLlm::new(&[HEADACHE_RESPONSE]);
    let pipeline = build_pipeline(transcriber, llm.clone(), None, limits(tmp.path()));

    let err = pipeline.process_audio(wav(), no_document()).await.unwrap_err();

    assert!(matches!(err, CliniaError::Validation(_)));
    assert_eq!(llm.calls(), 0);
    assert!(staged_files(tmp.path()).is_empty());
}

#[tokio::test]
async fn staged_audio_is_removed_when_llm_is_unreachable() {
    let tmp = tempfile::tempdir().unwrap();
    let transcriber = StubTranscriber::returning(HEADACHE_TRANSCRIPT);
    let pipeline = build_pipeline(
        transcriber,
        Arc::new(UnreachableLlm),
        None,
        limits(tmp.path()),
    );

    let err = pipeline.process_audio(wav(), no_document()).await.unwrap_err();

    assert!(matches!(err, CliniaError::Llm(_)));
    assert!(staged_files(tmp.path()).is_empty());
}

#[tokio::test]
async fn empty_filename_is_rejected_before_transcription() {
    let tmp = tempfile::tempdir().unwrap();
    let transcriber = StubTranscriber::returning(HEADACHE_TRANSCRIPT);
    let llm = ScriptedLlm::new(&[HEADACHE_RESPONSE]);
    let pipeline = build_pipeline(transcriber.clone(), llm, None, limits(tmp.path()));

    let upload = AudioUpload::new("", b"RIFF".to_vec());
    let err = pipeline.process_audio(upload, no_document()).await.unwrap_err();

    assert!(matches!(err, CliniaError::Validation(_)));
    assert_eq!(transcriber.calls(), 0);
    assert!(staged_files(tmp.path()).is_empty());
}

#[tokio::test]
async fn oversized_upload_is_rejected_before_transcription() {
    let tmp = tempfile::tempdir().unwrap();
    let transcriber = StubTranscriber::returning(HEADACHE_TRANSCRIPT);
    let llm = ScriptedLlm::new(&[HEADACHE_RESPONSE]);
    let mut limits = limits(tmp.path());
    limits.max_upload_bytes = 8;
    let pipeline = build_pipeline(transcriber.clone(), llm, None, limits);

    let err = pipeline.process_audio(wav(), no_document()).await.unwrap_err();

    assert!(matches!(err, CliniaError::PayloadTooLarge { limit_bytes: 8 }));
    assert_eq!(transcriber.calls(), 0);
}

#[tokio::test]
async fn document_failure_is_embedded_in_successful_response() {
    let tmp = tempfile::tempdir().unwrap();
    let transcriber = StubTranscriber::returning(HEADACHE_TRANSCRIPT);
    let llm = ScriptedLlm::new(&[HEADACHE_RESPONSE]);
    let pipeline = build_pipeline(
        transcriber,
        llm,
        Some(Arc::new(FailingDocs)),
        limits(tmp.path()),
    );

    let options = ProcessOptions {
        emit_raw_transcript: true,
        create_document: true,
    };
    let session = pipeline.process_audio(wav(), options).await.unwrap();

    match session.document.as_ref() {
        Some(DocumentInfo::Failed { error, details }) => {
            assert_eq!(error, "Failed to create Google Doc");
            assert!(details.contains("Drive quota exceeded"));
        }
        other => panic!("expected failed document, got {:?}", other),
    }
    assert!(session.structured_data.subjective.is_some());
    assert!(staged_files(tmp.path()).is_empty());
}

#[tokio::test]
async fn unparsable_model_output_completes_with_error_record() {
    let tmp = tempfile::tempdir().unwrap();
    let llm = ScriptedLlm::new(&["no JSON here"]);
    let pipeline = build_pipeline(
        StubTranscriber::returning(HEADACHE_TRANSCRIPT),
        llm.clone(),
        None,
        limits(tmp.path()),
    );

    let session = pipeline.process_audio(wav(), no_document()).await.unwrap();

    assert_eq!(llm.calls(), 3);
    assert!(session.structured_data.is_error());
    assert_eq!(
        session.structured_data.raw_response.as_deref(),
        Some("no JSON here")
    );
    assert!(staged_files(tmp.path()).is_empty());
}

#[tokio::test]
async fn created_document_is_titled_after_patient() {
    let tmp = tempfile::tempdir().unwrap();
    let docs = Arc::new(RecordingDocs::default());
    let pipeline = build_pipeline(
        StubTranscriber::returning(HEADACHE_TRANSCRIPT),
        ScriptedLlm::new(&[HEADACHE_RESPONSE]),
        Some(docs.clone()),
        limits(tmp.path()),
    );

    let session = pipeline
        .process_audio(wav(), ProcessOptions::default())
        .await
        .unwrap();

    let link = session.document.as_ref().and_then(|d| d.link()).unwrap();
    assert_eq!(link, "https://docs.google.com/document/d/doc-123/edit");
    let titles = docs.titles.lock().unwrap().clone();
    assert!(titles[0].starts_with("ClinIA - Paciente - "));
    assert!(!docs.operations.lock().unwrap().is_empty());
}

#[tokio::test]
async fn export_is_byte_identical_to_stored_structured_data() {
    let tmp = tempfile::tempdir().unwrap();
    let pipeline = build_pipeline(
        StubTranscriber::returning(HEADACHE_TRANSCRIPT),
        ScriptedLlm::new(&[HEADACHE_RESPONSE]),
        None,
        limits(tmp.path()),
    );

    let session = pipeline.process_audio(wav(), no_document()).await.unwrap();
    let export = pipeline.export(&session.session_id).await.unwrap();

    assert_eq!(
        export.body,
        serde_json::to_string_pretty(&session.structured_data).unwrap()
    );
    assert_eq!(
        export.file_name,
        format!("clinia_{}.json", session.session_id)
    );

    let parsed: ClinicalRecord = serde_json::from_str(&export.body).unwrap();
    assert_eq!(parsed, session.structured_data);

    let again = pipeline.export(&session.session_id).await.unwrap();
    assert_eq!(again.body, export.body);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let pipeline = build_pipeline(
        StubTranscriber::returning(HEADACHE_TRANSCRIPT),
        ScriptedLlm::new(&[HEADACHE_RESPONSE]),
        None,
        limits(tmp.path()),
    );

    assert!(matches!(
        pipeline.session("session_nope").await,
        Err(CliniaError::NotFound(_))
    ));
    assert!(matches!(
        pipeline.export("session_nope").await,
        Err(CliniaError::NotFound(_))
    ));
}

#[tokio::test]
async fn each_run_gets_its_own_session() {
    let tmp = tempfile::tempdir().unwrap();
    let pipeline = build_pipeline(
        StubTranscriber::returning(HEADACHE_TRANSCRIPT),
        ScriptedLlm::new(&[HEADACHE_RESPONSE]),
        None,
        limits(tmp.path()),
    );

    let first = pipeline.process_audio(wav(), no_document()).await.unwrap();
    let second = pipeline.process_audio(wav(), no_document()).await.unwrap();

    assert_ne!(first.session_id, second.session_id);
    let fetched = pipeline.session(&first.session_id).await.unwrap();
    assert_eq!(*fetched, *first);
}

#[tokio::test]
async fn transcribe_only_cleans_up_and_skips_extraction() {
    let tmp = tempfile::tempdir().unwrap();
    let transcriber = StubTranscriber::returning(HEADACHE_TRANSCRIPT);
    let llm = ScriptedLlm::new(&[HEADACHE_RESPONSE]);
    let pipeline = build_pipeline(transcriber.clone(), llm.clone(), None, limits(tmp.path()));

    let transcript = pipeline.transcribe_only(wav(), false).await.unwrap();

    assert_eq!(transcript.text, HEADACHE_TRANSCRIPT);
    assert_eq!(llm.calls(), 0);
    assert!(staged_files(tmp.path()).is_empty());
}

#[tokio::test]
async fn process_transcript_requires_text() {
    let tmp = tempfile::tempdir().unwrap();
    let pipeline = build_pipeline(
        StubTranscriber::returning(HEADACHE_TRANSCRIPT),
        ScriptedLlm::new(&[HEADACHE_RESPONSE]),
        None,
        limits(tmp.path()),
    );

    assert!(matches!(
        pipeline.process_transcript("   ", false).await,
        Err(CliniaError::Validation(_))
    ));

    let processed = pipeline
        .process_transcript(HEADACHE_TRANSCRIPT, false)
        .await
        .unwrap();
    assert!(processed.document.is_none());
    assert!(processed.structured_data.plan.is_some());
}

#[tokio::test]
async fn requested_document_without_provider_is_reported_inline() {
    let tmp = tempfile::tempdir().unwrap();
    let pipeline = build_pipeline(
        StubTranscriber::returning(HEADACHE_TRANSCRIPT),
        ScriptedLlm::new(&[HEADACHE_RESPONSE]),
        None,
        limits(tmp.path()),
    );

    let processed = pipeline
        .process_transcript(HEADACHE_TRANSCRIPT, true)
        .await
        .unwrap();
    assert!(matches!(
        processed.document,
        Some(DocumentInfo::Failed { .. })
    ));
}
