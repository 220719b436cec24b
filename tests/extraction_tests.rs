mod common;

use std::sync::Arc;

use axum::body::to_bytes;
use axum::response::IntoResponse;

use clinia::config::Settings;
use clinia::llm::prompts::CORRECTION_SUFFIX;
use clinia::llm::{Extractor, GeminiClient, GenerationConfig};
use clinia::record::EXTRACTION_FAILED;
use clinia::CliniaError;

use common::{ScriptedLlm, UnreachableLlm, HEADACHE_RESPONSE, HEADACHE_TRANSCRIPT};

const GARBAGE: &str = "Lo siento, no puedo generar esa nota.";

#[tokio::test]
async fn garbage_output_is_retried_exactly_max_attempts_times() {
    for max_attempts in [1, 3, 5] {
        let llm = ScriptedLlm::new(&[GARBAGE]);
        let extractor = Extractor::new(llm.clone(), GenerationConfig::default(), max_attempts);

        let record = extractor.extract(HEADACHE_TRANSCRIPT).await.unwrap();

        assert_eq!(llm.calls(), max_attempts as usize);
        assert!(record.is_error());
        assert_eq!(record.error.as_deref(), Some(EXTRACTION_FAILED));
        assert_eq!(record.raw_response.as_deref(), Some(GARBAGE));
        assert!(record.patient_info.is_some());
    }
}

#[tokio::test]
async fn last_raw_response_is_preserved_verbatim() {
    let llm = ScriptedLlm::new(&["{ broken", "```json\n{\"subjetivo\": \n```"]);
    let extractor = Extractor::new(llm.clone(), GenerationConfig::default(), 2);

    let record = extractor.extract(HEADACHE_TRANSCRIPT).await.unwrap();

    assert_eq!(
        record.raw_response.as_deref(),
        Some("```json\n{\"subjetivo\": \n```")
    );
}

#[tokio::test]
async fn retries_reuse_base_prompt_with_single_correction() {
    let llm = ScriptedLlm::new(&[GARBAGE, GARBAGE, HEADACHE_RESPONSE]);
    let extractor = Extractor::new(llm.clone(), GenerationConfig::default(), 3);

    let record = extractor.extract(HEADACHE_TRANSCRIPT).await.unwrap();
    assert!(!record.is_error());

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(!prompts[0].contains(CORRECTION_SUFFIX));
    assert_eq!(prompts[1], format!("{}{}", prompts[0], CORRECTION_SUFFIX));
    assert_eq!(prompts[2], prompts[1]);
}

#[tokio::test]
async fn valid_first_response_makes_one_call() {
    let llm = ScriptedLlm::new(&[HEADACHE_RESPONSE]);
    let extractor = Extractor::new(llm.clone(), GenerationConfig::default(), 3);

    let record = extractor.extract(HEADACHE_TRANSCRIPT).await.unwrap();

    assert_eq!(llm.calls(), 1);
    assert_eq!(
        record
            .subjective
            .as_ref()
            .and_then(|s| s.chief_complaint.as_deref()),
        Some("Dolor de cabeza leve")
    );
    // Nulls in the response mean "not mentioned"
    assert!(record.patient_name().is_none());
}

#[tokio::test]
async fn transport_failure_is_an_llm_error() {
    let extractor = Extractor::new(Arc::new(UnreachableLlm), GenerationConfig::default(), 3);

    let err = extractor.extract(HEADACHE_TRANSCRIPT).await.unwrap_err();
    assert!(matches!(err, CliniaError::Llm(ref m) if m.contains("connection refused")));
}

#[tokio::test]
async fn drifted_but_valid_json_is_kept_on_first_attempt() {
    let drifted = r#"{
        "informacion_paciente": {"nombre_del_paciente": "Ana"},
        "subjetivo": {"motivo_de_consulta": "Dolor de cabeza leve"},
        "objetivo": {"signos_vitales": "No registrados"},
        "evaluacion": {"diagnostico": "Cefalea tensional", "diagnostico_principal": "Cefalea"},
        "plan": {"recomendaciones": ["Descanso"]}
    }"#;
    let llm = ScriptedLlm::new(&[drifted]);
    let extractor = Extractor::new(llm.clone(), GenerationConfig::default(), 3);

    let record = extractor.extract(HEADACHE_TRANSCRIPT).await.unwrap();

    assert_eq!(llm.calls(), 1);
    assert!(!record.is_error());
    assert_eq!(record.patient_name(), Some("Ana"));
    assert_eq!(
        record.assessment.as_ref().unwrap().diagnosis.as_deref(),
        Some("Cefalea tensional")
    );
    assert_eq!(
        record.plan.as_ref().unwrap().recommendations,
        vec!["Descanso".to_string()]
    );
}

#[tokio::test]
async fn gemini_failures_do_not_expose_the_api_key() {
    const KEY: &str = "SECRET-KEY-123";
    let mut settings = Settings::default();
    settings.llm.api_key = KEY.to_string();
    settings.llm.endpoint = "http://127.0.0.1:9/v1beta".to_string();
    let client = GeminiClient::from_settings(&settings).unwrap();
    let extractor = Extractor::new(Arc::new(client), GenerationConfig::default(), 1);

    let err = extractor.extract(HEADACHE_TRANSCRIPT).await.unwrap_err();
    assert!(matches!(err, CliniaError::Llm(ref m) if !m.contains(KEY)));

    let response = err.into_response();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(!String::from_utf8_lossy(&body).contains(KEY));
}
