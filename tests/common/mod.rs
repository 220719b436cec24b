#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use clinia::docs::{
    DocumentContent, DocumentOperation, DocumentProvider, DocumentRenderer, StructuralElement,
};
use clinia::llm::{Extractor, GenerationConfig, LlmProvider};
use clinia::pipeline::{Pipeline, UploadLimits};
use clinia::storage::InMemorySessionStore;
use clinia::transcription::{TranscriptResult, TranscriptionProvider};

pub const HEADACHE_TRANSCRIPT: &str = "Dolor de cabeza leve, sin fiebre, se recomienda descanso.";

pub const HEADACHE_RESPONSE: &str = r#"```json
{
  "informacion_paciente": {"nombre_del_paciente": null, "edad": null},
  "subjetivo": {
    "motivo_de_consulta": "Dolor de cabeza leve",
    "sintomas": ["cefalea leve"]
  },
  "objetivo": {"hallazgos": ["sin fiebre"]},
  "evaluacion": {},
  "plan": {"recomendaciones": ["descanso"]},
  "metadata": {}
}
```"#;

pub fn run_clinia(args: &[&str]) -> Output {
    TestEnv::new().run(args)
}

pub struct TestEnv {
    home: TempDir,
    config: TempDir,
    data: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            home: tempfile::tempdir().expect("create temporary HOME dir"),
            config: tempfile::tempdir().expect("create temporary XDG config dir"),
            data: tempfile::tempdir().expect("create temporary XDG data dir"),
        }
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_clinia"))
            .args(args)
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.config.path())
            .env("XDG_DATA_HOME", self.data.path())
            .env_remove("CLINIA_ASSEMBLYAI_API_KEY")
            .env_remove("CLINIA_GEMINI_API_KEY")
            .env_remove("CLINIA_GOOGLE_ACCESS_TOKEN")
            .env_remove("RUST_LOG")
            .output()
            .expect("failed to execute clinia binary")
    }

    pub fn config_path(&self) -> PathBuf {
        let output = self.run(&["config", "path"]);
        assert!(
            output.status.success(),
            "config path should succeed\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );

        let path = String::from_utf8_lossy(&output.stdout);
        PathBuf::from(path.trim())
    }

    pub fn write_config(&self, contents: &str) {
        let config_path = self.config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).expect("create config parent directory");
        }
        std::fs::write(&config_path, contents).expect("write config file");
    }

    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.data.path().join(name);
        std::fs::write(&path, contents).expect("write test file");
        path
    }
}

/// Transcription stub that records every path it is handed
pub struct StubTranscriber {
    text: String,
    fail: bool,
    calls: AtomicUsize,
    seen: Mutex<Vec<(PathBuf, bool)>>,
}

impl StubTranscriber {
    pub fn returning(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            fail: false,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            text: String::new(),
            fail: true,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Paths passed to `transcribe`, with whether the file existed at that moment
    pub fn seen(&self) -> Vec<(PathBuf, bool)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranscriptionProvider for StubTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> anyhow::Result<TranscriptResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((audio_path.to_path_buf(), audio_path.exists()));

        if self.fail {
            anyhow::bail!("AssemblyAI upload failed with status 503");
        }

        Ok(TranscriptResult {
            text: self.text.clone(),
            confidence: 0.95,
            audio_duration_ms: 4_000,
            word_count: self.text.split_whitespace().count(),
            utterances: Vec::new(),
        })
    }
}

/// LLM stub that replays canned responses; the last one repeats
pub struct ScriptedLlm {
    responses: Vec<String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: responses.iter().map(|r| r.to_string()).collect(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(&self, prompt: &str, _config: &GenerationConfig) -> anyhow::Result<String> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        let response = self
            .responses
            .get(index)
            .or_else(|| self.responses.last())
            .cloned()
            .unwrap_or_default();
        Ok(response)
    }
}

/// LLM stub whose transport always fails
pub struct UnreachableLlm;

#[async_trait]
impl LlmProvider for UnreachableLlm {
    async fn generate(&self, _prompt: &str, _config: &GenerationConfig) -> anyhow::Result<String> {
        anyhow::bail!("connection refused")
    }
}

/// Document stub whose copy call always fails
pub struct FailingDocs;

#[async_trait]
impl DocumentProvider for FailingDocs {
    async fn copy_template(&self, _template_id: &str, _name: &str) -> anyhow::Result<String> {
        anyhow::bail!("Drive quota exceeded")
    }

    async fn get_document(&self, _document_id: &str) -> anyhow::Result<DocumentContent> {
        anyhow::bail!("unreachable")
    }

    async fn batch_update(
        &self,
        _document_id: &str,
        _operations: &[DocumentOperation],
    ) -> anyhow::Result<()> {
        anyhow::bail!("unreachable")
    }

    fn document_link(&self, document_id: &str) -> String {
        format!("https://docs.example/{}", document_id)
    }
}

/// Document stub that accepts everything and keeps the applied operations
#[derive(Default)]
pub struct RecordingDocs {
    pub titles: Mutex<Vec<String>>,
    pub operations: Mutex<Vec<DocumentOperation>>,
}

#[async_trait]
impl DocumentProvider for RecordingDocs {
    async fn copy_template(&self, _template_id: &str, name: &str) -> anyhow::Result<String> {
        self.titles.lock().unwrap().push(name.to_string());
        Ok("doc-123".to_string())
    }

    async fn get_document(&self, _document_id: &str) -> anyhow::Result<DocumentContent> {
        Ok(DocumentContent {
            elements: vec![StructuralElement {
                start_index: Some(1),
                end_index: 40,
            }],
        })
    }

    async fn batch_update(
        &self,
        _document_id: &str,
        operations: &[DocumentOperation],
    ) -> anyhow::Result<()> {
        self.operations
            .lock()
            .unwrap()
            .extend(operations.iter().cloned());
        Ok(())
    }

    fn document_link(&self, document_id: &str) -> String {
        format!("https://docs.google.com/document/d/{}/edit", document_id)
    }
}

pub fn limits(temp_dir: &Path) -> UploadLimits {
    UploadLimits {
        temp_dir: temp_dir.to_path_buf(),
        ..UploadLimits::default()
    }
}

pub fn build_pipeline(
    transcriber: Arc<dyn TranscriptionProvider>,
    llm: Arc<dyn LlmProvider>,
    docs: Option<Arc<dyn DocumentProvider>>,
    limits: UploadLimits,
) -> Pipeline {
    Pipeline::new(
        transcriber,
        Extractor::new(llm, GenerationConfig::default(), 3),
        docs.map(|provider| DocumentRenderer::new(provider, "template-id")),
        Arc::new(InMemorySessionStore::new()),
        limits,
    )
}

/// Files left in a staging directory
pub fn staged_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default()
}
