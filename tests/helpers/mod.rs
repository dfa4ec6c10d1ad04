//! Test helper utilities: in-process app wiring with fake external tools
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use flashcard_forge::app_state::AppState;
use flashcard_forge::routes;
use flashcard_forge::services::{
    card_store::CardStore,
    deck_store::DeckStore,
    exporter::{DeckExporter, ExportError},
    ocr::{OcrError, TextExtractor},
    processor::JobProcessor,
    registry::JobRegistry,
    synthesis::{CardSynthesizer, CompletionRequest, SynthesisError, SynthesisSettings, TextGenerator},
};

use crate::fixtures::LectureFixture;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
const BOUNDARY: &str = "flashcard-forge-test-boundary";

/// Returns canned text keyed by file name; unknown files have no text.
pub struct FakeExtractor {
    texts: HashMap<String, String>,
}

#[async_trait]
impl TextExtractor for FakeExtractor {
    async fn extract(&self, pdf: &Path) -> Result<String, OcrError> {
        let name = pdf
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.texts
            .get(&name)
            .cloned()
            .ok_or_else(|| OcrError::NoText(pdf.to_path_buf()))
    }
}

/// Answers each prompt with the response of the first fixture whose marker it contains.
pub struct ScriptedGenerator {
    responses: Vec<(String, String)>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(&self, request: CompletionRequest) -> Result<String, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .iter()
            .find(|(marker, _)| request.prompt.contains(marker.as_str()))
            .map(|(_, response)| response.clone())
            .ok_or(SynthesisError::EmptyResponse)
    }
}

/// Writes a small package next to the CSV, or fails like a broken export script.
pub struct FakeExporter {
    output_dir: PathBuf,
    fail: bool,
}

pub const FAKE_PACKAGE_BYTES: &[u8] = b"fake-apkg-package";

#[async_trait]
impl DeckExporter for FakeExporter {
    async fn export(&self, csv_path: &Path, deck_name: &str) -> Result<PathBuf, ExportError> {
        let package_path = self.output_dir.join(format!("{deck_name}.apkg"));
        if self.fail {
            return Err(ExportError::Failed {
                status: "exit status: 1".to_string(),
                output: "ModuleNotFoundError: No module named 'genanki'".to_string(),
                interpreter: PathBuf::from("python3"),
                script: PathBuf::from("scripts/generate_deck.py"),
                csv_path: csv_path.to_path_buf(),
                package_path,
            });
        }

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| ExportError::Setup {
                path: self.output_dir.clone(),
                source: e,
            })?;
        tokio::fs::write(&package_path, FAKE_PACKAGE_BYTES)
            .await
            .map_err(|e| ExportError::Setup {
                path: package_path.clone(),
                source: e,
            })?;
        Ok(package_path)
    }
}

/// A fully wired router over a temporary data directory.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub generator: Arc<ScriptedGenerator>,
    pub shutdown: CancellationToken,
    pub dir: TempDir,
}

impl TestApp {
    pub fn upload_dir(&self) -> PathBuf {
        self.dir.path().join("uploads")
    }

    pub fn cards_dir(&self) -> PathBuf {
        self.dir.path().join("cards")
    }

    /// Place a PDF in the upload directory without going through the endpoint.
    pub fn seed_upload(&self, filename: &str, bytes: &[u8]) {
        std::fs::write(self.upload_dir().join(filename), bytes).expect("Failed to seed upload");
    }

    pub async fn request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router call failed");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(
            Request::builder()
                .method(Method::DELETE)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn send_json(&self, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn upload(&self, files: &[(&str, &[u8])]) -> (StatusCode, Value) {
        self.request(
            Request::post("/api/upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(multipart_body(files)))
                .unwrap(),
        )
        .await
    }

    /// Poll the status endpoint until the job is completed or failed.
    pub async fn wait_for_job(&self, job_id: &str) -> Value {
        for _ in 0..400 {
            let (status, job) = self.get(&format!("/api/process/{job_id}")).await;
            assert_eq!(status, StatusCode::OK, "status check failed: {job}");
            match job["status"].as_str() {
                Some("completed") | Some("failed") => return job,
                Some("pending") | Some("processing") => sleep(Duration::from_millis(10)).await,
                other => panic!("Unknown job status: {other:?}"),
            }
        }
        panic!("Job {job_id} did not finish in time");
    }
}

/// Build the app with fake OCR and model outputs taken from `lectures`.
pub fn test_app(lectures: &[LectureFixture]) -> TestApp {
    build_app(lectures, false)
}

/// Same as [`test_app`] but the package exporter always fails.
pub fn test_app_with_failing_exporter() -> TestApp {
    build_app(&[], true)
}

fn build_app(lectures: &[LectureFixture], exporter_fails: bool) -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let upload_dir = dir.path().join("uploads");
    std::fs::create_dir_all(&upload_dir).expect("Failed to create upload dir");

    let extractor = FakeExtractor {
        texts: lectures
            .iter()
            .map(|l| (l.filename.to_string(), l.ocr_text.to_string()))
            .collect(),
    };
    let generator = Arc::new(ScriptedGenerator {
        responses: lectures
            .iter()
            .map(|l| (l.marker.to_string(), l.response.to_string()))
            .collect(),
        calls: AtomicUsize::new(0),
    });
    let synthesizer = CardSynthesizer::new(
        generator.clone(),
        SynthesisSettings {
            chunk_words: 1000,
            call_delay: Duration::ZERO,
        },
    );

    let cards = Arc::new(CardStore::new(dir.path().join("cards")).expect("card store"));
    let decks = DeckStore::new(dir.path().join("decks")).expect("deck store");
    let exporter = Arc::new(FakeExporter {
        output_dir: dir.path().join("decks").join("tmp"),
        fail: exporter_fails,
    });

    let shutdown = CancellationToken::new();
    let processor = Arc::new(JobProcessor::new(
        Arc::new(JobRegistry::new()),
        Arc::new(extractor),
        Arc::new(synthesizer),
        Arc::clone(&cards),
        shutdown.clone(),
        5,
    ));

    let state = AppState::new(upload_dir, processor, cards, decks, exporter);
    let router = routes::router(state.clone(), MAX_UPLOAD_BYTES);

    TestApp {
        router,
        state,
        generator,
        shutdown,
        dir,
    }
}

/// Encode `files` as a `multipart/form-data` body under the field name `files`.
pub fn multipart_body(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, bytes) in files {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Names of the files currently in `dir`.
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
