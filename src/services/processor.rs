//! Background processing of uploaded PDF batches.
//!
//! Each accepted batch gets its own tokio task. The task walks the files in
//! submission order (extract → normalize → synthesize → persist) and reports
//! through the [`JobRegistry`] only. A failing file does not stop the batch,
//! but any failure makes the job end as `failed` with the last error seen.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::services::card_store::{CardStore, CardStoreError};
use crate::services::normalizer::normalize_text;
use crate::services::ocr::{OcrError, TextExtractor};
use crate::services::registry::{JobRegistry, RegistryError};
use crate::services::synthesis::{CardSynthesizer, SynthesisError};

const CANCELLED_MESSAGE: &str = "processing cancelled: server shutting down";

/// One accepted processing request.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub files: Vec<PathBuf>,
    pub include_topic_cards: bool,
    /// Card budget per document; `None` uses the configured default.
    pub cards_per_topic: Option<u32>,
}

pub struct JobProcessor {
    registry: Arc<JobRegistry>,
    extractor: Arc<dyn TextExtractor>,
    synthesizer: Arc<CardSynthesizer>,
    card_store: Arc<CardStore>,
    shutdown: CancellationToken,
    default_cards: u32,
}

impl JobProcessor {
    pub fn new(
        registry: Arc<JobRegistry>,
        extractor: Arc<dyn TextExtractor>,
        synthesizer: Arc<CardSynthesizer>,
        card_store: Arc<CardStore>,
        shutdown: CancellationToken,
        default_cards: u32,
    ) -> Self {
        Self {
            registry,
            extractor,
            synthesizer,
            card_store,
            shutdown,
            default_cards,
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Register a `pending` job and start processing it in the background.
    /// Returns the job id immediately.
    pub fn submit(self: &Arc<Self>, batch: BatchRequest) -> Result<String, ProcessError> {
        if batch.files.is_empty() {
            return Err(ProcessError::EmptyBatch);
        }

        let job_id = self.registry.next_id();
        self.registry.register(&job_id)?;
        metrics::counter!("jobs_submitted_total").increment(1);

        tracing::info!(
            job_id = %job_id,
            files = batch.files.len(),
            include_topic_cards = batch.include_topic_cards,
            "Job accepted"
        );

        let processor = Arc::clone(self);
        let id = job_id.clone();
        tokio::spawn(async move { processor.run(&id, batch).await });

        Ok(job_id)
    }

    /// Drive one job to a terminal state. Shutdown marks it failed.
    async fn run(&self, job_id: &str, batch: BatchRequest) {
        tokio::select! {
            _ = self.shutdown.cancelled() => {
                tracing::warn!(job_id, "Job interrupted by shutdown");
                metrics::counter!("jobs_failed_total").increment(1);
                if let Err(e) = self.registry.update(job_id, |job| job.fail(CANCELLED_MESSAGE)) {
                    tracing::error!(job_id, error = %e, "Failed to record cancellation");
                }
            }
            _ = self.process(job_id, &batch) => {}
        }
    }

    async fn process(&self, job_id: &str, batch: &BatchRequest) {
        let started = Instant::now();

        if let Err(e) = self.registry.update(job_id, |job| job.start()) {
            tracing::error!(job_id, error = %e, "Failed to start job");
            return;
        }

        let Some(first_file) = batch.files.first() else {
            metrics::counter!("jobs_failed_total").increment(1);
            if let Err(e) = self
                .registry
                .update(job_id, |job| job.fail(ProcessError::EmptyBatch.to_string()))
            {
                tracing::error!(job_id, error = %e, "Failed to record final job state");
            }
            return;
        };

        let desired_cards = batch
            .cards_per_topic
            .filter(|n| *n > 0)
            .unwrap_or(self.default_cards);
        let total_files = batch.files.len();
        let mut total_cards = 0;
        let mut last_error: Option<String> = None;

        for (i, path) in batch.files.iter().enumerate() {
            let file = display_name(path);
            tracing::info!(job_id, file = %file, index = i + 1, total_files, "Processing file");

            match self
                .process_file(path, desired_cards, batch.include_topic_cards)
                .await
            {
                Ok(count) => {
                    total_cards += count;
                    metrics::counter!("cards_generated_total").increment(count as u64);
                    tracing::info!(job_id, file = %file, cards = count, "File processed");
                }
                Err(e) => {
                    tracing::warn!(job_id, file = %file, error = %e, "File failed, continuing with batch");
                    last_error = Some(format!("{file}: {e}"));
                }
            }

            if let Err(e) = self
                .registry
                .update(job_id, |job| job.record_progress(i + 1, total_files, total_cards))
            {
                tracing::error!(job_id, error = %e, "Failed to record progress");
                return;
            }
        }

        let result = match last_error {
            Some(error) => {
                metrics::counter!("jobs_failed_total").increment(1);
                tracing::warn!(job_id, error = %error, total_cards, "Job failed");
                self.registry.update(job_id, |job| job.fail(error))
            }
            None => {
                let filename = display_name(first_file);
                let deck_name = deck_name_for(first_file);
                metrics::counter!("jobs_completed_total").increment(1);
                tracing::info!(job_id, deck = %deck_name, total_cards, "Job completed");
                self.registry
                    .update(job_id, |job| job.complete(deck_name, filename))
            }
        };

        if let Err(e) = result {
            tracing::error!(job_id, error = %e, "Failed to record final job state");
        }
        metrics::histogram!("job_processing_seconds").record(started.elapsed().as_secs_f64());
    }

    async fn process_file(
        &self,
        path: &Path,
        desired_cards: u32,
        include_topic_cards: bool,
    ) -> Result<usize, FileError> {
        let raw = self.extractor.extract(path).await?;
        let text = normalize_text(&raw);
        tracing::debug!(
            file = %display_name(path),
            raw_chars = raw.len(),
            chars = text.len(),
            text = %text,
            "Normalized text"
        );

        let cards = self
            .synthesizer
            .synthesize(&text, desired_cards, include_topic_cards)
            .await?;

        self.card_store
            .write_cards(&deck_name_for(path), &cards)
            .await?;
        Ok(cards.len())
    }
}

/// Deck name for a source document: its file name without extension.
pub fn deck_name_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("no files to process")]
    EmptyBatch,

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Why a single file contributed no cards.
#[derive(Debug, thiserror::Error)]
enum FileError {
    #[error(transparent)]
    Extract(#[from] OcrError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error("failed to save cards: {0}")]
    Persist(#[from] CardStoreError),
}
