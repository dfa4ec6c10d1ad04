use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Status of a card-generation job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Status record for one batch-processing request, as returned to pollers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    pub progress: f64,
    pub total_cards: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum TransitionError {
    #[error("job is already {0}")]
    Terminal(JobStatus),

    #[error("job must be processing to record progress, found {0}")]
    NotProcessing(JobStatus),
}

impl Job {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            status: JobStatus::Pending,
            progress: 0.0,
            total_cards: 0,
            error: None,
            deck_name: None,
            filename: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// `pending -> processing`, progress reset to zero.
    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.ensure_open()?;
        self.status = JobStatus::Processing;
        self.progress = 0.0;
        self.touch();
        Ok(())
    }

    /// Record that `files_done` of `total_files` have been attempted.
    ///
    /// Progress only moves forward and never reaches 100 here; the final
    /// value is decided by [`Job::complete`] or [`Job::fail`].
    pub fn record_progress(
        &mut self,
        files_done: usize,
        total_files: usize,
        total_cards: usize,
    ) -> Result<(), TransitionError> {
        if self.status != JobStatus::Processing {
            return Err(TransitionError::NotProcessing(self.status));
        }
        if total_files > 0 && files_done < total_files {
            let pct = files_done as f64 / total_files as f64 * 100.0;
            self.progress = self.progress.max(pct);
        }
        self.total_cards = total_cards;
        self.touch();
        Ok(())
    }

    pub fn complete(
        &mut self,
        deck_name: impl Into<String>,
        filename: impl Into<String>,
    ) -> Result<(), TransitionError> {
        self.ensure_open()?;
        self.status = JobStatus::Completed;
        self.progress = 100.0;
        self.deck_name = Some(deck_name.into());
        self.filename = Some(filename.into());
        self.touch();
        Ok(())
    }

    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), TransitionError> {
        self.ensure_open()?;
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        self.touch();
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::Terminal(self.status));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
