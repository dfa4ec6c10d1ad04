//! In-memory job status table shared by request handlers and background tasks.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::models::job::{Job, TransitionError};

/// Job id → status record, behind a single lock.
///
/// Records live for the lifetime of the process.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, Job>>,
    last_stamp: AtomicI64,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time-derived id (`job_<unix nanos>`), strictly increasing within the process
    /// even when the clock stalls or steps backwards.
    pub fn next_id(&self) -> String {
        let now = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX);
        let mut last = self.last_stamp.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match self.last_stamp.compare_exchange_weak(
                last,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return format!("job_{candidate}"),
                Err(actual) => last = actual,
            }
        }
    }

    /// Insert a new `pending` job.
    pub fn register(&self, id: &str) -> Result<Job, RegistryError> {
        let mut jobs = self.write();
        if jobs.contains_key(id) {
            return Err(RegistryError::DuplicateJob(id.to_string()));
        }
        let job = Job::new(id);
        jobs.insert(id.to_string(), job.clone());
        Ok(job)
    }

    /// Snapshot of the job's current status.
    pub fn get(&self, id: &str) -> Option<Job> {
        self.read().get(id).cloned()
    }

    /// Apply `mutation` atomically. The change is committed only if the
    /// mutation succeeds; readers see either the old or the new record.
    pub fn update<T, F>(&self, id: &str, mutation: F) -> Result<T, RegistryError>
    where
        F: FnOnce(&mut Job) -> Result<T, TransitionError>,
    {
        let mut jobs = self.write();
        let current = jobs
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        let mut next = current.clone();
        let out = mutation(&mut next)?;
        *current = next;
        Ok(out)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Records are only ever replaced whole, so a poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Job>> {
        self.jobs.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Job>> {
        self.jobs.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("job {0} already registered")]
    DuplicateJob(String),

    #[error("job {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}
