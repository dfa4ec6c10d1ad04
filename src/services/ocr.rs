use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Turns a PDF on disk into raw text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, pdf: &Path) -> Result<String, OcrError>;
}

/// Runs an OCR script (`<interpreter> <script> <pdf>`) and reads its stdout.
///
/// The script is expected to rasterize the PDF and print the recognized text.
pub struct CommandExtractor {
    interpreter: PathBuf,
    script: PathBuf,
    timeout: Option<Duration>,
}

impl CommandExtractor {
    pub fn new(interpreter: impl Into<PathBuf>, script: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl TextExtractor for CommandExtractor {
    async fn extract(&self, pdf: &Path) -> Result<String, OcrError> {
        let pdf = std::path::absolute(pdf).map_err(OcrError::Io)?;

        let mut command = Command::new(&self.interpreter);
        command.arg(&self.script).arg(&pdf).kill_on_drop(true);

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, command.output())
                .await
                .map_err(|_| OcrError::Timeout(limit))?,
            None => command.output().await,
        }
        .map_err(|e| OcrError::Spawn {
            program: self.interpreter.display().to_string(),
            source: e,
        })?;

        if !output.status.success() {
            return Err(OcrError::Failed {
                status: output.status.to_string(),
                output: combined_output(&output.stdout, &output.stderr),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        if text.trim().is_empty() {
            return Err(OcrError::NoText(pdf));
        }

        tracing::debug!(pdf = %pdf.display(), chars = text.len(), "OCR extraction complete");
        Ok(text)
    }
}

fn combined_output(stdout: &[u8], stderr: &[u8]) -> String {
    let mut out = String::from_utf8_lossy(stdout).into_owned();
    out.push_str(&String::from_utf8_lossy(stderr));
    out
}

#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("failed to start OCR interpreter {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to extract text ({status})\nOutput: {output}")]
    Failed { status: String, output: String },

    #[error("OCR produced no text output for {}", .0.display())]
    NoText(PathBuf),

    #[error("OCR timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
