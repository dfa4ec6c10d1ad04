use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Builds a distributable deck package from a CSV deck.
#[async_trait]
pub trait DeckExporter: Send + Sync {
    async fn export(&self, csv_path: &Path, deck_name: &str) -> Result<PathBuf, ExportError>;
}

/// Runs `<interpreter> <script> <csv> <package>` and returns the package path.
///
/// Packages are written to `<decks_dir>/tmp/<deck_name>.apkg`.
pub struct ScriptExporter {
    interpreter: PathBuf,
    script: PathBuf,
    output_dir: PathBuf,
}

impl ScriptExporter {
    pub fn new(
        interpreter: impl Into<PathBuf>,
        script: impl Into<PathBuf>,
        decks_dir: &Path,
    ) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
            output_dir: decks_dir.join("tmp"),
        }
    }
}

#[async_trait]
impl DeckExporter for ScriptExporter {
    async fn export(&self, csv_path: &Path, deck_name: &str) -> Result<PathBuf, ExportError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| ExportError::Setup {
                path: self.output_dir.clone(),
                source: e,
            })?;

        if !tokio::fs::try_exists(csv_path).await.unwrap_or(false) {
            return Err(ExportError::MissingCsv(csv_path.to_path_buf()));
        }
        if !tokio::fs::try_exists(&self.script).await.unwrap_or(false) {
            return Err(ExportError::MissingScript(self.script.clone()));
        }

        let package_path = self.output_dir.join(format!("{deck_name}.apkg"));
        let output = Command::new(&self.interpreter)
            .arg(&self.script)
            .arg(csv_path)
            .arg(&package_path)
            .output()
            .await
            .map_err(|e| ExportError::Spawn {
                program: self.interpreter.clone(),
                source: e,
            })?;

        let combined = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );

        if !output.status.success() {
            return Err(ExportError::Failed {
                status: output.status.to_string(),
                output: combined,
                interpreter: self.interpreter.clone(),
                script: self.script.clone(),
                csv_path: csv_path.to_path_buf(),
                package_path,
            });
        }

        if !tokio::fs::try_exists(&package_path).await.unwrap_or(false) {
            return Err(ExportError::NotCreated {
                package_path,
                output: combined,
            });
        }

        tracing::info!(deck = deck_name, package = %package_path.display(), "Deck exported");
        Ok(package_path)
    }
}

/// Export errors carry every path involved so operators can reproduce the call.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to create export directory {}: {source}", .path.display())]
    Setup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV file not found at {}", .0.display())]
    MissingCsv(PathBuf),

    #[error("export script not found at {}", .0.display())]
    MissingScript(PathBuf),

    #[error("failed to start export interpreter {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "failed to generate deck package ({status})\nCommand output: {output}\nScript path: {}\nCSV path: {}\nPackage path: {}\nInterpreter: {}",
        .script.display(),
        .csv_path.display(),
        .package_path.display(),
        .interpreter.display()
    )]
    Failed {
        status: String,
        output: String,
        interpreter: PathBuf,
        script: PathBuf,
        csv_path: PathBuf,
        package_path: PathBuf,
    },

    #[error("package was not created at {}\nScript output: {output}", .package_path.display())]
    NotCreated { package_path: PathBuf, output: String },
}
