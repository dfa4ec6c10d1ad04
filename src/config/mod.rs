use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Directory uploaded PDFs are written to
    pub upload_dir: PathBuf,

    /// Directory holding one CSV file per generated deck
    pub cards_dir: PathBuf,

    /// Directory holding JSON decks and exported packages
    pub decks_dir: PathBuf,

    /// Credential for the chat-completion API
    #[serde(default)]
    pub openai_api_key: String,

    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    #[serde(default = "default_bind_host")]
    pub bind_host: String,

    #[serde(default = "default_backend_port")]
    pub backend_port: u16,

    /// Origin allowed by CORS (the web frontend)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    /// Cards requested per document when the request does not say otherwise
    #[serde(default = "default_cards_per_topic")]
    pub cards_per_topic: u32,

    #[serde(default = "default_chunk_words")]
    pub chunk_words: usize,

    /// Pause between chat-completion calls, in milliseconds
    #[serde(default = "default_synthesis_delay_ms")]
    pub synthesis_delay_ms: u64,

    /// Deadline for each OCR run and API call. Unset means no deadline.
    #[serde(default)]
    pub external_timeout_secs: Option<u64>,

    /// Interpreter used for the OCR and export scripts
    #[serde(default = "default_python_bin")]
    pub python_bin: PathBuf,

    #[serde(default = "default_extract_script")]
    pub extract_script: PathBuf,

    #[serde(default = "default_export_script")]
    pub export_script: PathBuf,

    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

fn default_backend_port() -> u16 {
    8081
}

fn default_cors_origin() -> String {
    "http://localhost:3001".to_string()
}

fn default_cards_per_topic() -> u32 {
    5
}

fn default_chunk_words() -> usize {
    crate::services::chunker::DEFAULT_CHUNK_WORDS
}

fn default_synthesis_delay_ms() -> u64 {
    1000
}

fn default_python_bin() -> PathBuf {
    PathBuf::from("python3")
}

fn default_extract_script() -> PathBuf {
    PathBuf::from("scripts/extract_text.py")
}

fn default_export_script() -> PathBuf {
    PathBuf::from("scripts/generate_deck.py")
}

fn default_max_upload_mb() -> usize {
    50
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Self = envy::from_env()?;
        config.resolved()
    }

    /// Build from explicit key/value pairs (keys as environment variable names).
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::from_iter(pairs)?;
        config.resolved()
    }

    /// Make relative directories absolute against the working directory.
    fn resolved(mut self) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(ConfigError::WorkingDir)?;
        for dir in [&mut self.upload_dir, &mut self.cards_dir, &mut self.decks_dir] {
            if dir.is_relative() {
                *dir = cwd.join(&*dir);
            }
        }
        Ok(self)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_host, self.backend_port)
            .parse()
            .map_err(|_| ConfigError::BindAddr(format!("{}:{}", self.bind_host, self.backend_port)))
    }

    pub fn synthesis_delay(&self) -> Duration {
        Duration::from_millis(self.synthesis_delay_ms)
    }

    pub fn external_timeout(&self) -> Option<Duration> {
        self.external_timeout_secs.map(Duration::from_secs)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid environment configuration: {0}")]
    Env(#[from] envy::Error),

    #[error("cannot determine working directory: {0}")]
    WorkingDir(std::io::Error),

    #[error("invalid bind address {0}")]
    BindAddr(String),
}
