//! One CSV file per deck under the cards directory.
//!
//! Files start with a `Question,Answer` header and every field is quoted,
//! with embedded quotes doubled.

use std::path::{Path, PathBuf};

use crate::models::card::Card;
use crate::models::requests::CsvDeckSummary;
use crate::services::atomic_file::write_atomic;

const HEADER: [&str; 2] = ["Question", "Answer"];

pub struct CardStore {
    cards_dir: PathBuf,
}

impl CardStore {
    pub fn new(cards_dir: impl Into<PathBuf>) -> Result<Self, CardStoreError> {
        let cards_dir = cards_dir.into();
        std::fs::create_dir_all(&cards_dir)?;
        Ok(Self { cards_dir })
    }

    pub fn cards_dir(&self) -> &Path {
        &self.cards_dir
    }

    /// CSV path for a deck name. Only the final path component of `deck_name` is used.
    pub fn csv_path(&self, deck_name: &str) -> Result<PathBuf, CardStoreError> {
        let name = sanitize_deck_name(deck_name)?;
        Ok(self.cards_dir.join(format!("{name}.csv")))
    }

    pub async fn exists(&self, deck_name: &str) -> Result<bool, CardStoreError> {
        let path = self.csv_path(deck_name)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    /// Overwrite the deck's CSV file with `cards`.
    pub async fn write_cards(&self, deck_name: &str, cards: &[Card]) -> Result<PathBuf, CardStoreError> {
        let path = self.csv_path(deck_name)?;
        let bytes = encode(cards)?;

        write_atomic(&path, bytes).await?;

        tracing::debug!(path = %path.display(), cards = cards.len(), "Cards written");
        Ok(path)
    }

    pub async fn read_cards(&self, deck_name: &str) -> Result<Vec<Card>, CardStoreError> {
        let path = self.csv_path(deck_name)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CardStoreError::NotFound(deck_name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        decode(&bytes)
    }

    /// Every CSV deck with its row count, sorted by name. Unreadable files are skipped.
    pub async fn list(&self) -> Result<Vec<CsvDeckSummary>, CardStoreError> {
        let mut entries = tokio::fs::read_dir(&self.cards_dir).await?;
        let mut decks = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let bytes = match tokio::fs::read(&path).await {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable CSV");
                    continue;
                }
            };
            match count_rows(&bytes) {
                Ok(total_cards) => decks.push(CsvDeckSummary {
                    name: name.to_string(),
                    total_cards,
                }),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping malformed CSV"),
            }
        }

        decks.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(decks)
    }
}

/// Reduce a user-supplied deck name to a safe file stem.
pub fn sanitize_deck_name(deck_name: &str) -> Result<String, CardStoreError> {
    let base = Path::new(deck_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    let base = base.strip_suffix(".csv").unwrap_or(base);

    if base.is_empty() || base == "." || base == ".." {
        return Err(CardStoreError::InvalidName(deck_name.to_string()));
    }
    Ok(base.to_string())
}

fn encode(cards: &[Card]) -> Result<Vec<u8>, CardStoreError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(HEADER)?;
    for card in cards {
        writer.write_record([&card.question, &card.answer])?;
    }
    writer
        .into_inner()
        .map_err(|e| CardStoreError::Io(e.into_error()))
}

fn decode(bytes: &[u8]) -> Result<Vec<Card>, CardStoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let mut cards = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let (Some(q), Some(a)) = (record.get(0), record.get(1)) {
            cards.push(Card::new(q, a));
        }
    }
    Ok(cards)
}

fn count_rows(bytes: &[u8]) -> Result<usize, CardStoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);
    let mut count = 0;
    for record in reader.records() {
        record?;
        count += 1;
    }
    Ok(count)
}

#[derive(Debug, thiserror::Error)]
pub enum CardStoreError {
    #[error("CSV file not found for deck {0}")]
    NotFound(String),

    #[error("invalid deck name: {0:?}")]
    InvalidName(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
