use chrono::Utc;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::models::card::{Card, Deck, StoredCard};
use crate::services::atomic_file::write_atomic;

/// JSON file per deck (`<id>.json`) under the decks directory.
pub struct DeckStore {
    decks_dir: PathBuf,
}

impl DeckStore {
    pub fn new(decks_dir: impl Into<PathBuf>) -> Result<Self, DeckStoreError> {
        let decks_dir = decks_dir.into();
        std::fs::create_dir_all(&decks_dir)?;
        Ok(Self { decks_dir })
    }

    pub fn decks_dir(&self) -> &Path {
        &self.decks_dir
    }

    pub async fn create_deck(&self, name: &str, cards: Vec<Card>) -> Result<Deck, DeckStoreError> {
        let created = Utc::now();
        let deck = Deck {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            cards: cards
                .into_iter()
                .map(|c| StoredCard {
                    id: Uuid::new_v4().to_string(),
                    question: c.question,
                    answer: c.answer,
                    created,
                })
                .collect(),
            created,
        };
        self.save(&deck).await?;
        tracing::info!(deck_id = %deck.id, name, cards = deck.cards.len(), "Deck created");
        Ok(deck)
    }

    pub async fn get_deck(&self, id: &str) -> Result<Deck, DeckStoreError> {
        let path = self.deck_path(id)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DeckStoreError::DeckNotFound(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// All readable decks, oldest first.
    pub async fn list_decks(&self) -> Result<Vec<Deck>, DeckStoreError> {
        let mut entries = tokio::fs::read_dir(&self.decks_dir).await?;
        let mut decks = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match self.get_deck(id).await {
                Ok(deck) => decks.push(deck),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable deck"),
            }
        }

        decks.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        Ok(decks)
    }

    /// Replace a card's question and answer, keeping its id and creation time.
    pub async fn update_card(
        &self,
        deck_id: &str,
        card_id: &str,
        question: String,
        answer: String,
    ) -> Result<StoredCard, DeckStoreError> {
        let mut deck = self.get_deck(deck_id).await?;
        let card = deck
            .cards
            .iter_mut()
            .find(|c| c.id == card_id)
            .ok_or_else(|| DeckStoreError::CardNotFound(card_id.to_string()))?;

        card.question = question;
        card.answer = answer;
        let updated = card.clone();

        self.save(&deck).await?;
        Ok(updated)
    }

    /// Remove a card; remaining cards keep their order.
    pub async fn delete_card(&self, deck_id: &str, card_id: &str) -> Result<(), DeckStoreError> {
        let mut deck = self.get_deck(deck_id).await?;
        let index = deck
            .cards
            .iter()
            .position(|c| c.id == card_id)
            .ok_or_else(|| DeckStoreError::CardNotFound(card_id.to_string()))?;

        deck.cards.remove(index);
        self.save(&deck).await
    }

    async fn save(&self, deck: &Deck) -> Result<(), DeckStoreError> {
        let path = self.deck_path(&deck.id)?;
        let bytes = serde_json::to_vec_pretty(deck)?;
        write_atomic(&path, bytes).await?;
        Ok(())
    }

    fn deck_path(&self, id: &str) -> Result<PathBuf, DeckStoreError> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(DeckStoreError::DeckNotFound(id.to_string()));
        }
        Ok(self.decks_dir.join(format!("{id}.json")))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeckStoreError {
    #[error("deck not found: {0}")]
    DeckNotFound(String),

    #[error("card not found: {0}")]
    CardNotFound(String),

    #[error("failed to encode or decode deck: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
