use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::models::card::Card;

/// Body of `POST /api/process`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    #[garde(length(min = 1), inner(length(min = 1)))]
    pub files: Vec<String>,

    #[garde(skip)]
    #[serde(default)]
    pub include_topic_cards: bool,

    /// Overrides the configured card budget when greater than zero.
    #[garde(range(max = 500))]
    #[serde(default)]
    pub cards_per_topic: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub message: String,
    pub job_id: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub files: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of `PUT /api/decks/{deckId}/cards/{cardId}`.
#[derive(Debug, Deserialize, Validate)]
pub struct CardEdit {
    #[garde(length(min = 1))]
    pub question: String,

    #[garde(length(min = 1))]
    pub answer: String,
}

/// Body of `POST /api/decks`. Without `cards` the CSV deck of the same name is imported.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDeckRequest {
    #[garde(length(min = 1, max = 200))]
    pub name: String,

    #[garde(dive)]
    #[serde(default)]
    pub cards: Option<Vec<Card>>,
}

#[derive(Debug, Serialize)]
pub struct CsvCardsResponse {
    pub cards: Vec<Card>,
}

/// One entry of `GET /api/cards/list`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CsvDeckSummary {
    pub name: String,
    pub total_cards: usize,
}

#[derive(Debug, Serialize)]
pub struct CsvDeckListResponse {
    pub decks: Vec<CsvDeckSummary>,
}
