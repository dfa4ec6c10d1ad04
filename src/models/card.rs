use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

/// A question/answer pair as produced by the synthesizer and kept in CSV files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Card {
    #[garde(length(min = 1))]
    pub question: String,

    #[garde(length(min = 1))]
    pub answer: String,
}

impl Card {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// A card held inside a JSON deck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCard {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub created: DateTime<Utc>,
}

/// A JSON-backed deck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    pub id: String,
    pub name: String,
    pub cards: Vec<StoredCard>,
    pub created: DateTime<Utc>,
}
