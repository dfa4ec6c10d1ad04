use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::card::{Deck, StoredCard};
use crate::models::requests::{CardEdit, CreateDeckRequest, MessageResponse};

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| ApiError::validation(format!("Invalid request body: {}", e.body_text())))
}

/// GET /api/decks
pub async fn list_decks(State(state): State<AppState>) -> Result<Json<Vec<Deck>>, ApiError> {
    Ok(Json(state.decks.list_decks().await?))
}

/// POST /api/decks: Create a deck from explicit cards or from the CSV deck of the same name.
pub async fn create_deck(
    State(state): State<AppState>,
    payload: Result<Json<CreateDeckRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Deck>), ApiError> {
    let request = body(payload)?;
    request.validate()?;

    let cards = match request.cards {
        Some(cards) => cards,
        None => state.cards.read_cards(&request.name).await?,
    };

    let deck = state.decks.create_deck(&request.name, cards).await?;
    Ok((StatusCode::CREATED, Json(deck)))
}

/// GET /api/cards/{deck_id}
pub async fn get_deck_cards(
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
) -> Result<Json<Vec<StoredCard>>, ApiError> {
    let deck = state.decks.get_deck(&deck_id).await?;
    Ok(Json(deck.cards))
}

/// PUT /api/decks/{deck_id}/cards/{card_id}
pub async fn update_card(
    State(state): State<AppState>,
    Path((deck_id, card_id)): Path<(String, String)>,
    payload: Result<Json<CardEdit>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let edit = body(payload)?;
    edit.validate()?;

    state
        .decks
        .update_card(&deck_id, &card_id, edit.question, edit.answer)
        .await?;
    Ok(Json(MessageResponse::new("Card updated successfully")))
}

/// DELETE /api/decks/{deck_id}/cards/{card_id}
pub async fn delete_card(
    State(state): State<AppState>,
    Path((deck_id, card_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.decks.delete_card(&deck_id, &card_id).await?;
    Ok(Json(MessageResponse::new("Card deleted successfully")))
}
