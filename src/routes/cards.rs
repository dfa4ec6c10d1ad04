use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use garde::Validate;
use serde_json::json;
use tokio_util::io::ReaderStream;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::card::Card;
use crate::models::requests::{CsvCardsResponse, CsvDeckListResponse, MessageResponse};
use crate::services::card_store::sanitize_deck_name;

/// GET /api/cards/list
pub async fn list_csv_decks(
    State(state): State<AppState>,
) -> Result<Json<CsvDeckListResponse>, ApiError> {
    let decks = state.cards.list().await?;
    Ok(Json(CsvDeckListResponse { decks }))
}

/// GET /api/cards/csv/{deck_name}
pub async fn get_csv_cards(
    State(state): State<AppState>,
    Path(deck_name): Path<String>,
) -> Result<Json<CsvCardsResponse>, ApiError> {
    let cards = state.cards.read_cards(&deck_name).await?;
    Ok(Json(CsvCardsResponse { cards }))
}

/// PUT /api/cards/csv/{deck_name}: Replace the whole CSV deck.
pub async fn update_csv_cards(
    State(state): State<AppState>,
    Path(deck_name): Path<String>,
    payload: Result<Json<Vec<Card>>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(cards) = payload
        .map_err(|e| ApiError::validation(format!("Invalid cards data: {}", e.body_text())))?;
    for card in &cards {
        card.validate()?;
    }

    state.cards.write_cards(&deck_name, &cards).await?;
    tracing::info!(deck = %deck_name, cards = cards.len(), "CSV deck updated");
    Ok(Json(MessageResponse::new("Cards updated successfully")))
}

/// GET /api/cards/apkg/{deck_name}: Export the CSV deck and stream the package.
pub async fn export_package(
    State(state): State<AppState>,
    Path(deck_name): Path<String>,
) -> Result<Response, ApiError> {
    let deck_name = sanitize_deck_name(&deck_name)?;
    let csv_path = state.cards.csv_path(&deck_name)?;
    if !state.cards.exists(&deck_name).await? {
        return Err(ApiError::not_found("CSV file not found"));
    }

    let package_path = state
        .exporter
        .export(&csv_path, &deck_name)
        .await
        .map_err(|e| ApiError::ExternalTool {
            message: e.to_string(),
            details: json!({
                "deckName": deck_name,
                "csvPath": csv_path.display().to_string(),
                "message": "Failed to generate deck package",
            }),
        })?;

    let file = tokio::fs::File::open(&package_path)
        .await
        .map_err(|e| ApiError::Persistence(format!("Failed to open generated package: {e}")))?;
    let body = Body::from_stream(ReaderStream::new(file));

    let headers = [
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={deck_name}.apkg"),
        ),
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::HeaderName::from_static("content-description"),
            "File Transfer".to_string(),
        ),
        (
            header::HeaderName::from_static("content-transfer-encoding"),
            "binary".to_string(),
        ),
    ];

    Ok((headers, body).into_response())
}
