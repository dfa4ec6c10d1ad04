pub mod cards;
pub mod decks;
pub mod health;
pub mod metrics;
pub mod process;
pub mod upload;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// All `/api` routes with tracing, compression and the upload size limit applied.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/upload", post(upload::upload_pdfs))
        .route("/api/process", post(process::start_processing))
        .route("/api/process/{job_id}", get(process::get_processing_status))
        .route("/api/decks", get(decks::list_decks).post(decks::create_deck))
        .route(
            "/api/decks/{deck_id}/cards/{card_id}",
            put(decks::update_card).delete(decks::delete_card),
        )
        .route("/api/cards/list", get(cards::list_csv_decks))
        .route("/api/cards/{deck_id}", get(decks::get_deck_cards))
        .route(
            "/api/cards/csv/{deck_name}",
            get(cards::get_csv_cards).put(cards::update_csv_cards),
        )
        .route("/api/cards/apkg/{deck_name}", get(cards::export_package))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
}
