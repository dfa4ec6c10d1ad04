use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use std::path::Path;

use crate::app_state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub jobs: usize,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub uploads: ComponentHealth,
    pub cards: ComponentHealth,
    pub decks: ComponentHealth,
}

#[derive(Serialize)]
pub struct ComponentHealth {
    pub status: String,
}

async fn check_dir(path: &Path) -> ComponentHealth {
    let ok = tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    ComponentHealth {
        status: if ok { "ok" } else { "error" }.to_string(),
    }
}

/// GET /api/health: Liveness plus storage directory checks.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let checks = HealthChecks {
        uploads: check_dir(&state.upload_dir).await,
        cards: check_dir(state.cards.cards_dir()).await,
        decks: check_dir(state.decks.decks_dir()).await,
    };

    let all_healthy = [&checks.uploads, &checks.cards, &checks.decks]
        .iter()
        .all(|c| c.status == "ok");
    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if all_healthy { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        jobs: state.registry.len(),
        checks,
    };

    (status_code, Json(response))
}
