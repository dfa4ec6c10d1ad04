use axum::extract::State;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;

/// Install the global Prometheus recorder and describe the application metrics.
pub fn install_recorder() -> Result<Arc<PrometheusHandle>, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    metrics::describe_counter!("jobs_submitted_total", "Card generation jobs accepted");
    metrics::describe_counter!("jobs_completed_total", "Card generation jobs completed");
    metrics::describe_counter!(
        "jobs_failed_total",
        "Card generation jobs that ended in the failed state"
    );
    metrics::describe_counter!("cards_generated_total", "Cards written to CSV decks");
    metrics::describe_counter!(
        "synthesis_requests_total",
        "Requests sent to the text generation API"
    );
    metrics::describe_histogram!(
        "job_processing_seconds",
        "Wall time from job start to its terminal state"
    );

    Ok(Arc::new(handle))
}

/// Prometheus scrape endpoint.
pub async fn prometheus_metrics(State(handle): State<Arc<PrometheusHandle>>) -> impl IntoResponse {
    handle.render()
}
