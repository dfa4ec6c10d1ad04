use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

use flashcard_forge::app_state::AppState;
use flashcard_forge::config::AppConfig;
use flashcard_forge::routes;
use flashcard_forge::services::{
    card_store::CardStore,
    deck_store::DeckStore,
    exporter::ScriptExporter,
    ocr::CommandExtractor,
    processor::JobProcessor,
    registry::JobRegistry,
    synthesis::{CardSynthesizer, OpenAiClient, SynthesisSettings},
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing flashcard-forge server");

    if config.openai_api_key.is_empty() {
        tracing::warn!("OPENAI_API_KEY is not set; card synthesis will fail");
    }

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .expect("Failed to create upload directory");

    let prometheus_handle =
        routes::metrics::install_recorder().expect("Failed to install Prometheus metrics recorder");

    // Storage
    let cards = Arc::new(CardStore::new(&config.cards_dir).expect("Failed to prepare cards directory"));
    let decks = DeckStore::new(&config.decks_dir).expect("Failed to prepare decks directory");
    let exporter = Arc::new(ScriptExporter::new(
        &config.python_bin,
        &config.export_script,
        decks.decks_dir(),
    ));

    // External tools
    tracing::info!(
        base_url = %config.openai_base_url,
        model = %config.openai_model,
        "Initializing chat-completion client"
    );
    let generator = OpenAiClient::new(
        &config.openai_base_url,
        &config.openai_api_key,
        &config.openai_model,
        config.external_timeout(),
    )
    .expect("Failed to initialize chat-completion client");
    let synthesizer = CardSynthesizer::new(
        Arc::new(generator),
        SynthesisSettings {
            chunk_words: config.chunk_words,
            call_delay: config.synthesis_delay(),
        },
    );
    let extractor = CommandExtractor::new(&config.python_bin, &config.extract_script)
        .with_timeout(config.external_timeout());

    // Background processing
    let shutdown = CancellationToken::new();
    let processor = Arc::new(JobProcessor::new(
        Arc::new(JobRegistry::new()),
        Arc::new(extractor),
        Arc::new(synthesizer),
        Arc::clone(&cards),
        shutdown.clone(),
        config.cards_per_topic,
    ));

    let state = AppState::new(config.upload_dir.clone(), processor, cards, decks, exporter);

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .expect("Invalid CORS_ORIGIN"),
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let app = Router::new()
        .merge(routes::router(state, config.max_upload_bytes()))
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(cors);

    let bind_addr = config.bind_addr().expect("Invalid bind address");
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .expect("Server error");

    tracing::info!("Server stopped");
}

async fn shutdown_signal(token: CancellationToken) {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, cancelling running jobs");
    token.cancel();
}
