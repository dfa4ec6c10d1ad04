use std::path::PathBuf;
use std::sync::Arc;

use crate::services::{
    card_store::CardStore, deck_store::DeckStore, exporter::DeckExporter,
    processor::JobProcessor, registry::JobRegistry,
};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub upload_dir: Arc<PathBuf>,
    pub registry: Arc<JobRegistry>,
    pub processor: Arc<JobProcessor>,
    pub cards: Arc<CardStore>,
    pub decks: Arc<DeckStore>,
    pub exporter: Arc<dyn DeckExporter>,
}

impl AppState {
    pub fn new(
        upload_dir: PathBuf,
        processor: Arc<JobProcessor>,
        cards: Arc<CardStore>,
        decks: DeckStore,
        exporter: Arc<dyn DeckExporter>,
    ) -> Self {
        Self {
            upload_dir: Arc::new(upload_dir),
            registry: processor.registry().clone(),
            processor,
            cards,
            decks: Arc::new(decks),
            exporter,
        }
    }
}
