pub mod atomic_file;
pub mod card_parser;
pub mod card_store;
pub mod chunker;
pub mod deck_store;
pub mod exporter;
pub mod normalizer;
pub mod ocr;
pub mod processor;
pub mod registry;
pub mod synthesis;
