//! Flashcard Forge
//!
//! Backend for turning uploaded PDF lecture notes into question/answer
//! flashcards: OCR through an external script, text cleanup, card synthesis
//! through a chat-completion API, and CSV/JSON deck storage with package export.

pub mod app_state;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
