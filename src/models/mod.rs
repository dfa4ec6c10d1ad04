pub mod card;
pub mod job;
pub mod requests;
