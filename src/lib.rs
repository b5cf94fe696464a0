//! Reads handwritten exam scores from a photo of the exam sheet.
//!
//! The server relays an uploaded image to a vision-capable chat-completion
//! provider and returns its reply untouched; the client side strips the
//! optional code fence and parses the reply into a [`scores::ScoreMapping`].

pub mod client;
pub mod config;
pub mod error;
pub mod page;
pub mod provider;
pub mod relay;
pub mod scores;

pub use client::ScoreClient;
pub use config::Config;
pub use error::RelayError;
pub use relay::{build_router, AppState, UploadEnvelope};
pub use scores::{parse_scores, ClientError, ScoreMapping, ScoreView};
