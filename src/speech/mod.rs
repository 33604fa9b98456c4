//! Spoken briefings.
//!
//! Structure:
//! - `http.rs` - synthesis client for an OpenAI-compatible `/audio/speech` endpoint
//! - `flight.rs` - single-flight controller with cancellation
//! - `player.rs` - hands finished clips to an external audio player

mod flight;
mod http;
mod player;

use serde::Serialize;
use std::future::Future;
use std::pin::Pin;

pub use flight::{SpeechController, SpeechOutcome};
#[cfg(test)]
pub(crate) use flight::testing;
pub use http::HttpSynthesizer;
pub use player::{CommandPlayer, NullPlayer, Playback, PlaybackError};

/// Shown when no credential is configured
pub const MISSING_CREDENTIAL_MESSAGE: &str = "Missing OpenAI API key.";
/// Shown when a transport error carries no text
pub const GENERIC_FAILURE_MESSAGE: &str = "Unable to generate briefing.";

/// JSON body of a synthesis request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeechRequest {
    pub model: String,
    pub voice: String,
    pub input: String,
}

/// Synthesized audio for one case summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub case_id: u32,
    /// Encoded audio (mpeg)
    pub bytes: Vec<u8>,
}

/// Speech failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpeechError {
    /// No API key configured; nothing was sent
    #[error("{}", MISSING_CREDENTIAL_MESSAGE)]
    MissingCredential,

    /// A briefing is already being synthesized
    #[error("briefing already in progress")]
    Busy,

    /// Endpoint answered with a non-success status
    #[error("TTS request failed: {0}")]
    Status(u16),

    /// Request never got a response
    #[error("{0}")]
    Transport(String),

    /// Superseded by a case change
    #[error("briefing cancelled")]
    Cancelled,

    /// HTTP client could not be constructed
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

impl SpeechError {
    /// Transport error with the generic fallback for empty messages
    pub fn transport(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            SpeechError::Transport(GENERIC_FAILURE_MESSAGE.to_string())
        } else {
            SpeechError::Transport(message)
        }
    }
}

/// Boxed future returned by [`Synthesizer::synthesize`]
pub type SynthesisFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>, SpeechError>> + Send + 'a>>;

/// Turns text into audio bytes
pub trait Synthesizer: Send + Sync {
    fn synthesize<'a>(&'a self, request: &'a SpeechRequest) -> SynthesisFuture<'a>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let request = SpeechRequest {
            model: "gpt-4o-mini-tts".to_string(),
            voice: "alloy".to_string(),
            input: "Backup required.".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "gpt-4o-mini-tts",
                "voice": "alloy",
                "input": "Backup required."
            })
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(SpeechError::MissingCredential.to_string(), "Missing OpenAI API key.");
        assert_eq!(SpeechError::Status(401).to_string(), "TTS request failed: 401");
        assert_eq!(SpeechError::transport("").to_string(), "Unable to generate briefing.");
        assert_eq!(SpeechError::transport("connection refused").to_string(), "connection refused");
    }
}
