//! Error types for the stream player.

use thiserror::Error;

/// Message recorded when a session stops delivering audio mid-stream.
pub const INTERRUPTED_MESSAGE: &str = "Stream was interrupted";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlayerError {
    /// The configured stream URL is missing or malformed. Fatal at startup.
    #[error("invalid stream configuration: {0}")]
    InvalidConfiguration(String),

    /// Stream metadata could not be resolved. The message is shown verbatim.
    #[error("{0}")]
    LoadFailure(String),

    /// An active session stopped unexpectedly.
    #[error("{0}")]
    PlaybackInterruption(String),
}

impl PlayerError {
    pub fn interrupted() -> Self {
        Self::PlaybackInterruption(INTERRUPTED_MESSAGE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_failure_displays_message_verbatim() {
        let err = PlayerError::LoadFailure("network unreachable".into());
        assert_eq!(err.to_string(), "network unreachable");
    }

    #[test]
    fn interruption_uses_fixed_message() {
        assert_eq!(PlayerError::interrupted().to_string(), "Stream was interrupted");
    }
}
