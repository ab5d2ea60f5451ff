use serde::Deserialize;

use crate::detection::Classification;

/// Messages the external classifier process sends, one JSON object per datagram.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClassifierMessage {
    /// Capture started; audio output should follow.
    Ready,
    /// Capture torn down.
    Stopped,
    Error { message: String },
    Result { classifications: Vec<Classification> },
}
