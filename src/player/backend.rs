use async_trait::async_trait;
use tokio::sync::mpsc;

use super::session::{PlaybackSession, StreamAsset};
use super::source::StreamSource;
use super::stream_player::PlayerEvent;
use crate::error::PlayerError;

/// A playback engine: resolves stream metadata and opens sessions.
#[async_trait]
pub trait StreamBackend: Send + Sync {
    /// Resolves container/track information for `source`.
    ///
    /// Runs on a spawned task; the result is applied by the player's owner.
    async fn probe(&self, source: &StreamSource) -> Result<StreamAsset, PlayerError>;

    /// Builds a new session from a resolved asset. Called on the player's task.
    fn open_session(&self, asset: StreamAsset, events: SessionEvents) -> Box<dyn PlaybackSession>;
}

/// Lets a session report back to the player that created it.
///
/// Reports are tagged with the load generation, so signals from a replaced
/// session are ignored.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    generation: u64,
    tx: mpsc::UnboundedSender<PlayerEvent>,
}

impl SessionEvents {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<PlayerEvent>) -> Self {
        Self { generation, tx }
    }

    /// The session stopped delivering audio and cannot recover on its own.
    pub fn failed_to_continue(&self) {
        log::warn!("Status: Failed to continue (generation {})", self.generation);
        if self
            .tx
            .send(PlayerEvent::Interrupted { generation: self.generation })
            .is_err()
        {
            log::debug!("Player gone, dropping interruption signal");
        }
    }
}
