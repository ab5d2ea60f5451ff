use std::sync::{Arc, Weak};

use tokio::sync::mpsc;

use super::backend::{SessionEvents, StreamBackend};
use super::observer::{ErrorObserver, ObserverList, ReadinessObserver};
use super::session::{PlaybackSession, SessionStatus, StreamAsset};
use super::source::StreamSource;
use crate::error::PlayerError;

/// Buffered seconds above which the buffer counts as full.
pub const BUFFER_FULL_SECONDS: f64 = 45.0;

/// Returned by `buffer_available_seconds` when the buffer cannot be measured.
pub const BUFFER_UNKNOWN: f64 = f64::NAN;

/// Asynchronous results the player's owner must feed back through
/// `StreamPlayer::handle_event`.
#[derive(Debug)]
pub enum PlayerEvent {
    /// A metadata probe finished.
    Loaded {
        generation: u64,
        result: Result<StreamAsset, PlayerError>,
    },
    /// A session reported that playback cannot continue.
    Interrupted { generation: u64 },
}

/// Player for a single live network stream.
///
/// All state lives on the task that owns the player. `load` spawns the probe
/// on the tokio runtime and the outcome comes back as a `PlayerEvent` on the
/// receiver returned by `new`, so every mutation and every observer callback
/// happens on the owner's task.
pub struct StreamPlayer {
    source: StreamSource,
    backend: Arc<dyn StreamBackend>,
    session: Option<Box<dyn PlaybackSession>>,
    generation: u64,
    // load generation that installed `session`
    session_generation: u64,
    ready: bool,
    error_message: String,
    playing: bool,
    error_observers: ObserverList<dyn ErrorObserver>,
    readiness_observers: ObserverList<dyn ReadinessObserver>,
    events_tx: mpsc::UnboundedSender<PlayerEvent>,
}

impl StreamPlayer {
    pub fn new(
        source: StreamSource,
        backend: Arc<dyn StreamBackend>,
    ) -> (Self, mpsc::UnboundedReceiver<PlayerEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        log::info!("Initializing new player for {}", source);
        let player = Self {
            source,
            backend,
            session: None,
            generation: 0,
            session_generation: 0,
            ready: false,
            error_message: String::new(),
            playing: false,
            error_observers: ObserverList::new(),
            readiness_observers: ObserverList::new(),
            events_tx,
        };
        (player, events_rx)
    }

    pub fn source(&self) -> &StreamSource {
        &self.source
    }

    /// Starts a new load cycle.
    ///
    /// Clears the error message, then probes the stream off-task. Any
    /// in-flight probe from an earlier call is superseded: its result is
    /// discarded when it arrives. Must be called inside a tokio runtime.
    pub fn load(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        self.set_error_message(String::new());

        log::info!("Loading stream {} (generation {})", self.source, generation);

        let backend = Arc::clone(&self.backend);
        let source = self.source.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = backend.probe(&source).await;
            if tx.send(PlayerEvent::Loaded { generation, result }).is_err() {
                log::debug!("Player dropped before probe {} completed", generation);
            }
        });
    }

    /// Re-establishes the stream from scratch. Same protocol as `load`.
    pub fn reset_player(&mut self) {
        self.load();
    }

    /// Applies an asynchronous result. Stale generations are ignored.
    pub fn handle_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Loaded { generation, result } => {
                if generation != self.generation {
                    log::debug!(
                        "Discarding stale load result (generation {}, current {})",
                        generation,
                        self.generation
                    );
                    return;
                }
                match result {
                    Ok(asset) => self.install_session(asset),
                    Err(e) => {
                        log::error!("Failed to load {}: {}", self.source, e);
                        self.set_error_message(e.to_string());
                    }
                }
            }
            PlayerEvent::Interrupted { generation } => {
                // a reload still probing does not retire the installed session
                if self.session.is_none() || generation != self.session_generation {
                    log::debug!("Ignoring interruption from replaced session {}", generation);
                    return;
                }
                self.set_error_message(PlayerError::interrupted().to_string());
            }
        }
    }

    fn install_session(&mut self, asset: StreamAsset) {
        log::info!(
            "Stream ready: name={:?}, type={:?}, bitrate={:?}kbps",
            asset.name,
            asset.content_type,
            asset.bitrate_kbps
        );
        let events = SessionEvents::new(self.generation, self.events_tx.clone());
        let session = self.backend.open_session(asset, events);
        // the previous session is dropped here, releasing its connection
        if self.session.replace(session).is_some() {
            log::debug!("Replaced previous playback session");
        }
        self.session_generation = self.generation;
        self.set_ready(true);
    }

    pub fn play(&mut self) {
        match self.session.as_mut() {
            Some(session) => session.play(),
            None => log::debug!("play() before a session exists"),
        }
        self.playing = true;
        log::info!("Radio is playing");
    }

    pub fn pause(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.pause();
        }
        self.playing = false;
        log::info!("Radio is not playing");
    }

    /// Whether `play` was called more recently than `pause`. Stalls do not
    /// affect this flag.
    pub fn currently_playing(&self) -> bool {
        self.playing
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Last load or playback failure; empty when there is none.
    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Duration of the first loaded range of the current session.
    ///
    /// This is not "seconds ahead of the playhead": it ignores the playback
    /// position and any further ranges. Returns `BUFFER_UNKNOWN` (NaN) when
    /// there is no session, the session is not ready, or nothing is loaded.
    pub fn buffer_available_seconds(&self) -> f64 {
        let Some(session) = self.session.as_ref() else {
            return BUFFER_UNKNOWN;
        };
        if session.status() != SessionStatus::ReadyToPlay {
            return BUFFER_UNKNOWN;
        }
        session
            .loaded_time_ranges()
            .first()
            .map(|range| range.duration)
            .unwrap_or(BUFFER_UNKNOWN)
    }

    /// True iff more than `BUFFER_FULL_SECONDS` are buffered. NaN is never full.
    pub fn buffer_full(&self) -> bool {
        self.buffer_available_seconds() > BUFFER_FULL_SECONDS
    }

    pub fn add_error_observer<O: ErrorObserver + 'static>(&mut self, observer: &Arc<O>) {
        let weak = Arc::downgrade(observer) as Weak<dyn ErrorObserver>;
        self.error_observers.register(weak);
    }

    pub fn add_readiness_observer<O: ReadinessObserver + 'static>(&mut self, observer: &Arc<O>) {
        let weak = Arc::downgrade(observer) as Weak<dyn ReadinessObserver>;
        self.readiness_observers.register(weak);
    }

    #[cfg(test)]
    pub fn remove_error_observer<O: ErrorObserver + 'static>(&mut self, observer: &Arc<O>) {
        let weak = Arc::downgrade(observer) as Weak<dyn ErrorObserver>;
        self.error_observers.unregister(&weak);
    }

    #[cfg(test)]
    pub fn remove_readiness_observer<O: ReadinessObserver + 'static>(&mut self, observer: &Arc<O>) {
        let weak = Arc::downgrade(observer) as Weak<dyn ReadinessObserver>;
        self.readiness_observers.unregister(&weak);
    }

    // Every write notifies, even when the value is unchanged.
    fn set_error_message(&mut self, message: String) {
        self.error_message = message;
        let message = self.error_message.as_str();
        self.error_observers.notify(|o| o.error_message_changed(message));
    }

    fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
        self.readiness_observers.notify(|o| o.readiness_changed(ready));
    }
}
