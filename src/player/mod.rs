//! player - Live network stream player
//!
//! `StreamPlayer` owns one playback session at a time and exposes play/pause,
//! reload and buffer-health queries. Concrete engines plug in through the
//! `StreamBackend` trait; `HttpStreamBackend` is the production one.

mod backend;
mod http_backend;
mod observer;
mod session;
mod source;
mod stream_player;

pub use backend::StreamBackend;
pub use http_backend::{HttpBackendConfig, HttpStreamBackend};
pub use observer::{ErrorObserver, ReadinessObserver};
pub use source::StreamSource;
pub use stream_player::{PlayerEvent, StreamPlayer};

#[cfg(test)]
pub use backend::SessionEvents;
#[cfg(test)]
pub use session::{PlaybackSession, SessionStatus, StreamAsset, TimeRange};
