use url::Url;

/// Readiness of a playback session, as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Nothing playable yet.
    Unknown,
    ReadyToPlay,
    /// The session can no longer deliver audio.
    Failed,
}

/// A contiguous span of stream data the session holds, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub duration: f64,
}

impl TimeRange {
    pub fn new(start: f64, duration: f64) -> Self {
        Self { start, duration }
    }
}

/// Metadata resolved by probing a stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamAsset {
    pub url: Url,
    pub content_type: Option<String>,
    /// `icy-name`
    pub name: Option<String>,
    /// `icy-genre`
    pub genre: Option<String>,
    /// `icy-br`, in kbit/s
    pub bitrate_kbps: Option<u32>,
}

impl StreamAsset {
    #[cfg(test)]
    pub fn new(url: Url) -> Self {
        Self {
            url,
            content_type: None,
            name: None,
            genre: None,
            bitrate_kbps: None,
        }
    }
}

/// Live handle to one loaded stream.
///
/// Sessions are owned exclusively by `StreamPlayer` and replaced wholesale on
/// reload; dropping a session must release everything it holds.
pub trait PlaybackSession: Send {
    fn play(&mut self);
    fn pause(&mut self);
    fn status(&self) -> SessionStatus;
    /// Loaded ranges in the order the engine reports them.
    fn loaded_time_ranges(&self) -> Vec<TimeRange>;
}
