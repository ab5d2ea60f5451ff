//! Scripted fakes shared by unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::dialer::Dialer;
use crate::error::PlayerError;
use crate::player::{
    ErrorObserver, PlaybackSession, ReadinessObserver, SessionEvents, SessionStatus,
    StreamAsset, StreamBackend, StreamSource, TimeRange,
};

pub enum FakeOutcome {
    Ready(Vec<TimeRange>),
    Fail(String),
}

impl FakeOutcome {
    pub fn ready(ranges: Vec<TimeRange>) -> Self {
        Self::Ready(ranges)
    }

    pub fn fail(message: &str) -> Self {
        Self::Fail(message.to_string())
    }
}

struct FakeSessionState {
    status: SessionStatus,
    ranges: Vec<TimeRange>,
    playing: bool,
    dropped: bool,
}

/// Test-side view of a session the fake backend opened.
#[derive(Clone)]
pub struct FakeSessionHandle {
    state: Arc<Mutex<FakeSessionState>>,
    events: SessionEvents,
}

impl FakeSessionHandle {
    pub fn set_ranges(&self, ranges: Vec<TimeRange>) {
        self.state.lock().unwrap().ranges = ranges;
    }

    pub fn set_status(&self, status: SessionStatus) {
        self.state.lock().unwrap().status = status;
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().unwrap().playing
    }

    pub fn is_dropped(&self) -> bool {
        self.state.lock().unwrap().dropped
    }

    pub fn interrupt(&self) {
        self.events.failed_to_continue();
    }
}

struct FakeSession {
    state: Arc<Mutex<FakeSessionState>>,
}

impl PlaybackSession for FakeSession {
    fn play(&mut self) {
        self.state.lock().unwrap().playing = true;
    }

    fn pause(&mut self) {
        self.state.lock().unwrap().playing = false;
    }

    fn status(&self) -> SessionStatus {
        self.state.lock().unwrap().status
    }

    fn loaded_time_ranges(&self) -> Vec<TimeRange> {
        self.state.lock().unwrap().ranges.clone()
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.state.lock().unwrap().dropped = true;
    }
}

/// Backend whose probes pop pre-scripted outcomes in call order.
#[derive(Default)]
pub struct FakeBackend {
    outcomes: Mutex<VecDeque<FakeOutcome>>,
    pending_ranges: Mutex<VecDeque<Vec<TimeRange>>>,
    sessions: Mutex<Vec<FakeSessionHandle>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, outcome: FakeOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    /// The `index`-th session opened, in creation order.
    pub fn session(&self, index: usize) -> FakeSessionHandle {
        self.sessions.lock().unwrap()[index].clone()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

#[async_trait]
impl StreamBackend for FakeBackend {
    async fn probe(&self, source: &StreamSource) -> Result<StreamAsset, PlayerError> {
        let outcome = self.outcomes.lock().unwrap().pop_front();
        match outcome {
            Some(FakeOutcome::Ready(ranges)) => {
                self.pending_ranges.lock().unwrap().push_back(ranges);
                Ok(StreamAsset::new(source.url().clone()))
            }
            Some(FakeOutcome::Fail(message)) => Err(PlayerError::LoadFailure(message)),
            None => Err(PlayerError::LoadFailure("no scripted outcome".into())),
        }
    }

    fn open_session(&self, _asset: StreamAsset, events: SessionEvents) -> Box<dyn PlaybackSession> {
        let ranges = self
            .pending_ranges
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();
        let state = Arc::new(Mutex::new(FakeSessionState {
            status: SessionStatus::ReadyToPlay,
            ranges,
            playing: false,
            dropped: false,
        }));
        self.sessions.lock().unwrap().push(FakeSessionHandle {
            state: state.clone(),
            events,
        });
        Box::new(FakeSession { state })
    }
}

/// Records every notification it receives.
#[derive(Default)]
pub struct RecordingObserver {
    errors: Mutex<Vec<String>>,
    readiness: Mutex<Vec<bool>>,
}

impl RecordingObserver {
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn readiness(&self) -> Vec<bool> {
        self.readiness.lock().unwrap().clone()
    }
}

impl ErrorObserver for RecordingObserver {
    fn error_message_changed(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

impl ReadinessObserver for RecordingObserver {
    fn readiness_changed(&self, ready: bool) {
        self.readiness.lock().unwrap().push(ready);
    }
}

/// Dialer that only remembers the numbers it was asked to call.
#[derive(Default)]
pub struct RecordingDialer {
    calls: Mutex<Vec<String>>,
}

impl RecordingDialer {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Dialer for RecordingDialer {
    async fn dial(&self, number: &str) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(number.to_string());
        Ok(())
    }
}
