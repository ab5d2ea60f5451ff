//! HTTP(S) live stream engine.
//!
//! The probe issues a GET, checks the status and the `content-type`, and
//! collects Icecast/Shoutcast `icy-*` headers. A session then downloads the
//! body into a bounded buffer and plays it out at the stream's byte rate:
//!
//! - download task: response body → buffer (waits while the buffer is full)
//! - playout task: buffer → output channel, one 100 ms slice per tick while playing
//!
//! Bytes are never decoded; the output channel feeds an external renderer.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use url::Url;
use uuid::Uuid;

use super::backend::{SessionEvents, StreamBackend};
use super::session::{PlaybackSession, SessionStatus, StreamAsset, TimeRange};
use super::source::StreamSource;
use crate::config::Config;
use crate::error::PlayerError;

const PLAYOUT_TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    pub user_agent: String,
    /// Used when the server does not advertise `icy-br`.
    pub default_bitrate_kbps: u32,
    /// Upper bound on buffered audio; the download pauses beyond it.
    pub max_buffer_seconds: u32,
}

impl HttpBackendConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            user_agent: config.stream_user_agent.clone(),
            default_bitrate_kbps: config.default_bitrate_kbps,
            max_buffer_seconds: config.max_buffer_seconds,
        }
    }
}

pub struct HttpStreamBackend {
    client: reqwest::Client,
    config: HttpBackendConfig,
    output: Option<mpsc::Sender<Bytes>>,
}

impl HttpStreamBackend {
    /// `output` receives played-out stream bytes; `None` discards them.
    pub fn new(
        config: HttpBackendConfig,
        output: Option<mpsc::Sender<Bytes>>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, config, output })
    }
}

#[async_trait]
impl StreamBackend for HttpStreamBackend {
    async fn probe(&self, source: &StreamSource) -> Result<StreamAsset, PlayerError> {
        let response = self
            .client
            .get(source.url().clone())
            .send()
            .await
            .map_err(|e| PlayerError::LoadFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlayerError::LoadFailure(format!(
                "stream returned HTTP {}",
                status
            )));
        }

        let asset = asset_from_headers(response.url().clone(), response.headers());
        if let Some(content_type) = &asset.content_type {
            if !is_audio_content_type(content_type) {
                return Err(PlayerError::LoadFailure(format!(
                    "unsupported stream format: {}",
                    content_type
                )));
            }
        }
        // only the headers were needed; dropping the response closes the body
        Ok(asset)
    }

    fn open_session(&self, asset: StreamAsset, events: SessionEvents) -> Box<dyn PlaybackSession> {
        Box::new(HttpSession::start(
            self.client.clone(),
            asset,
            events,
            &self.config,
            self.output.clone(),
        ))
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn asset_from_headers(url: Url, headers: &HeaderMap) -> StreamAsset {
    let content_type = header_str(headers, CONTENT_TYPE.as_str()).map(|ct| {
        ct.split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    });
    // icy-br is sometimes sent as "128,128"
    let bitrate_kbps = header_str(headers, "icy-br")
        .and_then(|br| br.split(',').next().and_then(|b| b.trim().parse::<u32>().ok()))
        .filter(|br| *br > 0);

    StreamAsset {
        url,
        content_type,
        name: header_str(headers, "icy-name"),
        genre: header_str(headers, "icy-genre"),
        bitrate_kbps,
    }
}

fn is_audio_content_type(content_type: &str) -> bool {
    content_type.starts_with("audio/")
        || content_type == "application/ogg"
        || content_type == "application/octet-stream"
}

#[derive(Default)]
struct BufferState {
    chunks: VecDeque<Bytes>,
    buffered: usize,
    played: u64,
    received_any: bool,
    finished: bool,
    failed: bool,
}

enum Playout {
    Data(Vec<Bytes>),
    Stalled,
    Exhausted,
}

struct Shared {
    state: Mutex<BufferState>,
    playing: AtomicBool,
    space: Notify,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits until the buffer has room and returns how many bytes fit.
    async fn wait_for_space(&self, capacity: usize) -> usize {
        loop {
            let buffered = self.lock().buffered;
            if buffered < capacity {
                return capacity - buffered;
            }
            self.space.notified().await;
        }
    }

    fn push_chunk(&self, chunk: Bytes, id: Uuid) {
        let mut state = self.lock();
        if !state.received_any {
            state.received_any = true;
            log::info!("[{}] First stream data received, ready to play", id);
        }
        state.buffered += chunk.len();
        state.chunks.push_back(chunk);
    }

    fn mark_finished(&self) {
        self.lock().finished = true;
    }

    /// Removes up to `budget` bytes from the front of the buffer.
    fn take(&self, budget: usize) -> Playout {
        let mut state = self.lock();
        let mut taken = Vec::new();
        let mut remaining = budget;

        while remaining > 0 {
            let Some(front) = state.chunks.front_mut() else {
                break;
            };
            let part = if front.len() > remaining {
                front.split_to(remaining)
            } else {
                state.chunks.pop_front().unwrap_or_default()
            };
            remaining -= part.len();
            taken.push(part);
        }

        let consumed = budget - remaining;
        if consumed == 0 {
            if state.finished {
                state.failed = true;
                return Playout::Exhausted;
            }
            return Playout::Stalled;
        }
        state.buffered -= consumed;
        state.played += consumed as u64;
        Playout::Data(taken)
    }
}

/// One live connection to the stream.
pub struct HttpSession {
    id: Uuid,
    shared: Arc<Shared>,
    byte_rate: f64,
    download: JoinHandle<()>,
    playout: JoinHandle<()>,
}

impl HttpSession {
    fn start(
        client: reqwest::Client,
        asset: StreamAsset,
        events: SessionEvents,
        config: &HttpBackendConfig,
        output: Option<mpsc::Sender<Bytes>>,
    ) -> Self {
        let id = Uuid::new_v4();
        let bitrate_kbps = asset
            .bitrate_kbps
            .unwrap_or(config.default_bitrate_kbps)
            .max(1);
        let byte_rate = f64::from(bitrate_kbps) * 1000.0 / 8.0;
        let capacity = ((byte_rate * f64::from(config.max_buffer_seconds.max(1))) as usize).max(1);

        log::info!(
            "[{}] Opening session for {} at {}kbps, buffer cap {}s",
            id,
            asset.url,
            bitrate_kbps,
            config.max_buffer_seconds
        );

        let shared = Arc::new(Shared {
            state: Mutex::new(BufferState::default()),
            playing: AtomicBool::new(false),
            space: Notify::new(),
        });

        let download = tokio::spawn(download_task(
            client,
            asset.url,
            shared.clone(),
            capacity,
            id,
        ));
        let playout = tokio::spawn(playout_task(shared.clone(), byte_rate, output, events, id));

        Self {
            id,
            shared,
            byte_rate,
            download,
            playout,
        }
    }
}

impl PlaybackSession for HttpSession {
    fn play(&mut self) {
        self.shared.playing.store(true, Ordering::Relaxed);
        log::debug!("[{}] play", self.id);
    }

    fn pause(&mut self) {
        self.shared.playing.store(false, Ordering::Relaxed);
        log::debug!("[{}] pause", self.id);
    }

    fn status(&self) -> SessionStatus {
        let state = self.shared.lock();
        if state.failed {
            SessionStatus::Failed
        } else if state.received_any {
            SessionStatus::ReadyToPlay
        } else {
            SessionStatus::Unknown
        }
    }

    fn loaded_time_ranges(&self) -> Vec<TimeRange> {
        let state = self.shared.lock();
        if state.buffered == 0 {
            return Vec::new();
        }
        vec![TimeRange::new(
            state.played as f64 / self.byte_rate,
            state.buffered as f64 / self.byte_rate,
        )]
    }
}

impl Drop for HttpSession {
    fn drop(&mut self) {
        self.download.abort();
        self.playout.abort();
        log::debug!("[{}] Session released", self.id);
    }
}

async fn download_task(
    client: reqwest::Client,
    url: Url,
    shared: Arc<Shared>,
    capacity: usize,
    id: Uuid,
) {
    match fill_buffer(&client, url, &shared, capacity, id).await {
        Ok(()) => log::info!("[{}] Stream ended", id),
        Err(e) => log::warn!("[{}] Stream download failed: {}", id, e),
    }
    shared.mark_finished();
}

async fn fill_buffer(
    client: &reqwest::Client,
    url: Url,
    shared: &Shared,
    capacity: usize,
    id: Uuid,
) -> anyhow::Result<()> {
    let response = client.get(url).send().await?.error_for_status()?;
    let mut body = response.bytes_stream();

    while let Some(chunk) = body.next().await {
        let mut chunk = chunk?;
        while !chunk.is_empty() {
            let room = shared.wait_for_space(capacity).await;
            let part = if chunk.len() > room {
                chunk.split_to(room)
            } else {
                std::mem::take(&mut chunk)
            };
            shared.push_chunk(part, id);
        }
    }
    Ok(())
}

async fn playout_task(
    shared: Arc<Shared>,
    byte_rate: f64,
    output: Option<mpsc::Sender<Bytes>>,
    events: SessionEvents,
    id: Uuid,
) {
    let mut ticker = tokio::time::interval(PLAYOUT_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let budget = ((byte_rate * PLAYOUT_TICK.as_secs_f64()) as usize).max(1);
    let mut stalled = false;

    loop {
        ticker.tick().await;
        if !shared.playing.load(Ordering::Relaxed) {
            continue;
        }

        match shared.take(budget) {
            Playout::Data(chunks) => {
                stalled = false;
                shared.space.notify_one();
                if let Some(tx) = &output {
                    for chunk in chunks {
                        if tx.try_send(chunk).is_err() {
                            log::trace!("[{}] Audio output not keeping up, chunk dropped", id);
                        }
                    }
                }
            }
            Playout::Stalled => {
                if !stalled {
                    log::debug!("[{}] Buffer underrun, waiting for data", id);
                    stalled = true;
                }
            }
            Playout::Exhausted => {
                events.failed_to_continue();
                break;
            }
        }
    }
}
