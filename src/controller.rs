use crate::classifier_bridge::ClassifierEvent;
use crate::config::Config;
use crate::detection::{DetectionPolicy, RankedResult};
use crate::dialer::Dialer;
use crate::player::{ErrorObserver, PlayerEvent, ReadinessObserver, StreamPlayer};
use crate::protocol::ClassifierMessage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Player notifications, re-queued so reactions run on the controller's task.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    ErrorChanged(String),
    ReadinessChanged(bool),
    Reconnect,
}

/// Observer registered on the player; forwards every notification as an `AppEvent`.
pub struct PlayerRelay {
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl PlayerRelay {
    fn forward(&self, event: AppEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("Controller gone, dropping player notification");
        }
    }
}

impl ErrorObserver for PlayerRelay {
    fn error_message_changed(&self, message: &str) {
        self.forward(AppEvent::ErrorChanged(message.to_string()));
    }
}

impl ReadinessObserver for PlayerRelay {
    fn readiness_changed(&self, ready: bool) {
        self.forward(AppEvent::ReadinessChanged(ready));
    }
}

pub struct CoreController {
    player: StreamPlayer,
    // keeps the player's weak observer reference alive
    _relay: Arc<PlayerRelay>,
    app_tx: mpsc::UnboundedSender<AppEvent>,
    policy: DetectionPolicy,
    dialer: Arc<dyn Dialer>,
    dial_number: String,
    dial_cooldown: Duration,
    last_dial: Option<Instant>,
    reconnect_delay: Option<Duration>,
    reconnect_pending: bool,
    latest_results: Vec<RankedResult>,
}

impl CoreController {
    pub fn new(
        mut player: StreamPlayer,
        config: &Config,
        dialer: Arc<dyn Dialer>,
    ) -> (Self, mpsc::UnboundedReceiver<AppEvent>) {
        let (app_tx, app_rx) = mpsc::unbounded_channel();
        let relay = Arc::new(PlayerRelay { tx: app_tx.clone() });
        player.add_error_observer(&relay);
        player.add_readiness_observer(&relay);

        let controller = Self {
            player,
            _relay: relay,
            app_tx,
            policy: DetectionPolicy::from_config(config),
            dialer,
            dial_number: config.dial_number.clone(),
            dial_cooldown: config.dial_cooldown(),
            last_dial: None,
            reconnect_delay: config.reconnect_delay(),
            reconnect_pending: false,
            latest_results: Vec::new(),
        };
        (controller, app_rx)
    }

    /// Kicks off the first load of the stream.
    pub fn start(&mut self) {
        self.player.load();
    }

    pub fn player(&self) -> &StreamPlayer {
        &self.player
    }

    /// Most recent classification results above the display floor.
    pub fn latest_results(&self) -> &[RankedResult] {
        &self.latest_results
    }

    pub fn handle_player_event(&mut self, event: PlayerEvent) {
        self.player.handle_event(event);
    }

    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ErrorChanged(message) => {
                log::info!("Error changed to '{}'", message);
                self.player.pause();
                if !message.is_empty() {
                    self.schedule_reconnect();
                }
            }
            AppEvent::ReadinessChanged(ready) => {
                log::info!("Detected new stream session (ready={})", ready);
                if ready {
                    self.player.play();
                }
            }
            AppEvent::Reconnect => {
                self.reconnect_pending = false;
                log::info!("Reconnecting to {}", self.player.source());
                self.player.reset_player();
            }
        }
    }

    fn schedule_reconnect(&mut self) {
        let Some(delay) = self.reconnect_delay else {
            return;
        };
        if self.reconnect_pending {
            return;
        }
        self.reconnect_pending = true;
        log::info!("Reconnecting in {}s", delay.as_secs());

        let tx = self.app_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(AppEvent::Reconnect);
        });
    }

    pub fn handle_classifier_event(&mut self, event: ClassifierEvent) {
        let ClassifierEvent::Message(msg) = event;
        match msg {
            ClassifierMessage::Ready => {
                log::info!("Classifier capture started");
                self.player.play();
            }
            ClassifierMessage::Stopped => {
                log::info!("Classifier capture stopped");
                self.player.pause();
            }
            ClassifierMessage::Error { message } => {
                log::error!("Classifier error: {}", message);
                self.player.pause();
            }
            ClassifierMessage::Result { classifications } => {
                let evaluation = self.policy.evaluate(&classifications);
                for result in &evaluation.ranked {
                    log::debug!("{}: {}", result.label, result.percent);
                }
                self.latest_results = evaluation.ranked;
                if evaluation.triggered {
                    self.on_target_detected();
                }
            }
        }
    }

    fn on_target_detected(&mut self) {
        let now = Instant::now();
        if let Some(last) = self.last_dial {
            if now.duration_since(last) < self.dial_cooldown {
                log::debug!("'{}' detected again, still in dial cooldown", self.policy.target_label);
                return;
            }
        }
        self.last_dial = Some(now);

        log::info!("'{}' detected, calling {}", self.policy.target_label, self.dial_number);
        // the call takes over audio
        self.player.pause();

        let dialer = Arc::clone(&self.dialer);
        let number = self.dial_number.clone();
        tokio::spawn(async move {
            if let Err(e) = dialer.dial(&number).await {
                log::error!("Dial failed: {}", e);
            }
        });
    }

    pub fn report_status(&self) {
        let player = &self.player;
        log::info!(
            "Stream status: generation={}, session={}, ready={}, playing={}, buffered={:.1}s, full={}, error='{}'",
            player.generation(),
            player.has_session(),
            player.is_ready(),
            player.currently_playing(),
            player.buffer_available_seconds(),
            player.buffer_full(),
            player.error_message()
        );

        let results = self.latest_results();
        if !results.is_empty() {
            let summary: Vec<String> = results
                .iter()
                .map(|r| format!("{} {}%", r.label, r.percent))
                .collect();
            log::info!("Last classification: {}", summary.join(", "));
        }
    }
}
