use std::time::Duration;

/// Runtime override for the stream URL baked in from config.toml.
pub const STREAM_URL_ENV: &str = "ICECREMA_STREAM_URL";

#[derive(Debug, Clone)]
pub struct Config {
    // Application
    pub app_name: &'static str,
    pub app_version: &'static str,

    // Stream
    pub stream_url: String,
    pub stream_user_agent: String,
    pub default_bitrate_kbps: u32,
    pub max_buffer_seconds: u32,

    // Audio output bridge
    pub audio_local_port: u16,
    pub audio_remote_ip: String,
    pub audio_remote_port: u16,
    pub audio_chunk_size: usize,
    pub audio_queue_capacity: usize,

    // Classifier bridge
    pub classifier_local_ip: String,
    pub classifier_local_port: u16,
    pub classifier_buffer_size: usize,
    pub target_label: String,
    pub trigger_percent: f32,
    pub display_floor_percent: f32,

    // Dialer
    pub dial_number: String,
    pub dial_command: String,
    pub dial_args: Vec<String>,
    pub dial_timeout_ms: u64,
    pub dial_cooldown_secs: u64,

    // Controller
    pub status_interval_secs: u64,
    pub reconnect_delay_secs: u64,
}

impl Config {
    /// Builds the configuration from the values build.rs exported from config.toml.
    pub fn new() -> Result<Self, &'static str> {
        Ok(Self {
            app_name: env!("APP_NAME"),
            app_version: env!("APP_VERSION"),

            stream_url: env!("STREAM_URL").to_string(),
            stream_user_agent: env!("STREAM_USER_AGENT").to_string(),
            default_bitrate_kbps: env!("STREAM_DEFAULT_BITRATE_KBPS").parse()
                .map_err(|_| "Failed to parse STREAM_DEFAULT_BITRATE_KBPS")?,
            max_buffer_seconds: env!("STREAM_MAX_BUFFER_SECONDS").parse()
                .map_err(|_| "Failed to parse STREAM_MAX_BUFFER_SECONDS")?,

            audio_local_port: env!("AUDIO_LOCAL_PORT").parse()
                .map_err(|_| "Failed to parse AUDIO_LOCAL_PORT")?,
            audio_remote_ip: env!("AUDIO_REMOTE_IP").to_string(),
            audio_remote_port: env!("AUDIO_REMOTE_PORT").parse()
                .map_err(|_| "Failed to parse AUDIO_REMOTE_PORT")?,
            audio_chunk_size: env!("AUDIO_CHUNK_SIZE").parse()
                .map_err(|_| "Failed to parse AUDIO_CHUNK_SIZE")?,
            audio_queue_capacity: env!("AUDIO_QUEUE_CAPACITY").parse()
                .map_err(|_| "Failed to parse AUDIO_QUEUE_CAPACITY")?,

            classifier_local_ip: env!("CLASSIFIER_LOCAL_IP").to_string(),
            classifier_local_port: env!("CLASSIFIER_LOCAL_PORT").parse()
                .map_err(|_| "Failed to parse CLASSIFIER_LOCAL_PORT")?,
            classifier_buffer_size: env!("CLASSIFIER_BUFFER_SIZE").parse()
                .map_err(|_| "Failed to parse CLASSIFIER_BUFFER_SIZE")?,
            target_label: env!("CLASSIFIER_TARGET_LABEL").to_string(),
            trigger_percent: env!("CLASSIFIER_TRIGGER_PERCENT").parse()
                .map_err(|_| "Failed to parse CLASSIFIER_TRIGGER_PERCENT")?,
            display_floor_percent: env!("CLASSIFIER_DISPLAY_FLOOR_PERCENT").parse()
                .map_err(|_| "Failed to parse CLASSIFIER_DISPLAY_FLOOR_PERCENT")?,

            dial_number: env!("DIALER_NUMBER").to_string(),
            dial_command: env!("DIALER_COMMAND").to_string(),
            dial_args: serde_json::from_str(env!("DIALER_ARGS"))
                .map_err(|_| "Failed to parse DIALER_ARGS")?,
            dial_timeout_ms: env!("DIALER_TIMEOUT_MS").parse()
                .map_err(|_| "Failed to parse DIALER_TIMEOUT_MS")?,
            dial_cooldown_secs: env!("DIALER_COOLDOWN_SECS").parse()
                .map_err(|_| "Failed to parse DIALER_COOLDOWN_SECS")?,

            status_interval_secs: env!("CONTROLLER_STATUS_INTERVAL_SECS").parse()
                .map_err(|_| "Failed to parse CONTROLLER_STATUS_INTERVAL_SECS")?,
            reconnect_delay_secs: env!("CONTROLLER_RECONNECT_DELAY_SECS").parse()
                .map_err(|_| "Failed to parse CONTROLLER_RECONNECT_DELAY_SECS")?,
        })
    }

    /// Replaces the stream URL with `ICECREMA_STREAM_URL` when it is set and non-empty.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(STREAM_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                log::info!("Stream URL overridden by {}", STREAM_URL_ENV);
                self.stream_url = url.to_string();
            }
        }
    }

    pub fn dial_timeout(&self) -> Duration {
        Duration::from_millis(self.dial_timeout_ms)
    }

    pub fn dial_cooldown(&self) -> Duration {
        Duration::from_secs(self.dial_cooldown_secs)
    }

    pub fn status_interval(&self) -> Duration {
        // tokio::time::interval panics on a zero period
        Duration::from_secs(self.status_interval_secs.max(1))
    }

    /// `None` disables automatic reconnects.
    pub fn reconnect_delay(&self) -> Option<Duration> {
        (self.reconnect_delay_secs > 0).then(|| Duration::from_secs(self.reconnect_delay_secs))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new().expect("Failed to create default Config from build-time environment variables")
    }
}
