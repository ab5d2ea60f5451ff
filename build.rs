use std::fs;
use std::path::Path;
use serde::Deserialize;

#[derive(Deserialize)]
struct Config {
    application: Application,
    stream: Stream,
    audio: Audio,
    classifier: Classifier,
    dialer: Dialer,
    controller: Controller,
}

#[derive(Deserialize)]
struct Application {
    name: String,
    version: String,
}

#[derive(Deserialize)]
struct Stream {
    url: String,
    user_agent: String,
    default_bitrate_kbps: u32,
    max_buffer_seconds: u32,
}

#[derive(Deserialize)]
struct Audio {
    local_port: u16,
    remote_ip: String,
    remote_port: u16,
    chunk_size: usize,
    queue_capacity: usize,
}

#[derive(Deserialize)]
struct Classifier {
    local_ip: String,
    local_port: u16,
    buffer_size: usize,
    target_label: String,
    trigger_percent: f32,
    display_floor_percent: f32,
}

#[derive(Deserialize)]
struct Dialer {
    number: String,
    command: String,
    #[serde(default)]
    args: Vec<String>,
    timeout_ms: u64,
    cooldown_secs: u64,
}

#[derive(Deserialize)]
struct Controller {
    status_interval_secs: u64,
    reconnect_delay_secs: u64,
}

// Reads config.toml at build time and exports every value as a rustc env var.
fn main() {
    println!("cargo:rerun-if-changed=config.toml");

    let config_path = Path::new("config.toml");
    if !config_path.exists() {
        panic!("config.toml not found!");
    }

    let config_str = fs::read_to_string(config_path).expect("Failed to read config.toml");
    let config: Config = toml::from_str(&config_str).expect("Failed to parse config.toml");

    println!("cargo:rustc-env=APP_NAME={}", config.application.name);
    println!("cargo:rustc-env=APP_VERSION={}", config.application.version);

    println!("cargo:rustc-env=STREAM_URL={}", config.stream.url);
    println!("cargo:rustc-env=STREAM_USER_AGENT={}", config.stream.user_agent);
    println!("cargo:rustc-env=STREAM_DEFAULT_BITRATE_KBPS={}", config.stream.default_bitrate_kbps);
    println!("cargo:rustc-env=STREAM_MAX_BUFFER_SECONDS={}", config.stream.max_buffer_seconds);

    println!("cargo:rustc-env=AUDIO_LOCAL_PORT={}", config.audio.local_port);
    println!("cargo:rustc-env=AUDIO_REMOTE_IP={}", config.audio.remote_ip);
    println!("cargo:rustc-env=AUDIO_REMOTE_PORT={}", config.audio.remote_port);
    println!("cargo:rustc-env=AUDIO_CHUNK_SIZE={}", config.audio.chunk_size);
    println!("cargo:rustc-env=AUDIO_QUEUE_CAPACITY={}", config.audio.queue_capacity);

    println!("cargo:rustc-env=CLASSIFIER_LOCAL_IP={}", config.classifier.local_ip);
    println!("cargo:rustc-env=CLASSIFIER_LOCAL_PORT={}", config.classifier.local_port);
    println!("cargo:rustc-env=CLASSIFIER_BUFFER_SIZE={}", config.classifier.buffer_size);
    println!("cargo:rustc-env=CLASSIFIER_TARGET_LABEL={}", config.classifier.target_label);
    println!("cargo:rustc-env=CLASSIFIER_TRIGGER_PERCENT={}", config.classifier.trigger_percent);
    println!("cargo:rustc-env=CLASSIFIER_DISPLAY_FLOOR_PERCENT={}", config.classifier.display_floor_percent);

    // args may contain spaces, so they travel as a JSON array
    let dialer_args = serde_json::to_string(&config.dialer.args).expect("Failed to encode dialer args");
    println!("cargo:rustc-env=DIALER_NUMBER={}", config.dialer.number);
    println!("cargo:rustc-env=DIALER_COMMAND={}", config.dialer.command);
    println!("cargo:rustc-env=DIALER_ARGS={}", dialer_args);
    println!("cargo:rustc-env=DIALER_TIMEOUT_MS={}", config.dialer.timeout_ms);
    println!("cargo:rustc-env=DIALER_COOLDOWN_SECS={}", config.dialer.cooldown_secs);

    println!("cargo:rustc-env=CONTROLLER_STATUS_INTERVAL_SECS={}", config.controller.status_interval_secs);
    println!("cargo:rustc-env=CONTROLLER_RECONNECT_DELAY_SECS={}", config.controller.reconnect_delay_secs);
}
