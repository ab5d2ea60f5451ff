mod audio_bridge;
mod classifier_bridge;
mod config;
mod controller;
mod detection;
mod dialer;
mod error;
mod player;
mod protocol;
#[cfg(test)]
mod testing;

use anyhow::Context;
use audio_bridge::AudioBridge;
use bytes::Bytes;
use classifier_bridge::{ClassifierBridge, ClassifierEvent};
use config::Config;
use controller::CoreController;
use dialer::{CommandDialer, Dialer};
use player::{HttpBackendConfig, HttpStreamBackend, StreamBackend, StreamPlayer, StreamSource};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = Config::new().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    config.apply_env_overrides();
    log::info!("{} {} starting", config.app_name, config.app_version);

    // a bad stream URL is a configuration error, not a playback error
    let source = StreamSource::parse(&config.stream_url)
        .with_context(|| format!("Cannot play {:?}", config.stream_url))?;

    // played-out stream bytes go to the renderer process
    let (tx_audio, rx_audio) = mpsc::channel::<Bytes>(config.audio_queue_capacity.max(1));
    let audio_bridge = Arc::new(AudioBridge::new(&config).await?);
    let audio_bridge_clone = audio_bridge.clone();
    tokio::spawn(async move {
        if let Err(e) = audio_bridge_clone.run(rx_audio).await {
            log::error!("AudioBridge error: {}", e);
        }
    });

    let backend: Arc<dyn StreamBackend> = Arc::new(HttpStreamBackend::new(
        HttpBackendConfig::from_config(&config),
        Some(tx_audio),
    )?);
    let (player, mut rx_player) = StreamPlayer::new(source, backend);

    let dialer: Arc<dyn Dialer> = Arc::new(CommandDialer::from_config(&config));
    let (mut controller, mut rx_app) = CoreController::new(player, &config, dialer);

    // capture state and results from the classifier process
    let (tx_classifier, mut rx_classifier) = mpsc::channel::<ClassifierEvent>(100);
    let classifier_bridge = Arc::new(ClassifierBridge::new(&config, tx_classifier).await?);
    let classifier_bridge_clone = classifier_bridge.clone();
    tokio::spawn(async move {
        if let Err(e) = classifier_bridge_clone.run().await {
            log::error!("ClassifierBridge error: {}", e);
        }
    });

    controller.start();

    let mut status_tick = tokio::time::interval(config.status_interval());
    log::info!("Radio core started, stream {}", controller.player().source());

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                log::info!("Received Ctrl+C, shutting down...");
                break;
            }

            Some(event) = rx_player.recv() => {
                controller.handle_player_event(event);
            }

            Some(event) = rx_app.recv() => {
                controller.handle_app_event(event);
            }

            Some(event) = rx_classifier.recv() => {
                controller.handle_classifier_event(event);
            }

            _ = status_tick.tick() => {
                controller.report_status();
            }
        }
    }
    Ok(())
}
