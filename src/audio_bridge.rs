use crate::config::Config;
use bytes::Bytes;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

/// Forwards played-out stream bytes to the external audio renderer over UDP.
pub struct AudioBridge {
    socket: Arc<UdpSocket>,
    target_addr: String,
    chunk_size: usize,
}

impl AudioBridge {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(format!("0.0.0.0:{}", config.audio_local_port)).await?;
        let target_addr = format!("{}:{}", config.audio_remote_ip, config.audio_remote_port);

        Ok(Self {
            socket: Arc::new(socket),
            target_addr,
            // keep datagrams well under the 64K UDP limit
            chunk_size: config.audio_chunk_size.clamp(1, 60 * 1024),
        })
    }

    /// Sends everything received on `rx` until every sender is gone.
    pub async fn run(&self, mut rx: mpsc::Receiver<Bytes>) -> anyhow::Result<()> {
        log::info!("Audio bridge forwarding to {}", self.target_addr);
        while let Some(data) = rx.recv().await {
            if let Err(e) = self.send_audio(&data).await {
                log::warn!("Failed to send audio to renderer: {}", e);
            }
        }
        log::info!("Audio output channel closed");
        Ok(())
    }

    pub async fn send_audio(&self, data: &[u8]) -> anyhow::Result<()> {
        for chunk in data.chunks(self.chunk_size) {
            self.socket.send_to(chunk, &self.target_addr).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn splits_data_into_datagrams() {
        let renderer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut config = Config::default();
        config.audio_local_port = 0;
        config.audio_remote_ip = "127.0.0.1".into();
        config.audio_remote_port = renderer.local_addr().unwrap().port();
        config.audio_chunk_size = 4;

        let bridge = AudioBridge::new(&config).await.unwrap();
        let (tx, rx) = mpsc::channel(4);
        tokio::spawn(async move {
            let _ = bridge.run(rx).await;
        });
        tx.send(Bytes::from_static(b"abcdefghij")).await.unwrap();

        let mut buf = [0u8; 16];
        let mut received = Vec::new();
        for _ in 0..3 {
            let (len, _) = tokio::time::timeout(Duration::from_secs(5), renderer.recv_from(&mut buf))
                .await
                .unwrap()
                .unwrap();
            assert!(len <= 4);
            received.extend_from_slice(&buf[..len]);
        }
        assert_eq!(received, b"abcdefghij");
    }
}
