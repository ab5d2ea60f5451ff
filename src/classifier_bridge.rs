use crate::config::Config;
use crate::protocol::ClassifierMessage;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

pub enum ClassifierEvent {
    Message(ClassifierMessage),
}

/// Receives classifier reports over local UDP.
pub struct ClassifierBridge {
    socket: Arc<UdpSocket>,
    tx: mpsc::Sender<ClassifierEvent>,
    buffer_size: usize,
}

impl ClassifierBridge {
    pub async fn new(config: &Config, tx: mpsc::Sender<ClassifierEvent>) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(format!(
            "{}:{}",
            config.classifier_local_ip, config.classifier_local_port
        ))
        .await?;
        log::info!("Classifier bridge listening on {}", socket.local_addr()?);

        Ok(Self {
            socket: Arc::new(socket),
            tx,
            buffer_size: config.classifier_buffer_size.max(512),
        })
    }

    #[cfg(test)]
    pub fn local_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let mut buf = vec![0u8; self.buffer_size];
        loop {
            let (len, from) = self.socket.recv_from(&mut buf).await?;
            if len == 0 {
                continue;
            }
            match serde_json::from_slice::<ClassifierMessage>(&buf[..len]) {
                Ok(msg) => {
                    if let Err(e) = self.tx.send(ClassifierEvent::Message(msg)).await {
                        log::error!("Failed to send classifier event: {}", e);
                        break;
                    }
                }
                Err(e) => log::warn!("Ignoring malformed classifier message from {}: {}", from, e),
            }
        }
        Ok(())
    }
}
