use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::Config;

/// Places a call. Implementations hand off to the platform and return.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, number: &str) -> anyhow::Result<()>;
}

/// Builds the `tel://` URI for `number`.
///
/// Only digits with an optional leading `+` are accepted, so the URI is safe
/// to hand to an external program as a single argument.
pub fn tel_uri(number: &str) -> anyhow::Result<String> {
    let digits = number.strip_prefix('+').unwrap_or(number);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        anyhow::bail!("Invalid phone number: {:?}", number);
    }
    Ok(format!("tel://{}", number))
}

/// Opens the `tel://` URI with an external handler program (`xdg-open` by default).
pub struct CommandDialer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandDialer {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.dial_command.clone(),
            config.dial_args.clone(),
            config.dial_timeout(),
        )
    }
}

#[async_trait]
impl Dialer for CommandDialer {
    async fn dial(&self, number: &str) -> anyhow::Result<()> {
        let uri = tel_uri(number)?;
        log::info!("Dialing {} via {}", uri, self.program);

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(&uri)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| anyhow::anyhow!("Failed to spawn {}: {}", self.program, e))?;

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => anyhow::bail!(
                "Dial handler {} timed out after {} ms",
                self.program,
                self.timeout.as_millis()
            ),
        };

        if !output.status.success() {
            let err_str = String::from_utf8_lossy(&output.stderr).to_string();
            anyhow::bail!("Dial handler {} failed ({}): {}", self.program, output.status, err_str.trim());
        }
        Ok(())
    }
}
