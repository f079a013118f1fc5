//! Network association
//!
//! The push publisher re-runs [`NetworkLink::associate`] after repeated send
//! failures; startup runs it until it succeeds. On Wi-Fi hosts association is
//! delegated to NetworkManager.

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

/// Upper bound for one association attempt.
const ASSOCIATE_TIMEOUT: Duration = Duration::from_secs(20);

/// Delay between startup association attempts.
const ASSOCIATE_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("Failed to run nmcli: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Association with '{ssid}' rejected: {reason}")]
    Rejected { ssid: String, reason: String },

    #[error("Association timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait NetworkLink: Send {
    async fn associate(&mut self) -> Result<(), LinkError>;
}

/// Wi-Fi station joined through `nmcli device wifi connect`.
pub struct WifiLink {
    ssid: String,
    password: String,
}

impl WifiLink {
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password: password.into(),
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new("nmcli");
        command.args(["device", "wifi", "connect", self.ssid.as_str()]);
        if self.password.is_empty() {
            info!("Wi-Fi password is empty, joining '{}' as an open network", self.ssid);
        } else {
            command.args(["password", self.password.as_str()]);
        }
        command.kill_on_drop(true);
        command
    }
}

#[async_trait]
impl NetworkLink for WifiLink {
    async fn associate(&mut self) -> Result<(), LinkError> {
        info!("Connecting to Wi-Fi '{}'...", self.ssid);
        let output = tokio::time::timeout(ASSOCIATE_TIMEOUT, self.command().output())
            .await
            .map_err(|_| LinkError::Timeout(ASSOCIATE_TIMEOUT))??;

        if output.status.success() {
            info!("Connected to Wi-Fi '{}'", self.ssid);
            Ok(())
        } else {
            Err(LinkError::Rejected {
                ssid: self.ssid.clone(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// A link that is always up, for wired hosts or externally managed Wi-Fi.
pub struct WiredLink;

#[async_trait]
impl NetworkLink for WiredLink {
    async fn associate(&mut self) -> Result<(), LinkError> {
        info!("Using pre-configured network connection");
        Ok(())
    }
}

/// Retries [`NetworkLink::associate`] with a fixed delay until it succeeds.
pub async fn associate_until_up(link: &mut dyn NetworkLink) {
    let mut attempts: u32 = 0;
    loop {
        attempts += 1;
        match link.associate().await {
            Ok(()) => {
                if attempts > 1 {
                    info!("Network up after {} attempts", attempts);
                }
                return;
            }
            Err(e) => {
                warn!("Network association failed (attempt {}): {}", attempts, e);
                tokio::time::sleep(ASSOCIATE_RETRY_DELAY).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlakyLink {
        failures_left: u32,
        calls: u32,
    }

    #[async_trait]
    impl NetworkLink for FlakyLink {
        async fn associate(&mut self) -> Result<(), LinkError> {
            self.calls += 1;
            if self.failures_left > 0 {
                self.failures_left -= 1;
                Err(LinkError::Timeout(Duration::from_millis(1)))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn startup_association_retries_until_success() {
        let mut link = FlakyLink {
            failures_left: 2,
            calls: 0,
        };
        associate_until_up(&mut link).await;
        assert_eq!(link.calls, 3);
    }

    #[tokio::test]
    async fn wired_link_is_always_up() {
        assert!(WiredLink.associate().await.is_ok());
    }

    #[test]
    fn open_network_omits_password_arguments() {
        let link = WifiLink::new("beacon", "");
        let command = link.command();
        let args: Vec<_> = command.as_std().get_args().collect();
        assert_eq!(args, ["device", "wifi", "connect", "beacon"]);

        let link = WifiLink::new("beacon", "secret");
        let command = link.command();
        let args: Vec<_> = command.as_std().get_args().collect();
        assert_eq!(args, ["device", "wifi", "connect", "beacon", "password", "secret"]);
    }
}
