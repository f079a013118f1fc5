//! Deployment configuration loaded from a TOML file
//!
//! Only deployment details live here: which publisher runs, where it binds
//! or sends to, Wi-Fi credentials and pin wiring. The sampling policy
//! (deadzone, change threshold, cadence, retry limit) is fixed in
//! [`crate::joystick`]. Every field has a default, so a missing file or a
//! partial file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::joystick::Language;
use crate::publish::push::DEFAULT_SEND_TIMEOUT;

/// Environment variable that points at an explicit config file.
pub const CONFIG_ENV_VAR: &str = "JOYSTICK_RELAY_CONFIG";

const CONFIG_DIR: &str = "joystick-relay";
const CONFIG_FILE: &str = "relay.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Unknown mode '{0}' (expected 'serve' or 'push')")]
    UnknownMode(String),
}

/// Which publisher the relay runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayMode {
    /// Answer every inbound connection with an HTML snapshot.
    #[default]
    Serve,
    /// Post JSON snapshots to a fixed server on change.
    Push,
}

impl FromStr for RelayMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "serve" => Ok(RelayMode::Serve),
            "push" => Ok(RelayMode::Push),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub mode: RelayMode,
    pub language: Language,
    pub serve: ServeConfig,
    pub push: PushConfig,
    pub wifi: Option<WifiConfig>,
    pub hardware: HardwareConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    pub bind: String,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:80".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// Server as `ip:port`.
    pub server: String,
    pub path: String,
    pub send_timeout_ms: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            server: "192.168.0.100:5000".to_string(),
            path: "/api/joystick".to_string(),
            send_timeout_ms: DEFAULT_SEND_TIMEOUT.as_millis() as u64,
        }
    }
}

impl PushConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiConfig {
    pub ssid: String,
    /// Empty for open networks.
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    pub spi_bus: u8,
    pub slave_select: u8,
    pub spi_clock_hz: u32,
    pub x_channel: u8,
    pub y_channel: u8,
    pub button_pin: u8,
    pub status_led_pin: Option<u8>,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            spi_bus: 0,
            slave_select: 0,
            spi_clock_hz: 1_000_000,
            x_channel: 0,
            y_channel: 1,
            button_pin: 22,
            status_led_pin: None,
        }
    }
}

impl RelayConfig {
    /// Loads from [`CONFIG_ENV_VAR`] if set, else from the user config
    /// directory. A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                info!("No config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RelayConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Loaded config from {}", path.display());
        debug!("Config: {:?}", config);
        Ok(config)
    }
}

fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RelayConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, RelayConfig::default());
        assert_eq!(config.mode, RelayMode::Serve);
        assert_eq!(config.serve.bind, "0.0.0.0:80");
        assert_eq!(config.push.path, "/api/joystick");
        assert_eq!(config.push.send_timeout(), DEFAULT_SEND_TIMEOUT);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
mode = "push"
language = "en"

[push]
server = "10.0.0.5:8080"

[wifi]
ssid = "harbour"
password = "beacon"

[hardware]
status_led_pin = 25
"#
        )
        .unwrap();

        let config = RelayConfig::load_from(file.path()).unwrap();
        assert_eq!(config.mode, RelayMode::Push);
        assert_eq!(config.language, Language::English);
        assert_eq!(config.push.server, "10.0.0.5:8080");
        assert_eq!(config.push.path, "/api/joystick");
        assert_eq!(config.wifi.as_ref().map(|w| w.ssid.as_str()), Some("harbour"));
        assert_eq!(config.hardware.status_led_pin, Some(25));
        assert_eq!(config.hardware.button_pin, 22);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "mode = [").unwrap();
        assert!(matches!(
            RelayConfig::load_from(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn mode_from_cli_argument() {
        assert_eq!("push".parse::<RelayMode>().unwrap(), RelayMode::Push);
        assert_eq!("serve".parse::<RelayMode>().unwrap(), RelayMode::Serve);
        assert!(matches!(
            "listen".parse::<RelayMode>(),
            Err(ConfigError::UnknownMode(_))
        ));
    }
}
