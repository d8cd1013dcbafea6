//! Configuration for the meshlink client.
//!
//! TOML-backed, with serde defaults so a partial file loads cleanly:
//!
//! ```toml
//! [device]
//! port = "/dev/ttyUSB0"
//! baud_rate = 115200
//! channel = 0
//!
//! [node_cache]
//! path = "data/node_cache.json"
//!
//! [logging]
//! level = "info"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub node_cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Serial port path; empty means "no device configured".
    #[serde(default)]
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Channel index used for outbound messages (0 = primary).
    #[serde(default)]
    pub channel: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: default_baud_rate(),
            channel: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_path")]
    pub path: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_baud_rate() -> u32 {
    115_200
}

fn default_cache_path() -> String {
    "data/node_cache.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("failed to read config {}: {}", path, e))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| anyhow!("invalid config {}: {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)?;
        fs::write(path, content).await?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        const VALID_BAUDS: &[u32] = &[9_600, 19_200, 38_400, 57_600, 115_200, 230_400, 921_600];
        if !VALID_BAUDS.contains(&self.device.baud_rate) {
            return Err(anyhow!(
                "unsupported baud rate {} (expected one of {:?})",
                self.device.baud_rate,
                VALID_BAUDS
            ));
        }
        if self.device.channel > 7 {
            return Err(anyhow!(
                "channel index {} out of range (0-7)",
                self.device.channel
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_uses_defaults() {
        let config: Config = toml::from_str("[device]\nport = \"/dev/ttyACM0\"\n").unwrap();
        assert_eq!(config.device.port, "/dev/ttyACM0");
        assert_eq!(config.device.baud_rate, 115_200);
        assert_eq!(config.node_cache.path, "data/node_cache.json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meshlink.toml");
        let path = path.to_str().unwrap();
        tokio_test::block_on(async {
            Config::create_default(path).await.unwrap();
            let config = Config::load(path).await.unwrap();
            assert_eq!(config.device.baud_rate, 115_200);
        });
    }

    #[test]
    fn rejects_bad_baud_and_channel() {
        let mut config = Config::default();
        config.device.baud_rate = 12_345;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.device.channel = 8;
        assert!(config.validate().is_err());
    }
}
