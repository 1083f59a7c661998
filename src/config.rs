// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration: session tunables plus the probe tool's saved settings.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Session tunables. The defaults match the brick's documented timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrickOptions {
    /// Delay between low-speed (I2C) ready polls, in milliseconds.
    pub ls_poll_interval_ms: u64,

    /// How many ready polls to attempt before a low-speed read times out.
    pub ls_poll_attempts: u32,
}

impl Default for BrickOptions {
    fn default() -> Self {
        Self {
            ls_poll_interval_ms: 10,
            ls_poll_attempts: 30,
        }
    }
}

impl BrickOptions {
    /// Delay between low-speed ready polls.
    pub fn ls_poll_interval(&self) -> Duration {
        Duration::from_millis(self.ls_poll_interval_ms)
    }
}

/// Settings for the `nxt-probe` binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Bluetooth address of the last used brick, colon-separated hex.
    pub brick_address: Option<String>,

    /// RFCOMM channel to connect on.
    pub rfcomm_channel: u8,

    /// Battery poll interval in milliseconds for the watch loop.
    pub poll_interval_ms: u64,

    /// Session tunables.
    pub session: BrickOptions,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            brick_address: None,
            rfcomm_channel: 1,
            poll_interval_ms: 1000,
            session: BrickOptions::default(),
        }
    }
}

impl ProbeConfig {
    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nxt-remote")
            .join("config.toml")
    }

    /// Load configuration from file or create the default.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load from an explicit path, writing the default if absent.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = BrickOptions::default();
        assert_eq!(options.ls_poll_interval(), Duration::from_millis(10));
        assert_eq!(options.ls_poll_attempts, 30);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = ProbeConfig::default();
        config.brick_address = Some("00:16:53:01:02:03".to_string());
        config.poll_interval_ms = 250;
        config.save_to(&path).unwrap();

        let loaded = ProbeConfig::load_from(&path).unwrap();
        assert_eq!(loaded.brick_address.as_deref(), Some("00:16:53:01:02:03"));
        assert_eq!(loaded.poll_interval_ms, 250);
        assert_eq!(loaded.session.ls_poll_attempts, 30);
    }

    #[test]
    fn test_load_creates_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = ProbeConfig::load_from(&path).unwrap();
        assert!(path.exists());
        assert!(config.brick_address.is_none());
        assert_eq!(config.rfcomm_channel, 1);
    }
}
