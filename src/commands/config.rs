use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use super::error::LcuError;

// Watcher configuration, stored as JSON next to the binary or wherever --config points

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
  pub accept_enabled: bool,
  pub analyze_enabled: bool,
  pub accept_interval_ms: u64,
  pub analyze_interval_ms: u64,
  /// Sleep between checks of the enable flag while a loop is switched off.
  pub disabled_interval_ms: u64,
  pub accept_cooldown_ms: u64,
  pub max_enemy_retries: u32,
  /// Full lobby size; smaller live-client listings are treated as not ready.
  pub expected_roster_size: usize,
  pub request_timeout_ms: u64,
  pub connect_timeout_ms: u64,
  pub lcu_host: String,
  /// `false` switches both APIs to plain http (used by tests).
  pub secure: bool,
  pub live_client_port: u16,
  pub history_count: u32,
}

impl Default for WatcherConfig {
  fn default() -> Self {
    Self {
      accept_enabled: true,
      analyze_enabled: true,
      accept_interval_ms: 1000,
      analyze_interval_ms: 2000,
      disabled_interval_ms: 1000,
      accept_cooldown_ms: 3000,
      max_enemy_retries: 10,
      expected_roster_size: 10,
      request_timeout_ms: 5000,
      connect_timeout_ms: 2000,
      lcu_host: "127.0.0.1".to_string(),
      secure: true,
      live_client_port: 2999,
      history_count: 20,
    }
  }
}

impl WatcherConfig {
  pub fn load(path: &Path) -> Result<Self, LcuError> {
    let data = fs::read_to_string(path)?;
    let config: WatcherConfig = serde_json::from_str(&data)
      .map_err(|e| LcuError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
  }

  /// Loads `path` when given, otherwise falls back to defaults.
  pub fn load_or_default(path: Option<&Path>) -> Result<Self, LcuError> {
    match path {
      Some(p) => Self::load(p),
      None => Ok(Self::default()),
    }
  }

  pub fn validate(&self) -> Result<(), LcuError> {
    let intervals = [
      ("accept_interval_ms", self.accept_interval_ms),
      ("analyze_interval_ms", self.analyze_interval_ms),
      ("disabled_interval_ms", self.disabled_interval_ms),
      ("request_timeout_ms", self.request_timeout_ms),
      ("connect_timeout_ms", self.connect_timeout_ms),
    ];
    if let Some((name, _)) = intervals.iter().find(|(_, v)| *v == 0) {
      return Err(LcuError::Config(format!("{} must be greater than zero", name)));
    }
    if self.max_enemy_retries == 0 {
      return Err(LcuError::Config(
        "max_enemy_retries must be greater than zero".to_string(),
      ));
    }
    if self.expected_roster_size == 0 {
      return Err(LcuError::Config(
        "expected_roster_size must be greater than zero".to_string(),
      ));
    }
    Ok(())
  }

  pub fn scheme(&self) -> &'static str {
    if self.secure {
      "https"
    } else {
      "http"
    }
  }

  pub fn accept_interval(&self) -> Duration {
    Duration::from_millis(self.accept_interval_ms)
  }

  pub fn analyze_interval(&self) -> Duration {
    Duration::from_millis(self.analyze_interval_ms)
  }

  pub fn disabled_interval(&self) -> Duration {
    Duration::from_millis(self.disabled_interval_ms)
  }

  pub fn accept_cooldown(&self) -> Duration {
    Duration::from_millis(self.accept_cooldown_ms)
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_millis(self.request_timeout_ms)
  }

  pub fn connect_timeout(&self) -> Duration {
    Duration::from_millis(self.connect_timeout_ms)
  }
}
