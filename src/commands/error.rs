use thiserror::Error;

// Error handling for LCU and live-client operations

#[derive(Debug, Error)]
pub enum LcuError {
  /// No credentials have been published to the store yet.
  #[error("Not connected to the League client")]
  NotConnected,

  #[error("Transport error: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("LCU API returned {status} for {endpoint}")]
  Status { endpoint: String, status: u16 },

  #[error("Failed to decode response from {endpoint}: {message}")]
  Decode { endpoint: String, message: String },

  #[error("Configuration error: {0}")]
  Config(String),

  #[error("IO Error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Failed to serialize output: {0}")]
  Serialize(#[from] serde_json::Error),
}

impl LcuError {
  pub fn is_timeout(&self) -> bool {
    matches!(self, Self::Transport(err) if err.is_timeout())
  }

  pub fn decode(endpoint: &str, message: impl ToString) -> Self {
    Self::Decode {
      endpoint: endpoint.to_string(),
      message: message.to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_error_mentions_endpoint() {
    let err = LcuError::Status {
      endpoint: "/lol-gameflow/v1/gameflow-phase".to_string(),
      status: 404,
    };
    let text = err.to_string();
    assert!(text.contains("404"));
    assert!(text.contains("/lol-gameflow/v1/gameflow-phase"));
    assert!(!err.is_timeout());
  }

  #[test]
  fn not_connected_is_not_a_timeout() {
    assert!(!LcuError::NotConnected.is_timeout());
  }

  #[test]
  fn serde_failures_are_not_reported_as_io() {
    let err: LcuError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, LcuError::Serialize(_)));
    assert!(err.to_string().starts_with("Failed to serialize output"));
  }
}
