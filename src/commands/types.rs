use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock};

// Data structures shared by the phase reader, the tracker and the publisher

/// Gameflow phase as reported by `/lol-gameflow/v1/gameflow-phase`.
///
/// The client adds phases between patches, so anything unrecognised is kept
/// verbatim in `Other` instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Phase {
  None,
  Lobby,
  Matchmaking,
  ReadyCheck,
  ChampSelect,
  GameStart,
  InProgress,
  Reconnect,
  WaitingForStats,
  PreEndOfGame,
  EndOfGame,
  Other(String),
}

/// Coarse state the session tracker reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseClass {
  Idle,
  Selecting,
  Live,
  PostGame,
  Other,
}

impl Phase {
  pub fn from_label(label: &str) -> Self {
    match label.trim().trim_matches('"') {
      "" | "None" => Self::None,
      "Lobby" => Self::Lobby,
      "Matchmaking" => Self::Matchmaking,
      "ReadyCheck" => Self::ReadyCheck,
      "ChampSelect" => Self::ChampSelect,
      "GameStart" => Self::GameStart,
      "InProgress" => Self::InProgress,
      "Reconnect" => Self::Reconnect,
      "WaitingForStats" => Self::WaitingForStats,
      "PreEndOfGame" => Self::PreEndOfGame,
      "EndOfGame" => Self::EndOfGame,
      other => Self::Other(other.to_string()),
    }
  }

  pub fn as_str(&self) -> &str {
    match self {
      Self::None => "None",
      Self::Lobby => "Lobby",
      Self::Matchmaking => "Matchmaking",
      Self::ReadyCheck => "ReadyCheck",
      Self::ChampSelect => "ChampSelect",
      Self::GameStart => "GameStart",
      Self::InProgress => "InProgress",
      Self::Reconnect => "Reconnect",
      Self::WaitingForStats => "WaitingForStats",
      Self::PreEndOfGame => "PreEndOfGame",
      Self::EndOfGame => "EndOfGame",
      Self::Other(label) => label,
    }
  }

  pub fn class(&self) -> PhaseClass {
    match self {
      Self::None | Self::Lobby => PhaseClass::Idle,
      Self::ChampSelect => PhaseClass::Selecting,
      Self::GameStart | Self::InProgress => PhaseClass::Live,
      Self::EndOfGame => PhaseClass::PostGame,
      _ => PhaseClass::Other,
    }
  }

  pub fn is_idle(&self) -> bool {
    self.class() == PhaseClass::Idle
  }
}

impl From<String> for Phase {
  fn from(label: String) -> Self {
    Self::from_label(&label)
  }
}

impl From<Phase> for String {
  fn from(phase: Phase) -> Self {
    phase.as_str().to_string()
  }
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Port and remoting token of a running client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
  pub port: u16,
  pub token: String,
}

/// Single-writer credential slot read by every poll loop.
///
/// Writers replace the whole pair at once so a reader never sees a port from
/// one client and a token from another.
#[derive(Debug, Clone, Default)]
pub struct CredentialsStore {
  inner: Arc<RwLock<Option<Arc<Credentials>>>>,
}

impl CredentialsStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_credentials(credentials: Credentials) -> Self {
    let store = Self::new();
    store.set(credentials);
    store
  }

  pub fn set(&self, credentials: Credentials) {
    let mut slot = self.inner.write().unwrap_or_else(|e| e.into_inner());
    *slot = Some(Arc::new(credentials));
  }

  pub fn clear(&self) {
    let mut slot = self.inner.write().unwrap_or_else(|e| e.into_inner());
    *slot = None;
  }

  pub fn snapshot(&self) -> Option<Arc<Credentials>> {
    self
      .inner
      .read()
      .unwrap_or_else(|e| e.into_inner())
      .clone()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRef {
  pub id: String,
  pub game_name: String,
  pub tag_line: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub champion_id: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub champion_name: Option<String>,
}

impl PlayerRef {
  pub fn new(id: &str, game_name: &str, tag_line: &str) -> Self {
    Self {
      id: id.to_string(),
      game_name: game_name.to_string(),
      tag_line: tag_line.to_string(),
      champion_id: None,
      champion_name: None,
    }
  }

  /// `gameName#tagLine`, or just the game name when the tag is unknown.
  pub fn riot_id(&self) -> String {
    if self.tag_line.is_empty() {
      self.game_name.clone()
    } else {
      format!("{}#{}", self.game_name, self.tag_line)
    }
  }

  /// Every identifier this player can be recognised by across endpoints.
  pub fn keys(&self) -> Vec<String> {
    let mut keys = Vec::with_capacity(2);
    if !self.id.is_empty() {
      keys.push(self.id.clone());
    }
    let riot_id = self.riot_id();
    if !riot_id.is_empty() && riot_id != self.id {
      keys.push(riot_id);
    }
    keys
  }
}

/// Champ-select session reduced to what the tracker needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionDetail {
  pub roster: Vec<PlayerRef>,
}

/// All-players listing split by the local player's team tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayersSplit {
  pub local_team: String,
  pub teammates: Vec<PlayerRef>,
  pub enemies: Vec<PlayerRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summoner {
  pub puuid: String,
  pub summoner_id: Option<u64>,
  pub game_name: String,
  pub tag_line: String,
  pub display_name: String,
}

/// Everything the poll loops report to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum WatcherEvent {
  PhaseChanged { from: Option<Phase>, to: Phase },
  TeammatesFound(Vec<PlayerRef>),
  EnemiesFound(Vec<PlayerRef>),
  EnemiesNotFound { attempts: u32 },
  ReadyCheckAccepted,
  StatusMessage(String),
  MatchEnded,
}

impl WatcherEvent {
  pub fn status(message: impl Into<String>) -> Self {
    Self::StatusMessage(message.into())
  }
}
