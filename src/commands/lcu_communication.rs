// Phase reader and the rest of the outbound LCU / live-client calls

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine};
use chrono::Utc;
use reqwest::{Method, StatusCode};
use std::time::Duration;

use super::config::WatcherConfig;
use super::error::LcuError;
use super::lcu_watcher::session::{parse_champ_select_session, split_all_players};
use super::live_game::{format_live_game, LiveGameView};
use super::match_history::{
  apply_summoner_info, fill_from_identities, game_at, has_summoner_name, history_fetch_count,
  history_timeout, match_detail_endpoints, participant_keys, summarize_history, unwrap_game,
  GameSummary, ParticipantKeys,
};
use super::types::{CredentialsStore, Phase, PlayersSplit, SessionDetail, Summoner};

pub const GAMEFLOW_PHASE_ENDPOINT: &str = "/lol-gameflow/v1/gameflow-phase";
pub const READY_CHECK_ACCEPT_ENDPOINT: &str = "/lol-matchmaking/v1/ready-check/accept";
pub const CHAMP_SELECT_SESSION_ENDPOINT: &str = "/lol-champ-select/v1/session";
pub const CURRENT_SUMMONER_ENDPOINT: &str = "/lol-summoner/v1/current-summoner";
pub const SUMMONERS_ENDPOINT: &str = "/lol-summoner/v1/summoners";
pub const SUMMONER_BY_PUUID_ENDPOINT: &str = "/lol-summoner/v1/summoners/by-puuid";
pub const ALL_GAME_DATA_ENDPOINT: &str = "/liveclientdata/allgamedata";

/// Calls the poll loops depend on.
///
/// Every method is a single request without internal retries; the caller
/// decides what a failure means for its own state.
#[async_trait]
pub trait LcuApi: Send + Sync {
  async fn read_phase(&self) -> Result<Phase, LcuError>;

  async fn accept_ready_check(&self) -> Result<(), LcuError>;

  async fn read_champ_select_session(&self) -> Result<Option<SessionDetail>, LcuError>;

  async fn read_all_players(&self) -> Result<Option<PlayersSplit>, LcuError>;
}

pub fn auth_header(token: &str) -> String {
  format!(
    "Basic {}",
    general_purpose::STANDARD.encode(format!("riot:{}", token))
  )
}

/// Strips the invisible bidi marks the client embeds around Riot IDs.
pub fn clean_summoner_name(name: &str) -> String {
  name
    .chars()
    .filter(|c| {
      !matches!(
        *c,
        '\u{200E}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}'
      )
    })
    .collect::<String>()
    .trim()
    .to_string()
}

#[derive(Clone)]
pub struct LcuClient {
  http: reqwest::Client,
  credentials: CredentialsStore,
  scheme: &'static str,
  host: String,
  live_client_port: u16,
  expected_roster_size: usize,
}

impl LcuClient {
  pub fn new(config: &WatcherConfig, credentials: CredentialsStore) -> Result<Self, LcuError> {
    // The client serves a self-signed certificate on 127.0.0.1
    let http = reqwest::Client::builder()
      .danger_accept_invalid_certs(true)
      .timeout(config.request_timeout())
      .connect_timeout(config.connect_timeout())
      .pool_max_idle_per_host(2)
      .build()?;

    Ok(Self {
      http,
      credentials,
      scheme: config.scheme(),
      host: config.lcu_host.clone(),
      live_client_port: config.live_client_port,
      expected_roster_size: config.expected_roster_size,
    })
  }

  pub fn credentials(&self) -> &CredentialsStore {
    &self.credentials
  }

  async fn lcu_request(
    &self,
    method: Method,
    endpoint: &str,
    query: &[(&str, String)],
    timeout: Option<Duration>,
  ) -> Result<reqwest::Response, LcuError> {
    let credentials = self.credentials.snapshot().ok_or(LcuError::NotConnected)?;
    let url = format!(
      "{}://{}:{}{}",
      self.scheme, self.host, credentials.port, endpoint
    );

    let mut request = self
      .http
      .request(method, &url)
      .header("Authorization", auth_header(&credentials.token));
    if !query.is_empty() {
      request = request.query(query);
    }
    if let Some(timeout) = timeout {
      request = request.timeout(timeout);
    }

    let response = request.send().await?;
    check_status(endpoint, response.status())?;
    Ok(response)
  }

  async fn lcu_json(
    &self,
    endpoint: &str,
    query: &[(&str, String)],
    timeout: Option<Duration>,
  ) -> Result<serde_json::Value, LcuError> {
    let response = self
      .lcu_request(Method::GET, endpoint, query, timeout)
      .await?;
    response
      .json::<serde_json::Value>()
      .await
      .map_err(|e| LcuError::decode(endpoint, e))
  }

  pub async fn current_summoner(&self) -> Result<Summoner, LcuError> {
    let data = self.lcu_json(CURRENT_SUMMONER_ENDPOINT, &[], None).await?;
    let text = |key: &str| {
      data
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
    };

    let puuid = text("puuid");
    if puuid.is_empty() {
      return Err(LcuError::decode(CURRENT_SUMMONER_ENDPOINT, "missing puuid"));
    }
    let game_name = text("gameName");
    let tag_line = text("tagLine");

    // displayName is empty on Riot ID accounts; fall back to name#tag
    let display_name = match text("displayName") {
      name if !name.is_empty() => name,
      _ if !game_name.is_empty() && !tag_line.is_empty() => format!("{}#{}", game_name, tag_line),
      _ if !game_name.is_empty() => game_name.clone(),
      _ => text("summonerName"),
    };

    Ok(Summoner {
      puuid,
      summoner_id: data.get("summonerId").and_then(|v| v.as_u64()),
      game_name,
      tag_line,
      display_name,
    })
  }

  /// `GET` that maps 404 to `None`.
  async fn lcu_json_optional(
    &self,
    endpoint: &str,
    query: &[(&str, String)],
  ) -> Result<Option<serde_json::Value>, LcuError> {
    match self.lcu_json(endpoint, query, None).await {
      Ok(data) => Ok(Some(data)),
      Err(LcuError::Status { status: 404, .. }) => Ok(None),
      Err(e) => Err(e),
    }
  }

  /// Looks a summoner up by Riot ID (`name#tag`) or legacy summoner name.
  pub async fn summoner_by_name(&self, summoner_name: &str) -> Result<Option<serde_json::Value>, LcuError> {
    let cleaned = clean_summoner_name(summoner_name);
    if cleaned.is_empty() {
      return Ok(None);
    }
    self
      .lcu_json_optional(SUMMONERS_ENDPOINT, &[("name", cleaned)])
      .await
  }

  pub async fn summoner_by_puuid(&self, puuid: &str) -> Result<Option<serde_json::Value>, LcuError> {
    let endpoint = format!("{}/{}", SUMMONER_BY_PUUID_ENDPOINT, puuid);
    self.lcu_json_optional(&endpoint, &[]).await
  }

  pub async fn summoner_by_id(&self, summoner_id: u64) -> Result<Option<serde_json::Value>, LcuError> {
    let endpoint = format!("{}/{}", SUMMONERS_ENDPOINT, summoner_id);
    self.lcu_json_optional(&endpoint, &[]).await
  }

  /// Resolves a Riot ID (`name#tag`) or legacy summoner name to a puuid.
  pub async fn lookup_puuid(&self, summoner_name: &str) -> Result<Option<String>, LcuError> {
    Ok(
      self
        .summoner_by_name(summoner_name)
        .await?
        .as_ref()
        .and_then(|data| data.get("puuid"))
        .and_then(|v| v.as_str())
        .filter(|p| !p.is_empty())
        .map(|p| p.to_string()),
    )
  }

  async fn history_json(&self, puuid: &str, count: u32) -> Result<serde_json::Value, LcuError> {
    let endpoint = format!("/lol-match-history/v1/products/lol/{}/matches", puuid);
    tracing::debug!(
      "[History] Requesting {} games for {} (timeout {:?})",
      count,
      puuid,
      history_timeout(count)
    );
    self
      .lcu_json(
        &endpoint,
        &[("endIndex", count.to_string())],
        Some(history_timeout(count)),
      )
      .await
  }

  pub async fn match_history(&self, puuid: &str, count: u32) -> Result<Vec<GameSummary>, LcuError> {
    let data = self.history_json(puuid, count).await?;
    Ok(summarize_history(&data, Utc::now()))
  }

  /// Full game `index` (0 = most recent) from a player's history, with
  /// participant names filled in.
  pub async fn match_at_index(
    &self,
    puuid: &str,
    index: usize,
  ) -> Result<Option<serde_json::Value>, LcuError> {
    let history = self.history_json(puuid, history_fetch_count(index)).await?;
    let mut game = match game_at(history, index) {
      Some(game) => game,
      None => return Ok(None),
    };
    self.enrich_game(&mut game).await;
    Ok(Some(game))
  }

  /// Full game by id. Client builds disagree on the path, so each known
  /// endpoint is tried until one answers. Participant names are filled in.
  pub async fn match_by_id(&self, match_id: i64) -> Result<Option<serde_json::Value>, LcuError> {
    for endpoint in match_detail_endpoints(match_id) {
      match self.lcu_json(&endpoint, &[], None).await {
        Ok(data) if data.as_object().map_or(false, |o| !o.is_empty()) => {
          tracing::info!("[History] Match {} served by {}", match_id, endpoint);
          let mut game = unwrap_game(data);
          self.enrich_game(&mut game).await;
          return Ok(Some(game));
        }
        Ok(_) => tracing::debug!("[History] {} returned no game", endpoint),
        Err(e @ (LcuError::Status { .. } | LcuError::Decode { .. })) => {
          tracing::debug!("[History] {} failed: {}", endpoint, e)
        }
        Err(e) => return Err(e),
      }
    }
    tracing::warn!("[History] No endpoint served match {}", match_id);
    Ok(None)
  }

  /// Fills `summonerName`, `profileIcon` and `puuid` for participants that
  /// lack a name. Best effort: lookup failures are logged and skipped.
  pub async fn enrich_game(&self, game: &mut serde_json::Value) {
    if let Some(participants) = game.get_mut("participants").and_then(|v| v.as_array_mut()) {
      for participant in participants.iter_mut() {
        if has_summoner_name(participant) {
          continue;
        }
        let keys = participant_keys(participant);
        if let Some(info) = self.find_summoner(&keys).await {
          apply_summoner_info(participant, &info);
        }
      }
    }
    fill_from_identities(game);
  }

  async fn find_summoner(&self, keys: &ParticipantKeys) -> Option<serde_json::Value> {
    if let Some(puuid) = &keys.puuid {
      match self.summoner_by_puuid(puuid).await {
        Ok(Some(info)) => return Some(info),
        Ok(None) => {}
        Err(e) => tracing::debug!("[History] Summoner lookup by puuid failed: {}", e),
      }
    }
    if let Some(id) = keys.summoner_id {
      match self.summoner_by_id(id).await {
        Ok(Some(info)) => return Some(info),
        Ok(None) => {}
        Err(e) => tracing::debug!("[History] Summoner lookup by id failed: {}", e),
      }
    }
    if let Some(name) = &keys.summoner_name {
      match self.summoner_by_name(name).await {
        Ok(Some(info)) => return Some(info),
        Ok(None) => {}
        Err(e) => tracing::debug!("[History] Summoner lookup by name failed: {}", e),
      }
    }
    None
  }

  // The in-game API lives on its own port and takes no credentials
  async fn live_client_json(&self) -> Result<serde_json::Value, LcuError> {
    let url = format!(
      "{}://{}:{}{}",
      self.scheme, self.host, self.live_client_port, ALL_GAME_DATA_ENDPOINT
    );
    let response = self.http.get(&url).send().await?;
    check_status(ALL_GAME_DATA_ENDPOINT, response.status())?;
    response
      .json::<serde_json::Value>()
      .await
      .map_err(|e| LcuError::decode(ALL_GAME_DATA_ENDPOINT, e))
  }

  /// Both teams, the clock and recent kills of the running game.
  pub async fn live_game(&self) -> Result<LiveGameView, LcuError> {
    let data = self.live_client_json().await?;
    Ok(format_live_game(&data))
  }
}

fn check_status(endpoint: &str, status: StatusCode) -> Result<(), LcuError> {
  if status.is_success() {
    Ok(())
  } else {
    Err(LcuError::Status {
      endpoint: endpoint.to_string(),
      status: status.as_u16(),
    })
  }
}

#[async_trait]
impl LcuApi for LcuClient {
  async fn read_phase(&self) -> Result<Phase, LcuError> {
    let value = self.lcu_json(GAMEFLOW_PHASE_ENDPOINT, &[], None).await?;
    if value.is_null() {
      return Ok(Phase::None);
    }
    value
      .as_str()
      .map(Phase::from_label)
      .ok_or_else(|| LcuError::decode(GAMEFLOW_PHASE_ENDPOINT, "phase is not a string"))
  }

  async fn accept_ready_check(&self) -> Result<(), LcuError> {
    self
      .lcu_request(Method::POST, READY_CHECK_ACCEPT_ENDPOINT, &[], None)
      .await
      .map(|_| ())
  }

  async fn read_champ_select_session(&self) -> Result<Option<SessionDetail>, LcuError> {
    // 404 until the session exists
    match self.lcu_json(CHAMP_SELECT_SESSION_ENDPOINT, &[], None).await {
      Ok(session) => Ok(Some(parse_champ_select_session(&session))),
      Err(LcuError::Status { status: 404, .. }) => Ok(None),
      Err(e) => Err(e),
    }
  }

  async fn read_all_players(&self) -> Result<Option<PlayersSplit>, LcuError> {
    let data = self.live_client_json().await?;
    Ok(split_all_players(&data, self.expected_roster_size))
  }
}
