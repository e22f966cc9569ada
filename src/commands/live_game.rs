// Live game view built from /liveclientdata/allgamedata

use serde::Serialize;
use serde_json::Value;

use super::lcu_watcher::session::{active_player_name, is_same_player, str_field};

// Empty slot and the trinkets
const HIDDEN_ITEM_IDS: [i64; 4] = [0, 3340, 3363, 3364];
const RECENT_KILL_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveItem {
  pub id: i64,
  pub name: String,
  pub count: i64,
  pub can_use: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LivePlayer {
  pub summoner_name: String,
  pub riot_id: String,
  pub game_name: String,
  pub tag_line: String,
  pub champion: String,
  pub champion_raw: String,
  pub level: i64,
  pub is_dead: bool,
  pub respawn_timer: f64,
  pub kills: i64,
  pub deaths: i64,
  pub assists: i64,
  pub cs: i64,
  pub kda: String,
  pub items: Vec<LiveItem>,
  pub keystone: String,
  pub keystone_id: i64,
  pub primary_rune: String,
  pub secondary_rune: String,
  pub spell1: String,
  pub spell2: String,
  pub team: String,
  pub position: String,
  pub is_current_player: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveGameInfo {
  pub mode: String,
  /// Seconds since the game started, one decimal.
  pub time: f64,
  /// Same as `time`, as `MM:SS`.
  pub clock: String,
  pub map_name: String,
  pub map_number: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KillEvent {
  pub killer: String,
  pub victim: String,
  pub assisters: Vec<String>,
  pub time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveGameView {
  pub teammates: Vec<LivePlayer>,
  pub enemies: Vec<LivePlayer>,
  pub game_info: LiveGameInfo,
  /// Newest first.
  pub recent_kills: Vec<KillEvent>,
  pub active_player_team: Option<String>,
}

fn text_at<'a>(value: &'a Value, pointer: &str, default: &'a str) -> &'a str {
  value
    .pointer(pointer)
    .and_then(|v| v.as_str())
    .unwrap_or(default)
}

fn int_at(value: &Value, pointer: &str, default: i64) -> i64 {
  value
    .pointer(pointer)
    .and_then(|v| v.as_i64())
    .unwrap_or(default)
}

fn float_at(value: &Value, pointer: &str) -> f64 {
  value
    .pointer(pointer)
    .and_then(|v| v.as_f64())
    .unwrap_or(0.0)
}

fn one_decimal(value: f64) -> f64 {
  (value * 10.0).round() / 10.0
}

/// `MM:SS`; minutes keep growing past an hour.
pub fn format_clock(seconds: f64) -> String {
  let total = seconds.max(0.0) as u64;
  format!("{:02}:{:02}", total / 60, total % 60)
}

fn live_items(player: &Value) -> Vec<LiveItem> {
  let items = match player.get("items").and_then(|v| v.as_array()) {
    Some(items) => items,
    None => return Vec::new(),
  };

  items
    .iter()
    .filter_map(|item| {
      let id = int_at(item, "/itemID", 0);
      if HIDDEN_ITEM_IDS.contains(&id) {
        return None;
      }
      Some(LiveItem {
        id,
        name: text_at(item, "/displayName", "").to_string(),
        count: int_at(item, "/count", 1),
        can_use: item.get("canUse").and_then(|v| v.as_bool()).unwrap_or(false),
      })
    })
    .collect()
}

fn live_player(player: &Value, local_name: &str) -> LivePlayer {
  let summoner_name = text_at(player, "/summonerName", "Unknown");
  let kills = int_at(player, "/scores/kills", 0);
  let deaths = int_at(player, "/scores/deaths", 0);
  let assists = int_at(player, "/scores/assists", 0);
  let respawn_timer = float_at(player, "/respawnTimer");

  LivePlayer {
    summoner_name: summoner_name.to_string(),
    riot_id: text_at(player, "/riotId", summoner_name).to_string(),
    game_name: text_at(player, "/riotIdGameName", "").to_string(),
    tag_line: text_at(player, "/riotIdTagLine", "").to_string(),
    champion: text_at(player, "/championName", "Unknown").to_string(),
    champion_raw: text_at(player, "/rawChampionName", "").to_string(),
    level: int_at(player, "/level", 0),
    is_dead: player.get("isDead").and_then(|v| v.as_bool()).unwrap_or(false),
    respawn_timer: if respawn_timer > 0.0 {
      one_decimal(respawn_timer)
    } else {
      0.0
    },
    kills,
    deaths,
    assists,
    cs: int_at(player, "/scores/creepScore", 0),
    kda: format!("{}/{}/{}", kills, deaths, assists),
    items: live_items(player),
    keystone: text_at(player, "/runes/keystone/displayName", "").to_string(),
    keystone_id: int_at(player, "/runes/keystone/id", 0),
    primary_rune: text_at(player, "/runes/primaryRuneTree/displayName", "").to_string(),
    secondary_rune: text_at(player, "/runes/secondaryRuneTree/displayName", "").to_string(),
    spell1: text_at(player, "/summonerSpells/summonerSpellOne/displayName", "").to_string(),
    spell2: text_at(player, "/summonerSpells/summonerSpellTwo/displayName", "").to_string(),
    team: text_at(player, "/team", "UNKNOWN").to_string(),
    position: text_at(player, "/position", "NONE").to_string(),
    is_current_player: !local_name.is_empty() && is_same_player(player, local_name),
  }
}

fn recent_kills(all_game_data: &Value) -> Vec<KillEvent> {
  let events = match all_game_data.pointer("/events/Events").and_then(|v| v.as_array()) {
    Some(events) => events,
    None => return Vec::new(),
  };

  events
    .iter()
    .rev()
    .filter(|e| str_field(e, "EventName") == "ChampionKill")
    .take(RECENT_KILL_LIMIT)
    .map(|e| KillEvent {
      killer: str_field(e, "KillerName").to_string(),
      victim: str_field(e, "VictimName").to_string(),
      assisters: e
        .get("Assisters")
        .and_then(|v| v.as_array())
        .map(|names| {
          names
            .iter()
            .filter_map(|n| n.as_str().map(|s| s.to_string()))
            .collect()
        })
        .unwrap_or_default(),
      time: one_decimal(float_at(e, "/EventTime")),
    })
    .collect()
}

/// Formats the whole live-client payload: both teams seen from the local
/// player, game clock and the last few kills. Unlike the roster split used by
/// the analyzer this never reports "not ready"; a loading game just yields
/// short lists and no local team.
pub fn format_live_game(all_game_data: &Value) -> LiveGameView {
  let local_name = active_player_name(all_game_data);
  let players: &[Value] = all_game_data
    .get("allPlayers")
    .and_then(|v| v.as_array())
    .map(|v| v.as_slice())
    .unwrap_or(&[]);

  let active_player_team = players
    .iter()
    .find(|p| !local_name.is_empty() && is_same_player(p, local_name))
    .map(|p| str_field(p, "team").to_string());

  let mut teammates = Vec::new();
  let mut enemies = Vec::new();
  for player in players {
    let formatted = live_player(player, local_name);
    if Some(str_field(player, "team")) == active_player_team.as_deref() {
      teammates.push(formatted);
    } else {
      enemies.push(formatted);
    }
  }

  let time = one_decimal(float_at(all_game_data, "/gameData/gameTime"));
  LiveGameView {
    teammates,
    enemies,
    game_info: LiveGameInfo {
      mode: text_at(all_game_data, "/gameData/gameMode", "CLASSIC").to_string(),
      time,
      clock: format_clock(time),
      map_name: text_at(all_game_data, "/gameData/mapName", "").to_string(),
      map_number: int_at(all_game_data, "/gameData/mapNumber", 11),
    },
    recent_kills: recent_kills(all_game_data),
    active_player_team,
  }
}
