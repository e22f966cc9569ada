// Match history summaries built from /lol-match-history responses

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
  pub champion_id: i64,
  pub kills: i64,
  pub deaths: i64,
  pub assists: i64,
  pub kda: String,
  pub win: bool,
  pub game_mode: String,
  pub gold_earned: i64,
  pub cs: i64,
  pub game_creation: Option<i64>,
  pub duration: i64,
  pub time_ago: String,
  pub match_id: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub subteam_placement: Option<i64>,
}

/// Request timeout for a history query: bigger pages take noticeably longer.
pub fn history_timeout(count: u32) -> Duration {
  let secs = 5 + (count as u64 / 50) * 3;
  Duration::from_secs(secs.min(20))
}

/// Summarises `games.games[]`, using the first participant as the queried player.
pub fn summarize_history(history: &serde_json::Value, now: DateTime<Utc>) -> Vec<GameSummary> {
  let games = match history
    .get("games")
    .and_then(|g| g.get("games"))
    .and_then(|g| g.as_array())
  {
    Some(games) => games,
    None => return Vec::new(),
  };

  games
    .iter()
    .filter_map(|game| summarize_game(game, now))
    .collect()
}

fn summarize_game(game: &serde_json::Value, now: DateTime<Utc>) -> Option<GameSummary> {
  let participant = game.get("participants")?.as_array()?.first()?;
  let stats = participant.get("stats").cloned().unwrap_or_default();
  let stat = |key: &str| stats.get(key).and_then(|v| v.as_i64()).unwrap_or(0);

  let kills = stat("kills");
  let deaths = stat("deaths");
  let assists = stat("assists");
  let game_mode = game
    .get("gameMode")
    .and_then(|v| v.as_str())
    .unwrap_or("UNKNOWN")
    .to_string();
  let game_creation = game.get("gameCreation").and_then(|v| v.as_i64());

  // Arena reports a placement instead of a plain win/loss
  let subteam_placement = if game_mode == "CHERRY" {
    Some(stat("subteamPlacement"))
  } else {
    None
  };

  Some(GameSummary {
    champion_id: participant
      .get("championId")
      .and_then(|v| v.as_i64())
      .unwrap_or(0),
    kills,
    deaths,
    assists,
    kda: format!("{}/{}/{}", kills, deaths, assists),
    win: stats.get("win").and_then(|v| v.as_bool()).unwrap_or(false),
    game_mode,
    gold_earned: stat("goldEarned"),
    cs: stat("totalMinionsKilled") + stat("neutralMinionsKilled"),
    game_creation,
    duration: game.get("gameDuration").and_then(|v| v.as_i64()).unwrap_or(0),
    time_ago: game_creation
      .map(|ms| time_ago(ms, now))
      .unwrap_or_else(|| "unknown".to_string()),
    match_id: game.get("gameId").and_then(|v| v.as_i64()),
    subteam_placement,
  })
}

pub fn time_ago(created_ms: i64, now: DateTime<Utc>) -> String {
  let created = match DateTime::<Utc>::from_timestamp_millis(created_ms) {
    Some(t) => t,
    None => return "unknown".to_string(),
  };
  let diff = now.signed_duration_since(created);

  if diff.num_days() > 0 {
    format!("{} days ago", diff.num_days())
  } else if diff.num_hours() > 0 {
    format!("{} hours ago", diff.num_hours())
  } else if diff.num_minutes() > 0 {
    format!("{} minutes ago", diff.num_minutes())
  } else {
    "just now".to_string()
  }
}

/// Endpoints that have served a single game by id across client builds,
/// in the order they are tried.
pub fn match_detail_endpoints(match_id: i64) -> Vec<String> {
  vec![
    format!("/lol-match-history/v1/matches/{}", match_id),
    format!("/lol-match-history/v1/products/lol/matches/{}", match_id),
    format!("/lol-match-history/v1/games/{}", match_id),
    format!("/lol-match-history/v1/match/{}", match_id),
    format!("/match/v1/matches/{}", match_id),
  ]
}

/// Some builds answer with `{ "game": { ... } }`; return the inner game.
pub fn unwrap_game(mut value: Value) -> Value {
  if value.get("game").map_or(false, Value::is_object) {
    if let Some(game) = value.get_mut("game") {
      return game.take();
    }
  }
  value
}

/// How many games to request so that `index` is in the page.
pub fn history_fetch_count(index: usize) -> u32 {
  (index.saturating_add(20)).min(200) as u32
}

/// Takes game `index` (0 = most recent) out of a raw history response.
pub fn game_at(mut history: Value, index: usize) -> Option<Value> {
  history
    .pointer_mut("/games/games")
    .and_then(|games| games.as_array_mut())
    .and_then(|games| games.get_mut(index))
    .map(Value::take)
}

fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
  value
    .get(key)
    .and_then(|v| v.as_str())
    .filter(|s| !s.is_empty())
}

// Participants carry ids either at top level or under "player"
fn participant_str<'a>(participant: &'a Value, key: &str) -> Option<&'a str> {
  non_empty_str(participant, key)
    .or_else(|| participant.get("player").and_then(|p| non_empty_str(p, key)))
}

/// Identifiers that can be used to look a participant up.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParticipantKeys {
  pub puuid: Option<String>,
  pub summoner_id: Option<u64>,
  pub summoner_name: Option<String>,
}

pub fn participant_keys(participant: &Value) -> ParticipantKeys {
  let summoner_id = participant
    .get("summonerId")
    .and_then(|v| v.as_u64())
    .or_else(|| participant.pointer("/player/summonerId").and_then(|v| v.as_u64()))
    .filter(|id| *id > 0);

  ParticipantKeys {
    puuid: participant_str(participant, "puuid").map(|s| s.to_string()),
    summoner_id,
    summoner_name: participant_str(participant, "summonerName").map(|s| s.to_string()),
  }
}

pub fn has_summoner_name(participant: &Value) -> bool {
  non_empty_str(participant, "summonerName").is_some()
}

fn riot_id_from(value: &Value) -> Option<String> {
  let game_name = non_empty_str(value, "gameName").or_else(|| non_empty_str(value, "summonerName"))?;
  Some(match non_empty_str(value, "tagLine") {
    Some(tag) => format!("{}#{}", game_name, tag),
    None => game_name.to_string(),
  })
}

/// Copies name, icon and puuid from a summoner lookup onto a participant.
pub fn apply_summoner_info(participant: &mut Value, info: &Value) {
  let name = non_empty_str(info, "displayName")
    .map(|s| s.to_string())
    .or_else(|| riot_id_from(info));
  let icon = info
    .get("profileIconId")
    .or_else(|| info.get("profileIcon"))
    .filter(|v| !v.is_null())
    .cloned();
  let puuid = non_empty_str(info, "puuid").map(|s| s.to_string());

  let Some(fields) = participant.as_object_mut() else {
    return;
  };
  if let Some(name) = name {
    fields.insert("summonerName".to_string(), Value::String(name));
  }
  if let Some(icon) = icon {
    fields.insert("profileIcon".to_string(), icon);
  }
  if let Some(puuid) = puuid {
    fields.insert("puuid".to_string(), Value::String(puuid));
  }
}

/// Fills names still missing after lookups from `participantIdentities`.
pub fn fill_from_identities(game: &mut Value) {
  let identities: HashMap<i64, Value> = game
    .get("participantIdentities")
    .and_then(|v| v.as_array())
    .map(|idents| {
      idents
        .iter()
        .filter_map(|ident| {
          let id = ident.get("participantId")?.as_i64()?;
          Some((id, ident.get("player").cloned().unwrap_or_default()))
        })
        .collect()
    })
    .unwrap_or_default();
  if identities.is_empty() {
    return;
  }

  let participants = match game.get_mut("participants").and_then(|v| v.as_array_mut()) {
    Some(participants) => participants,
    None => return,
  };
  for participant in participants.iter_mut() {
    if has_summoner_name(participant) {
      continue;
    }
    let player = match participant
      .get("participantId")
      .and_then(|v| v.as_i64())
      .and_then(|id| identities.get(&id))
    {
      Some(player) => player,
      None => continue,
    };

    let needs_icon = participant.get("profileIcon").map_or(true, Value::is_null);
    let needs_puuid = non_empty_str(participant, "puuid").is_none();
    let Some(fields) = participant.as_object_mut() else {
      continue;
    };
    if let Some(name) = riot_id_from(player) {
      fields.insert("summonerName".to_string(), Value::String(name));
    }
    if needs_icon {
      if let Some(icon) = player.get("profileIcon").filter(|v| !v.is_null()) {
        fields.insert("profileIcon".to_string(), icon.clone());
      }
    }
    if needs_puuid {
      if let Some(puuid) = non_empty_str(player, "puuid") {
        fields.insert("puuid".to_string(), Value::String(puuid.to_string()));
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;
  use serde_json::json;

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
  }

  #[test]
  fn summarizes_first_participant() {
    let created = now().timestamp_millis() - 3 * 3600 * 1000;
    let history = json!({
      "games": { "games": [
        {
          "gameId": 7001,
          "gameMode": "ARAM",
          "gameCreation": created,
          "gameDuration": 1320,
          "participants": [{
            "championId": 157,
            "stats": {
              "kills": 12, "deaths": 3, "assists": 20, "win": true,
              "goldEarned": 14500, "totalMinionsKilled": 40, "neutralMinionsKilled": 2
            }
          }]
        },
        { "gameId": 7002, "participants": [] }
      ]}
    });

    let games = summarize_history(&history, now());
    assert_eq!(games.len(), 1);
    let g = &games[0];
    assert_eq!(g.champion_id, 157);
    assert_eq!(g.kda, "12/3/20");
    assert!(g.win);
    assert_eq!(g.cs, 42);
    assert_eq!(g.time_ago, "3 hours ago");
    assert_eq!(g.match_id, Some(7001));
    assert_eq!(g.subteam_placement, None);
  }

  #[test]
  fn arena_games_carry_placement() {
    let history = json!({
      "games": { "games": [{
        "gameMode": "CHERRY",
        "participants": [{ "championId": 1, "stats": { "subteamPlacement": 2 } }]
      }]}
    });
    let games = summarize_history(&history, now());
    assert_eq!(games[0].subteam_placement, Some(2));
    assert_eq!(games[0].time_ago, "unknown");
  }

  #[test]
  fn missing_games_yield_empty_list() {
    assert!(summarize_history(&json!({}), now()).is_empty());
  }

  #[test]
  fn time_ago_buckets() {
    let ms = now().timestamp_millis();
    assert_eq!(time_ago(ms - 2 * 86_400_000, now()), "2 days ago");
    assert_eq!(time_ago(ms - 5 * 60_000, now()), "5 minutes ago");
    assert_eq!(time_ago(ms - 10_000, now()), "just now");
  }

  #[test]
  fn timeout_scales_with_count_and_caps() {
    assert_eq!(history_timeout(20), Duration::from_secs(5));
    assert_eq!(history_timeout(100), Duration::from_secs(11));
    assert_eq!(history_timeout(1000), Duration::from_secs(20));
  }

  #[test]
  fn nested_game_is_unwrapped() {
    let wrapped = json!({ "game": { "gameId": 9 } });
    assert_eq!(unwrap_game(wrapped), json!({ "gameId": 9 }));

    let plain = json!({ "gameId": 9, "game": "CLASSIC" });
    assert_eq!(unwrap_game(plain.clone()), plain);
  }

  #[test]
  fn game_at_index_and_fetch_count() {
    let history = json!({ "games": { "games": [{ "gameId": 1 }, { "gameId": 2 }] } });
    assert_eq!(game_at(history.clone(), 1), Some(json!({ "gameId": 2 })));
    assert_eq!(game_at(history, 2), None);

    assert_eq!(history_fetch_count(0), 20);
    assert_eq!(history_fetch_count(15), 35);
    assert_eq!(history_fetch_count(500), 200);
  }

  #[test]
  fn participant_keys_read_nested_player() {
    let keys = participant_keys(&json!({
      "puuid": "",
      "player": { "puuid": "p-9", "summonerId": 44 }
    }));
    assert_eq!(
      keys,
      ParticipantKeys {
        puuid: Some("p-9".to_string()),
        summoner_id: Some(44),
        summoner_name: None,
      }
    );
  }

  #[test]
  fn summoner_info_prefers_display_name_then_riot_id() {
    let mut participant = json!({ "participantId": 1 });
    apply_summoner_info(
      &mut participant,
      &json!({ "displayName": "", "gameName": "Alpha", "tagLine": "EUW", "profileIconId": 7, "puuid": "p-1" }),
    );
    assert_eq!(participant["summonerName"], "Alpha#EUW");
    assert_eq!(participant["profileIcon"], 7);
    assert_eq!(participant["puuid"], "p-1");
  }

  #[test]
  fn identities_fill_only_missing_names() {
    let mut game = json!({
      "participants": [
        { "participantId": 1, "summonerName": "Known" },
        { "participantId": 2, "profileIcon": 3 },
        { "participantId": 3 }
      ],
      "participantIdentities": [
        { "participantId": 1, "player": { "gameName": "Other", "tagLine": "X" } },
        { "participantId": 2, "player": { "gameName": "Omega", "tagLine": "NA1", "profileIcon": 99, "puuid": "p-2" } }
      ]
    });

    fill_from_identities(&mut game);

    let participants = &game["participants"];
    assert_eq!(participants[0]["summonerName"], "Known");
    assert_eq!(participants[1]["summonerName"], "Omega#NA1");
    assert_eq!(participants[1]["profileIcon"], 3);
    assert_eq!(participants[1]["puuid"], "p-2");
    assert!(!has_summoner_name(&participants[2]));
  }
}
