// Session and roster parsing for champ select and the in-game live client

use crate::commands::types::{PlayerRef, PlayersSplit, SessionDetail};

pub(crate) fn str_field<'a>(value: &'a serde_json::Value, key: &str) -> &'a str {
  value.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

// Helper function to build the roster from /lol-champ-select/v1/session
pub fn parse_champ_select_session(session_json: &serde_json::Value) -> SessionDetail {
  let mut roster = Vec::new();
  if let Some(my_team) = session_json.get("myTeam").and_then(|v| v.as_array()) {
    for member in my_team {
      let puuid = str_field(member, "puuid");
      // Bots and hidden-name queues report an empty puuid; they can't be matched later
      if puuid.is_empty() {
        continue;
      }

      let mut player = PlayerRef::new(
        puuid,
        str_field(member, "gameName"),
        str_field(member, "tagLine"),
      );
      player.champion_id = member
        .get("championId")
        .and_then(|v| v.as_i64())
        .filter(|id| *id > 0);
      roster.push(player);
    }
  }

  SessionDetail { roster }
}

fn live_player_ref(player: &serde_json::Value) -> PlayerRef {
  let game_name = str_field(player, "riotIdGameName");
  let tag_line = str_field(player, "riotIdTagLine");
  let riot_id = match str_field(player, "riotId") {
    "" => str_field(player, "summonerName"),
    id => id,
  };

  // Older live-client builds only fill summonerName ("name#tag")
  let (game_name, tag_line) = if game_name.is_empty() {
    match riot_id.split_once('#') {
      Some((name, tag)) => (name, tag),
      None => (riot_id, ""),
    }
  } else {
    (game_name, tag_line)
  };

  let id = match str_field(player, "puuid") {
    "" => riot_id.to_string(),
    puuid => puuid.to_string(),
  };

  let mut player_ref = PlayerRef::new(&id, game_name, tag_line);
  let champion = str_field(player, "championName");
  if !champion.is_empty() {
    player_ref.champion_name = Some(champion.to_string());
  }
  player_ref
}

/// Name the live client uses for the local player: Riot ID, or the legacy
/// summoner name on older builds. Empty while the game is loading.
pub(crate) fn active_player_name(all_game_data: &serde_json::Value) -> &str {
  let active = match all_game_data.get("activePlayer") {
    Some(active) => active,
    None => return "",
  };
  match str_field(active, "riotId") {
    "" => str_field(active, "summonerName"),
    name => name,
  }
}

pub(crate) fn is_same_player(player: &serde_json::Value, local_name: &str) -> bool {
  str_field(player, "riotId") == local_name || str_field(player, "summonerName") == local_name
}

/// Splits `/liveclientdata/allgamedata` into teammates and enemies by team tag.
///
/// Returns `None` while the game has not fully loaded: local player missing,
/// team tag empty, or fewer players than `expected_roster_size`.
pub fn split_all_players(
  all_game_data: &serde_json::Value,
  expected_roster_size: usize,
) -> Option<PlayersSplit> {
  let players = all_game_data.get("allPlayers")?.as_array()?;
  if players.len() < expected_roster_size {
    log_incomplete_roster(players.len(), expected_roster_size);
    return None;
  }

  let local_name = active_player_name(all_game_data);
  if local_name.is_empty() {
    return None;
  }

  let local_team = players
    .iter()
    .find(|p| is_same_player(p, local_name))
    .map(|p| str_field(p, "team"))?;
  if local_team.is_empty() {
    return None;
  }

  let mut split = PlayersSplit {
    local_team: local_team.to_string(),
    ..Default::default()
  };
  for player in players {
    let player_ref = live_player_ref(player);
    if str_field(player, "team") == local_team {
      split.teammates.push(player_ref);
    } else {
      split.enemies.push(player_ref);
    }
  }
  Some(split)
}

fn log_incomplete_roster(found: usize, expected: usize) {
  tracing::debug!(
    "[LCU Watcher][DEBUG] Live client lists {} of {} players; waiting for full roster",
    found,
    expected
  );
}
