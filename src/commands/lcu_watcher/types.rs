// Per-session state for the analysis loop

use std::collections::HashSet;

use crate::commands::types::{Phase, PlayerRef};

/// Mutable record owned by the analysis loop; nothing else writes to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
  /// Previously observed phase, `None` until the first successful read.
  pub last_phase: Option<Phase>,
  pub teammate_analysis_done: bool,
  /// Set once enemies were reported or the retry budget ran out.
  pub enemy_analysis_done: bool,
  pub enemy_retry_count: u32,
  pub known_teammates: HashSet<String>,
  pub match_end_reported: bool,
}

impl SessionState {
  pub fn new() -> Self {
    Self::default()
  }

  /// Clears everything tied to the previous match. `last_phase` is kept so
  /// the caller can still record the transition that triggered the reset.
  pub fn reset_for_new_match(&mut self) {
    self.teammate_analysis_done = false;
    self.enemy_analysis_done = false;
    self.enemy_retry_count = 0;
    self.known_teammates.clear();
    self.match_end_reported = false;
  }

  pub fn remember_teammates(&mut self, roster: &[PlayerRef]) {
    for player in roster {
      self.known_teammates.extend(player.keys());
    }
  }

  pub fn is_known_teammate(&self, player: &PlayerRef) -> bool {
    player
      .keys()
      .iter()
      .any(|key| self.known_teammates.contains(key))
  }

  pub fn any_analysis_done(&self) -> bool {
    self.teammate_analysis_done || self.enemy_analysis_done
  }

  /// `true` when moving from `last_phase` into `next` starts a new match.
  pub fn is_new_match(&self, next: &Phase) -> bool {
    let was_idle = self.last_phase.as_ref().map_or(true, |p| p.is_idle());
    was_idle && !next.is_idle()
  }
}
