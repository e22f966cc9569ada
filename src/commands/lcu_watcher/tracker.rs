// Session tracker: turns phase readings into one-time teammate/enemy reports

use crate::commands::error::LcuError;
use crate::commands::lcu_communication::LcuApi;
use crate::commands::types::{Phase, PhaseClass, PlayerRef, WatcherEvent};

use super::publisher::Publisher;
use super::retry::{RetryOutcome, RetryPolicy};
use super::types::SessionState;

/// Remembers whether the client is currently unreachable, so a dropped
/// connection is published once instead of on every tick.
#[derive(Debug, Default)]
pub struct ConnectionStatus {
  failing: bool,
}

impl ConnectionStatus {
  pub fn report_failure(&mut self, component: &str, err: &LcuError, publisher: &dyn Publisher) {
    tracing::warn!("[{}] Phase read failed: {}", component, err);
    if !self.failing {
      self.failing = true;
      publisher.publish(WatcherEvent::status(connection_message(component, err)));
    }
  }

  pub fn report_ok(&mut self, component: &str) {
    if self.failing {
      tracing::info!("[{}] League client reachable again", component);
      self.failing = false;
    }
  }
}

fn connection_message(component: &str, err: &LcuError) -> String {
  if err.is_timeout() {
    format!("{}: League client is not responding (request timed out)", component)
  } else {
    format!("{}: cannot reach League client ({})", component, err)
  }
}

pub struct SessionTracker {
  state: SessionState,
  enemy_retry: RetryPolicy,
  connection: ConnectionStatus,
}

impl SessionTracker {
  pub fn new(enemy_retry: RetryPolicy) -> Self {
    Self {
      state: SessionState::new(),
      enemy_retry,
      connection: ConnectionStatus::default(),
    }
  }

  pub fn state(&self) -> &SessionState {
    &self.state
  }

  /// One poll: read the phase, then react to it.
  pub async fn tick<A>(&mut self, api: &A, publisher: &dyn Publisher)
  where
    A: LcuApi + ?Sized,
  {
    match api.read_phase().await {
      Ok(phase) => {
        self.connection.report_ok("Analyzer");
        self.on_phase(phase, api, publisher).await;
      }
      // A failed read is "no change": state and last_phase stay as they are
      Err(e) => self
        .connection
        .report_failure("Analyzer", &e, publisher),
    }
  }

  pub async fn on_phase<A>(&mut self, phase: Phase, api: &A, publisher: &dyn Publisher)
  where
    A: LcuApi + ?Sized,
  {
    if self.state.last_phase.as_ref() != Some(&phase) {
      self.on_transition(&phase, publisher);
    }

    match phase.class() {
      PhaseClass::Selecting if !self.state.teammate_analysis_done => {
        self.analyze_teammates(api, publisher).await
      }
      PhaseClass::Live if !self.state.enemy_analysis_done => {
        self.analyze_enemies(api, publisher).await
      }
      _ => {}
    }
  }

  fn on_transition(&mut self, phase: &Phase, publisher: &dyn Publisher) {
    let from = self.state.last_phase.clone();
    tracing::info!(
      "[LCU Watcher] LCU status changed: {} -> {}",
      from.as_ref().map_or("<unknown>", |p| p.as_str()),
      phase
    );

    if self.state.is_new_match(phase) {
      tracing::info!("[LCU Watcher][SESSION] New match started, resetting analysis state");
      self.state.reset_for_new_match();
    }

    self.state.last_phase = Some(phase.clone());
    publisher.publish(WatcherEvent::PhaseChanged {
      from,
      to: phase.clone(),
    });

    if phase.class() == PhaseClass::PostGame
      && self.state.any_analysis_done()
      && !self.state.match_end_reported
    {
      self.state.match_end_reported = true;
      publisher.publish(WatcherEvent::MatchEnded);
    }
  }

  async fn analyze_teammates<A>(&mut self, api: &A, publisher: &dyn Publisher)
  where
    A: LcuApi + ?Sized,
  {
    match api.read_champ_select_session().await {
      Ok(Some(detail)) if !detail.roster.is_empty() => {
        tracing::info!(
          "[Analyzer] Found {} teammates in champ select",
          detail.roster.len()
        );
        self.state.remember_teammates(&detail.roster);
        self.state.teammate_analysis_done = true;
        publisher.publish(WatcherEvent::TeammatesFound(detail.roster));
      }
      // champ select is short-lived, so keep asking until the roster shows up
      Ok(_) => tracing::debug!("[Analyzer] Champ select roster not ready yet"),
      Err(e) => tracing::warn!("[Analyzer] Champ select session read failed: {}", e),
    }
  }

  async fn analyze_enemies<A>(&mut self, api: &A, publisher: &dyn Publisher)
  where
    A: LcuApi + ?Sized,
  {
    match api.read_all_players().await {
      Ok(Some(split)) => {
        let enemies = self.filter_enemies(split.enemies);
        if !enemies.is_empty() {
          tracing::info!(
            "[Analyzer] Found {} enemies against {} players on {}",
            enemies.len(),
            split.teammates.len(),
            split.local_team
          );
          self.state.enemy_analysis_done = true;
          publisher.publish(WatcherEvent::EnemiesFound(enemies));
          return;
        }
        tracing::debug!("[Analyzer] Live client listed no enemies after filtering");
      }
      Ok(None) => tracing::debug!("[Analyzer] Live client roster not ready yet"),
      Err(e) => tracing::debug!("[Analyzer] Live client read failed: {}", e),
    }

    match self
      .enemy_retry
      .record_failure(&mut self.state.enemy_retry_count)
    {
      RetryOutcome::Retry { attempt } => tracing::debug!(
        "[Analyzer] Enemy lookup attempt {}/{} came back empty",
        attempt,
        self.enemy_retry.max_attempts
      ),
      RetryOutcome::Exhausted { attempts } => {
        tracing::warn!(
          "[Analyzer] Giving up on enemy lookup after {} attempts",
          attempts
        );
        self.state.enemy_analysis_done = true;
        publisher.publish(WatcherEvent::EnemiesNotFound { attempts });
      }
    }
  }

  /// Drops enemy-tagged players that champ select already reported as
  /// teammates; the identifier set wins over the team tag.
  fn filter_enemies(&self, enemies: Vec<PlayerRef>) -> Vec<PlayerRef> {
    enemies
      .into_iter()
      .filter(|p| {
        let known = self.state.is_known_teammate(p);
        if known {
          tracing::warn!(
            "[Analyzer] {} is tagged as enemy but was a champ select teammate; dropping",
            p.riot_id()
          );
        }
        !known
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_wording_names_the_failure() {
    let err = LcuError::Status {
      endpoint: "/lol-gameflow/v1/gameflow-phase".to_string(),
      status: 503,
    };
    let message = connection_message("Analyzer", &err);
    assert!(message.starts_with("Analyzer: cannot reach League client ("));
    assert!(message.contains("503"));

    let message = connection_message("Ready Check", &LcuError::NotConnected);
    assert!(message.starts_with("Ready Check: cannot reach"));
  }
}
