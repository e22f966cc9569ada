// Tests for phase transitions, one-time reports and match resets

use super::test_helpers::*;
use crate::commands::lcu_watcher::publisher::RecordingPublisher;
use crate::commands::lcu_watcher::retry::RetryPolicy;
use crate::commands::lcu_watcher::tracker::SessionTracker;
use crate::commands::types::{Phase, WatcherEvent};

#[cfg(test)]
mod session_tracker_tests {
    use super::*;

    fn tracker() -> SessionTracker {
        SessionTracker::new(RetryPolicy::new(10))
    }

    async fn run(tracker: &mut SessionTracker, mock: &MockLcu, publisher: &RecordingPublisher, phases: &[Phase]) {
        for phase in phases {
            mock.push_phase(phase.clone());
            tracker.tick(mock, publisher).await;
        }
    }

    /// Test: Full match from lobby to end of game
    ///
    /// Scenario: Lobby, Lobby, ChampSelect (roster not ready), ChampSelect,
    /// InProgress three times (players ready on the third), EndOfGame.
    /// Expected: teammates on tick 4, enemies on tick 7, match end on tick 8.
    #[tokio::test]
    async fn test_full_match_scenario() {
        let mock = MockLcu::new();
        let publisher = RecordingPublisher::new();
        let mut tracker = tracker();

        run(&mut tracker, &mock, &publisher, &[Phase::Lobby, Phase::Lobby, Phase::ChampSelect]).await;
        assert_eq!(teammates_found(&publisher.events()), 0);

        mock.set_session(Some(session_with(ally_roster())));
        run(&mut tracker, &mock, &publisher, &[Phase::ChampSelect]).await;
        assert_eq!(teammates_found(&publisher.events()), 1);

        run(&mut tracker, &mock, &publisher, &[Phase::InProgress, Phase::InProgress]).await;
        assert_eq!(enemies_found(&publisher.events()), 0);
        assert_eq!(tracker.state().enemy_retry_count, 2);

        mock.set_players(Some(split_with(ally_roster(), enemy_roster())));
        run(&mut tracker, &mock, &publisher, &[Phase::InProgress, Phase::EndOfGame]).await;

        assert_eq!(
            publisher.events(),
            vec![
                WatcherEvent::PhaseChanged { from: None, to: Phase::Lobby },
                WatcherEvent::PhaseChanged { from: Some(Phase::Lobby), to: Phase::ChampSelect },
                WatcherEvent::TeammatesFound(ally_roster()),
                WatcherEvent::PhaseChanged { from: Some(Phase::ChampSelect), to: Phase::InProgress },
                WatcherEvent::EnemiesFound(enemy_roster()),
                WatcherEvent::PhaseChanged { from: Some(Phase::InProgress), to: Phase::EndOfGame },
                WatcherEvent::MatchEnded,
            ]
        );
    }

    /// Test: Teammates are reported once per session
    ///
    /// Scenario: Champ select lasts many ticks with the roster available.
    /// Expected: one TeammatesFound and no session reads after it.
    #[tokio::test]
    async fn test_teammates_reported_once() {
        let mock = MockLcu::new();
        mock.set_session(Some(session_with(ally_roster())));
        let publisher = RecordingPublisher::new();
        let mut tracker = tracker();

        run(&mut tracker, &mock, &publisher, &[Phase::Lobby]).await;
        run(&mut tracker, &mock, &publisher, &vec![Phase::ChampSelect; 6]).await;

        assert_eq!(teammates_found(&publisher.events()), 1);
        assert_eq!(mock.session_calls(), 1);
        assert!(tracker.state().teammate_analysis_done);
    }

    /// Test: A new match clears the previous session
    ///
    /// Scenario: One match runs to EndOfGame, the player goes back to the
    /// lobby and queues again.
    /// Expected: teammates and enemies are reported again for the second match.
    #[tokio::test]
    async fn test_new_match_resets_session() {
        let mock = MockLcu::new();
        mock.set_session(Some(session_with(ally_roster())));
        mock.set_players(Some(split_with(ally_roster(), enemy_roster())));
        let publisher = RecordingPublisher::new();
        let mut tracker = tracker();

        let one_match = [Phase::Lobby, Phase::ChampSelect, Phase::InProgress, Phase::EndOfGame];
        run(&mut tracker, &mock, &publisher, &one_match).await;
        run(&mut tracker, &mock, &publisher, &one_match).await;

        let events = publisher.events();
        assert_eq!(teammates_found(&events), 2);
        assert_eq!(enemies_found(&events), 2);
        assert_eq!(count_where(&events, |e| *e == WatcherEvent::MatchEnded), 2);
    }

    /// Test: No reset without passing through an idle phase
    ///
    /// Scenario: Champ select is dodged straight back into matchmaking, or an
    /// unknown phase shows up mid-session.
    /// Expected: the teammate report is not repeated.
    #[tokio::test]
    async fn test_non_idle_transitions_keep_session() {
        let mock = MockLcu::new();
        mock.set_session(Some(session_with(ally_roster())));
        let publisher = RecordingPublisher::new();
        let mut tracker = tracker();

        run(
            &mut tracker,
            &mock,
            &publisher,
            &[
                Phase::Lobby,
                Phase::ChampSelect,
                Phase::Matchmaking,
                Phase::Other("Unrecognised".to_string()),
                Phase::ChampSelect,
            ],
        )
        .await;

        assert_eq!(teammates_found(&publisher.events()), 1);
    }

    /// Test: Match end is suppressed when nothing was detected
    ///
    /// Scenario: The session reaches EndOfGame without any roster ever
    /// becoming available.
    /// Expected: no MatchEnded.
    #[tokio::test]
    async fn test_match_end_requires_a_report() {
        let mock = MockLcu::new();
        let publisher = RecordingPublisher::new();
        let mut tracker = tracker();

        run(&mut tracker, &mock, &publisher, &[Phase::Lobby, Phase::Matchmaking, Phase::EndOfGame]).await;

        assert!(!publisher.events().contains(&WatcherEvent::MatchEnded));
    }

    /// Test: Match end fires once per session
    ///
    /// Scenario: EndOfGame, WaitingForStats, EndOfGame again in one session.
    /// Expected: exactly one MatchEnded.
    #[tokio::test]
    async fn test_match_end_reported_once() {
        let mock = MockLcu::new();
        mock.set_session(Some(session_with(ally_roster())));
        let publisher = RecordingPublisher::new();
        let mut tracker = tracker();

        run(
            &mut tracker,
            &mock,
            &publisher,
            &[
                Phase::Lobby,
                Phase::ChampSelect,
                Phase::EndOfGame,
                Phase::WaitingForStats,
                Phase::EndOfGame,
            ],
        )
        .await;

        let events = publisher.events();
        assert_eq!(count_where(&events, |e| *e == WatcherEvent::MatchEnded), 1);
    }

    /// Test: Phase read failures leave state untouched
    ///
    /// Scenario: The client drops out for three ticks in the middle of champ
    /// select and comes back.
    /// Expected: state is unchanged, one status message for the whole outage,
    /// no PhaseChanged and no second teammate report.
    #[tokio::test]
    async fn test_phase_failure_is_no_change() {
        let mock = MockLcu::new();
        mock.set_session(Some(session_with(ally_roster())));
        let publisher = RecordingPublisher::new();
        let mut tracker = tracker();

        run(&mut tracker, &mock, &publisher, &[Phase::Lobby, Phase::ChampSelect]).await;
        let before = tracker.state().clone();
        publisher.take();

        for _ in 0..3 {
            mock.push_phase_failure();
            tracker.tick(&mock, &publisher).await;
        }
        assert_eq!(tracker.state(), &before);

        run(&mut tracker, &mock, &publisher, &[Phase::ChampSelect]).await;

        let events = publisher.events();
        assert_eq!(status_messages(&events), 1);
        assert_eq!(events.len(), 1);
        assert_eq!(tracker.state(), &before);
    }

    /// Test: PhaseChanged only on transitions
    ///
    /// Scenario: Repeated phases between real changes.
    /// Expected: one PhaseChanged per distinct change.
    #[tokio::test]
    async fn test_phase_changed_only_on_transition() {
        let mock = MockLcu::new();
        let publisher = RecordingPublisher::new();
        let mut tracker = tracker();

        run(
            &mut tracker,
            &mock,
            &publisher,
            &[Phase::Lobby, Phase::Lobby, Phase::Matchmaking, Phase::Matchmaking, Phase::Lobby],
        )
        .await;

        let changes = count_where(&publisher.events(), |e| matches!(e, WatcherEvent::PhaseChanged { .. }));
        assert_eq!(changes, 3);
    }

    /// Test: Champ-select teammates never show up as enemies
    ///
    /// Scenario: The live client tags a champ-select teammate (matched only by
    /// Riot ID) as an enemy.
    /// Expected: that player is dropped from EnemiesFound.
    #[tokio::test]
    async fn test_known_teammates_filtered_from_enemies() {
        let mock = MockLcu::new();
        mock.set_session(Some(session_with(ally_roster())));

        let mut enemies = enemy_roster();
        // live client only knows the Riot ID for this one
        enemies.push(player("Ally1#EUW", "Ally1"));
        mock.set_players(Some(split_with(Vec::new(), enemies)));

        let publisher = RecordingPublisher::new();
        let mut tracker = tracker();
        run(&mut tracker, &mock, &publisher, &[Phase::Lobby, Phase::ChampSelect, Phase::InProgress]).await;

        let reported = publisher
            .events()
            .into_iter()
            .find_map(|e| match e {
                WatcherEvent::EnemiesFound(players) => Some(players),
                _ => None,
            })
            .unwrap();
        assert_eq!(reported, enemy_roster());
    }

    /// Test: GameStart counts as live
    #[tokio::test]
    async fn test_game_start_triggers_enemy_lookup() {
        let mock = MockLcu::new();
        mock.set_players(Some(split_with(ally_roster(), enemy_roster())));
        let publisher = RecordingPublisher::new();
        let mut tracker = tracker();

        run(&mut tracker, &mock, &publisher, &[Phase::Lobby, Phase::GameStart, Phase::InProgress]).await;

        assert_eq!(enemies_found(&publisher.events()), 1);
        assert_eq!(mock.players_calls(), 1);
    }

    /// Test: Dropping to None mid-game starts a fresh session
    ///
    /// Scenario: InProgress, None, ChampSelect.
    /// Expected: flags and known teammates are fresh on entering ChampSelect.
    #[tokio::test]
    async fn test_none_between_games_resets() {
        let mock = MockLcu::new();
        mock.set_session(Some(session_with(ally_roster())));
        mock.set_players(Some(split_with(ally_roster(), enemy_roster())));
        let publisher = RecordingPublisher::new();
        let mut tracker = tracker();

        run(&mut tracker, &mock, &publisher, &[Phase::Lobby, Phase::ChampSelect, Phase::InProgress]).await;
        assert!(tracker.state().enemy_analysis_done);

        mock.set_session(None);
        run(&mut tracker, &mock, &publisher, &[Phase::None, Phase::ChampSelect]).await;

        let state = tracker.state();
        assert!(!state.teammate_analysis_done);
        assert!(!state.enemy_analysis_done);
        assert_eq!(state.enemy_retry_count, 0);
        assert!(state.known_teammates.is_empty());
    }

    /// Test: Session read errors are retried without a limit
    ///
    /// Scenario: The champ-select session endpoint fails for two ticks, then
    /// recovers with the roster.
    /// Expected: nothing reported and no retry budget spent while failing,
    /// one TeammatesFound after recovery.
    #[tokio::test]
    async fn test_session_errors_are_retried() {
        let mock = MockLcu::new();
        mock.set_session(Some(session_with(ally_roster())));
        mock.set_session_fails(true);
        let publisher = RecordingPublisher::new();
        let mut tracker = tracker();

        run(&mut tracker, &mock, &publisher, &[Phase::Lobby, Phase::ChampSelect, Phase::ChampSelect]).await;
        assert_eq!(teammates_found(&publisher.events()), 0);
        assert_eq!(status_messages(&publisher.events()), 0);
        assert!(!tracker.state().teammate_analysis_done);
        assert_eq!(tracker.state().enemy_retry_count, 0);

        mock.set_session_fails(false);
        run(&mut tracker, &mock, &publisher, &[Phase::ChampSelect, Phase::ChampSelect]).await;

        assert_eq!(teammates_found(&publisher.events()), 1);
        assert!(tracker.state().teammate_analysis_done);
        assert_eq!(mock.session_calls(), 3);
    }
}
