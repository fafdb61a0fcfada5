//! Testing utilities for the adventure core.
//!
//! `TestHarness` wires a [`GameService`] to an in-memory store and a
//! deterministic narrator so scenarios run without network or disk. The
//! helpers reach through the store so tests can stage exact game states
//! (a known enemy, a wounded player) before acting.

use crate::narrative::Narrator;
use crate::persist::{MemoryStore, SessionRecord, Store};
use crate::session::{ActionOutcome, GameService, StartedGame};
use crate::world::Player;

/// A game service wired for deterministic scenario tests.
pub struct TestHarness {
    pub service: GameService<MemoryStore>,
}

impl TestHarness {
    /// Harness with a random dungeon and random combat rolls.
    pub fn new() -> Self {
        Self {
            service: GameService::new(MemoryStore::new(), Narrator::disabled()),
        }
    }

    /// Fully deterministic harness: pinned dungeon seed, pinned per-action
    /// RNG seed, fallback-only narrator.
    pub fn deterministic(dungeon_seed: u64, action_seed: u64) -> Self {
        Self {
            service: GameService::new(MemoryStore::new(), Narrator::disabled())
                .with_fixed_dungeon_seed(dungeon_seed)
                .with_fixed_action_seed(action_seed),
        }
    }

    /// Deterministic harness with a scripted narrator.
    pub fn scripted(lines: Vec<String>, dungeon_seed: u64) -> Self {
        Self {
            service: GameService::new(MemoryStore::new(), Narrator::scripted(lines))
                .with_fixed_dungeon_seed(dungeon_seed),
        }
    }

    pub async fn start(&self, username: &str) -> StartedGame {
        self.service
            .start_game(username, None)
            .await
            .expect("start_game on memory store cannot fail")
    }

    pub async fn act(&self, username: &str, command: &str) -> ActionOutcome {
        self.act_on(username, command, None).await
    }

    pub async fn act_on(
        &self,
        username: &str,
        command: &str,
        target: Option<&str>,
    ) -> ActionOutcome {
        self.service
            .perform_action(username, command, target)
            .await
            .expect("perform_action on a started game cannot fail")
    }

    /// Load the player record as the store sees it.
    pub async fn player(&self, username: &str) -> Player {
        self.service
            .store()
            .load_player(username)
            .await
            .expect("memory store cannot fail")
            .expect("player exists")
    }

    /// Load the player's active session record.
    pub async fn session(&self, username: &str) -> SessionRecord {
        let player = self.player(username).await;
        let id = player.active_session.expect("player has an active session");
        self.service
            .store()
            .load_session(id)
            .await
            .expect("memory store cannot fail")
            .expect("session exists")
    }

    /// Stage an exact session state: load, mutate, save.
    pub async fn update_session(&self, username: &str, mutate: impl FnOnce(&mut SessionRecord)) {
        let mut session = self.session(username).await;
        mutate(&mut session);
        self.service
            .store()
            .save_session(&session)
            .await
            .expect("memory store cannot fail");
    }

    /// Stage an exact player state: load, mutate, save.
    pub async fn update_player(&self, username: &str, mutate: impl FnOnce(&mut Player)) {
        let mut player = self.player(username).await;
        mutate(&mut player);
        self.service
            .store()
            .save_player(&player)
            .await
            .expect("memory store cannot fail");
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion helpers
// ============================================================================

/// Assert an outcome's response kind.
#[track_caller]
pub fn assert_kind(outcome: &ActionOutcome, kind: crate::actions::ResponseKind) {
    assert_eq!(
        outcome.response.kind, kind,
        "expected {:?}, got {:?}: {}",
        kind, outcome.response.kind, outcome.response.message
    );
}

/// Assert the stored player's health.
#[track_caller]
pub fn assert_health(player: &Player, current: i32, max: i32) {
    assert_eq!(
        (player.health, player.max_health),
        (current, max),
        "expected {current}/{max} hp, got {}/{}",
        player.health,
        player.max_health
    );
}
