//! GameService - the adventure core's public API.
//!
//! The surrounding board calls exactly two operations: `start_game` when a
//! caller opens the door game, and `perform_action` for every command
//! thereafter. Each call is a read-modify-write cycle against the store:
//! load player and session, mutate in memory, write back when the
//! dispatcher flags a mutation. Actions for the same player are serialized
//! behind a per-username lock so two simultaneous commands can never
//! interleave their reads and writes.

use crate::actions::{self, ActionResponse};
use crate::dungeon;
use crate::narrative::Narrator;
use crate::persist::{PersistError, SessionRecord, Store};
use crate::rng::GameRng;
use crate::world::{Player, Room};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Errors from the game service.
///
/// Only caller mistakes and storage failures surface as errors; anything
/// the player can cause in-game comes back as a structured
/// [`ActionResponse`] instead.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("unknown player: {0}")]
    UnknownPlayer(String),

    #[error("no active session for {0} - start a new game")]
    NoActiveSession(String),

    #[error("persistence error: {0}")]
    Persist(#[from] PersistError),
}

/// Result of starting a new game.
#[derive(Debug, Clone)]
pub struct StartedGame {
    pub player: Player,
    /// The entrance room view of the fresh dungeon.
    pub room: Room,
}

/// Result of one performed action.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub response: ActionResponse,
    /// The player record after the action.
    pub player: Player,
}

/// The adventure core service.
pub struct GameService<S> {
    store: S,
    narrator: Narrator,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    fixed_dungeon_seed: Option<u64>,
    fixed_action_seed: Option<u64>,
}

impl<S: Store> GameService<S> {
    pub fn new(store: S, narrator: Narrator) -> Self {
        Self {
            store,
            narrator,
            locks: Mutex::new(HashMap::new()),
            fixed_dungeon_seed: None,
            fixed_action_seed: None,
        }
    }

    /// Pin the dungeon seed for every new game. Deterministic replays and
    /// tests only; live games draw a fresh random seed per start.
    pub fn with_fixed_dungeon_seed(mut self, seed: u64) -> Self {
        self.fixed_dungeon_seed = Some(seed);
        self
    }

    /// Pin the per-action combat RNG seed. Deterministic tests only.
    pub fn with_fixed_action_seed(mut self, seed: u64) -> Self {
        self.fixed_action_seed = Some(seed);
        self
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Start a brand-new game for the named player.
    ///
    /// Creates the player record on first use, deactivates any previous
    /// session, generates a fresh dungeon, and resets location and health.
    /// Level, experience, inventory and kills carry over between games.
    pub async fn start_game(
        &self,
        username: &str,
        owner: Option<Uuid>,
    ) -> Result<StartedGame, GameError> {
        let lock = self.lock_for(username).await;
        let _guard = lock.lock().await;

        let mut player = match self.store.load_player(username).await? {
            Some(player) => player,
            None => {
                info!(username, "creating new player record");
                let mut player = Player::new(username);
                player.owner = owner;
                player
            }
        };

        // The previous session, if any, is left behind as an inactive
        // record; the board owns actual cleanup.
        if let Some(previous) = player.active_session {
            if let Some(mut session) = self.store.load_session(previous).await? {
                if session.active {
                    session.active = false;
                    self.store.save_session(&session).await?;
                }
            }
        }

        let seed = self
            .fixed_dungeon_seed
            .unwrap_or_else(|| rand::random::<u32>() as u64);
        let dungeon = dungeon::generate(seed, 1);
        let mut session = SessionRecord::new(username, dungeon);

        player.location = session.dungeon.entrance().id;
        player.health = player.max_health;
        player.active_session = Some(session.id);

        session.refresh_visited();
        self.store.save_session(&session).await?;
        self.store.save_player(&player).await?;
        info!(username, seed, session = %session.id, "started new game");

        let room = session.dungeon.entrance().clone();
        Ok(StartedGame { player, room })
    }

    /// Perform one player command against the active session.
    pub async fn perform_action(
        &self,
        username: &str,
        command: &str,
        target: Option<&str>,
    ) -> Result<ActionOutcome, GameError> {
        let lock = self.lock_for(username).await;
        let _guard = lock.lock().await;

        let mut player = self
            .store
            .load_player(username)
            .await?
            .ok_or_else(|| GameError::UnknownPlayer(username.to_string()))?;
        let session_id = player
            .active_session
            .ok_or_else(|| GameError::NoActiveSession(username.to_string()))?;
        let mut session = self
            .store
            .load_session(session_id)
            .await?
            .filter(|s| s.active)
            .ok_or_else(|| GameError::NoActiveSession(username.to_string()))?;

        let mut rng = match self.fixed_action_seed {
            Some(seed) => GameRng::new(seed),
            None => GameRng::from_entropy(),
        };

        let response =
            actions::dispatch(&mut player, &mut session, &mut rng, &self.narrator, command, target)
                .await;

        if response.persist {
            session.refresh_visited();
            self.store.save_session(&session).await?;
            self.store.save_player(&player).await?;
            debug!(username, session = %session.id, command, "persisted state after action");
        }

        Ok(ActionOutcome { response, player })
    }

    /// Get or create the serialization lock for a username.
    async fn lock_for(&self, username: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(username.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
