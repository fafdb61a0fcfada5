//! Persistence boundary.
//!
//! The surrounding board owns the real document store; the engine only
//! needs read/write-by-key semantics for two document kinds: one player
//! record per username and one session record per session id. Serialization
//! happens here and nowhere else; game logic works on the typed records.

use crate::world::{Dungeon, Player, RoomId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Current save-format version for both document kinds.
const SAVE_VERSION: u32 = 1;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// One session document: the live dungeon and its bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Save format version for compatibility checking.
    pub version: u32,
    pub id: Uuid,
    pub username: String,
    pub floor: u32,
    pub dungeon: Dungeon,
    pub visited_rooms: Vec<RoomId>,
    pub active: bool,
}

impl SessionRecord {
    /// Create a fresh session for a newly generated dungeon.
    pub fn new(username: impl Into<String>, dungeon: Dungeon) -> Self {
        let visited_rooms = dungeon.visited_room_ids();
        Self {
            version: SAVE_VERSION,
            id: Uuid::new_v4(),
            username: username.into(),
            floor: dungeon.floor,
            dungeon,
            visited_rooms,
            active: true,
        }
    }

    /// Re-derive the visited-room list from the dungeon's room flags.
    /// Called before every save so the stored list never drifts.
    pub fn refresh_visited(&mut self) {
        self.visited_rooms = self.dungeon.visited_room_ids();
    }
}

/// One player document, wrapped for version gating.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PlayerRecord {
    version: u32,
    player: Player,
}

/// Read/write-by-key access to player and session documents.
///
/// The engine treats every write as last-writer-wins; no cross-key
/// transactions are required.
#[allow(async_fn_in_trait)]
pub trait Store {
    async fn load_player(&self, username: &str) -> Result<Option<Player>, PersistError>;
    async fn save_player(&self, player: &Player) -> Result<(), PersistError>;
    async fn load_session(&self, id: Uuid) -> Result<Option<SessionRecord>, PersistError>;
    async fn save_session(&self, session: &SessionRecord) -> Result<(), PersistError>;
}

// ============================================================================
// In-memory store
// ============================================================================

/// In-memory store. Documents round-trip through JSON so tests exercise the
/// same serialization path as the file store.
#[derive(Default)]
pub struct MemoryStore {
    players: Mutex<HashMap<String, String>>,
    sessions: Mutex<HashMap<Uuid, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    async fn load_player(&self, username: &str) -> Result<Option<Player>, PersistError> {
        let players = self.players.lock().await;
        match players.get(username) {
            Some(json) => Ok(Some(decode_player(json)?)),
            None => Ok(None),
        }
    }

    async fn save_player(&self, player: &Player) -> Result<(), PersistError> {
        let json = encode_player(player)?;
        self.players
            .lock()
            .await
            .insert(player.username.clone(), json);
        Ok(())
    }

    async fn load_session(&self, id: Uuid) -> Result<Option<SessionRecord>, PersistError> {
        let sessions = self.sessions.lock().await;
        match sessions.get(&id) {
            Some(json) => Ok(Some(decode_session(json)?)),
            None => Ok(None),
        }
    }

    async fn save_session(&self, session: &SessionRecord) -> Result<(), PersistError> {
        let json = serde_json::to_string(session)?;
        self.sessions.lock().await.insert(session.id, json);
        Ok(())
    }
}

// ============================================================================
// File-backed store
// ============================================================================

/// File-backed store: one JSON document per key under a root directory
/// (`players/<username>.json`, `sessions/<uuid>.json`).
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at the given directory, creating it if needed.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, PersistError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("players")).await?;
        fs::create_dir_all(root.join("sessions")).await?;
        Ok(Self { root })
    }

    fn player_path(&self, username: &str) -> PathBuf {
        let sanitized: String = username
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        self.root.join("players").join(format!("{sanitized}.json"))
    }

    fn session_path(&self, id: Uuid) -> PathBuf {
        self.root.join("sessions").join(format!("{id}.json"))
    }
}

impl Store for FileStore {
    async fn load_player(&self, username: &str) -> Result<Option<Player>, PersistError> {
        match fs::read_to_string(self.player_path(username)).await {
            Ok(json) => Ok(Some(decode_player(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_player(&self, player: &Player) -> Result<(), PersistError> {
        let json = encode_player(player)?;
        fs::write(self.player_path(&player.username), json).await?;
        Ok(())
    }

    async fn load_session(&self, id: Uuid) -> Result<Option<SessionRecord>, PersistError> {
        match fs::read_to_string(self.session_path(id)).await {
            Ok(json) => Ok(Some(decode_session(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_session(&self, session: &SessionRecord) -> Result<(), PersistError> {
        let json = serde_json::to_string(session)?;
        fs::write(self.session_path(session.id), json).await?;
        Ok(())
    }
}

// ============================================================================
// Document encoding
// ============================================================================

fn encode_player(player: &Player) -> Result<String, PersistError> {
    let record = PlayerRecord {
        version: SAVE_VERSION,
        player: player.clone(),
    };
    Ok(serde_json::to_string(&record)?)
}

fn decode_player(json: &str) -> Result<Player, PersistError> {
    let record: PlayerRecord = serde_json::from_str(json)?;
    if record.version != SAVE_VERSION {
        return Err(PersistError::VersionMismatch {
            expected: SAVE_VERSION,
            found: record.version,
        });
    }
    Ok(record.player)
}

fn decode_session(json: &str) -> Result<SessionRecord, PersistError> {
    let record: SessionRecord = serde_json::from_str(json)?;
    if record.version != SAVE_VERSION {
        return Err(PersistError::VersionMismatch {
            expected: SAVE_VERSION,
            found: record.version,
        });
    }
    Ok(record)
}
