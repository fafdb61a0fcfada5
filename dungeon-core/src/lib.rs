//! Procedural dungeon and combat engine for the board's adventure door.
//!
//! This crate provides:
//! - Deterministic dungeon generation from a seed
//! - Turn-based combat with stat scaling, loot, and a death penalty
//! - Player progression persisted across sessions
//! - A command dispatcher with narrative enhancement and deterministic
//!   fallbacks when the text service is unavailable
//!
//! # Quick Start
//!
//! ```ignore
//! use dungeon_core::{FileStore, GameService, Narrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = FileStore::open("./door-data").await?;
//!     let service = GameService::new(store, Narrator::from_env());
//!
//!     let started = service.start_game("alice", None).await?;
//!     println!("{}", started.room.description);
//!
//!     let outcome = service.perform_action("alice", "look", None).await?;
//!     println!("{}", outcome.response.message);
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod catalog;
pub mod combat;
pub mod dungeon;
pub mod narrative;
pub mod persist;
pub mod progression;
pub mod rng;
pub mod session;
pub mod testing;
pub mod world;

// Primary public API
pub use actions::{ActionResponse, Command, ResponseKind};
pub use dungeon::{generate, MAX_FLOOR};
pub use narrative::Narrator;
pub use persist::{FileStore, MemoryStore, PersistError, SessionRecord, Store};
pub use rng::GameRng;
pub use session::{ActionOutcome, GameError, GameService, StartedGame};
pub use testing::TestHarness;
pub use world::{Direction, Dungeon, Enemy, Npc, Player, Room, RoomId};
