//! Typed game-world records.
//!
//! Contains every mutable state type the engine operates on: the dungeon
//! graph, rooms, enemy and NPC instances, and the persistent player record.
//! Catalog templates (immutable) live in [`crate::catalog`]; the types here
//! are the per-run instances derived from them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// IDs and directions
// ============================================================================

/// Identifier of a room within one dungeon floor.
///
/// Assigned in generation order. `generate(seed, floor)` must reproduce
/// identical dungeons, so ids cannot be random.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct RoomId(pub u32);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room-{}", self.0)
    }
}

/// Cardinal movement directions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// The direction that leads back.
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }

    pub fn all() -> [Direction; 4] {
        [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
        ]
    }

    /// Parse a direction from player input, accepting first-letter aliases.
    pub fn parse(input: &str) -> Option<Direction> {
        match input.trim().to_lowercase().as_str() {
            "north" | "n" => Some(Direction::North),
            "south" | "s" => Some(Direction::South),
            "east" | "e" => Some(Direction::East),
            "west" | "w" => Some(Direction::West),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Items
// ============================================================================

/// Categories of items in the drop tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    Consumable,
    Weapon,
    Key,
    Treasure,
}

/// Item rarity tier. Rare items are gated out of the ordinary loot pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
}

/// What a consumable does when used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsumableEffect {
    /// Heal by `min(power, max_health - health)`.
    Heal,
    /// Restore health *to* the item's power value when below it.
    RestoreTo,
    /// Grant the item's power as flat experience.
    Experience,
}

// ============================================================================
// Enemies and NPCs
// ============================================================================

/// A live enemy instance occupying a room.
///
/// Derived from a catalog template scaled by floor number; hp and alive are
/// per-room state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub xp_reward: u64,
    pub alive: bool,
}

/// An NPC instance in a room. The personality template is immutable; the
/// remaining-dialogue counter is per-instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    pub name: String,
    pub personality: String,
    pub talks_remaining: u32,
}

// ============================================================================
// Rooms and dungeons
// ============================================================================

/// A node in the dungeon graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub description: String,
    /// Directional exits. A BTreeMap keeps iteration order deterministic,
    /// which matters for flee-destination choice and map rendering.
    pub connections: BTreeMap<Direction, RoomId>,
    /// Difficulty tier 1-5.
    pub difficulty: u8,
    /// Item ids lying in the room.
    pub items: Vec<String>,
    pub enemy: Option<Enemy>,
    pub npc: Option<Npc>,
    pub is_entrance: bool,
    pub is_exit: bool,
    pub visited: bool,
}

impl Room {
    /// Whether a live enemy currently gates this room.
    pub fn has_live_enemy(&self) -> bool {
        self.enemy.as_ref().map(|e| e.alive).unwrap_or(false)
    }
}

/// One floor's full room graph, regenerated (never edited) on descent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dungeon {
    pub rooms: Vec<Room>,
    pub floor: u32,
    pub seed: u64,
}

impl Dungeon {
    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|r| r.id == id)
    }

    /// The entrance room. Generation guarantees exactly one.
    pub fn entrance(&self) -> &Room {
        self.rooms
            .iter()
            .find(|r| r.is_entrance)
            .expect("generated dungeon always has an entrance")
    }

    /// The exit room. Generation guarantees exactly one.
    pub fn exit(&self) -> &Room {
        self.rooms
            .iter()
            .find(|r| r.is_exit)
            .expect("generated dungeon always has an exit")
    }

    /// Ids of all rooms the player has visited on this floor.
    pub fn visited_room_ids(&self) -> Vec<RoomId> {
        self.rooms
            .iter()
            .filter(|r| r.visited)
            .map(|r| r.id)
            .collect()
    }
}

// ============================================================================
// Player
// ============================================================================

/// Default starting stats for a brand-new player.
pub const STARTING_HEALTH: i32 = 100;
pub const STARTING_ATTACK: i32 = 10;

/// The persistent player record.
///
/// Survives across games: level, experience, kills and inventory carry over;
/// location and health are reset when a new game starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub username: String,
    pub location: RoomId,
    pub health: i32,
    pub max_health: i32,
    pub attack: i32,
    pub level: u32,
    pub experience: u64,
    pub kills: u32,
    /// Item ids held.
    pub inventory: Vec<String>,
    pub active_session: Option<uuid::Uuid>,
    /// Reference to the owning board account, if any.
    pub owner: Option<uuid::Uuid>,
}

impl Player {
    /// Create a fresh player with default stats.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            location: RoomId(0),
            health: STARTING_HEALTH,
            max_health: STARTING_HEALTH,
            attack: STARTING_ATTACK,
            level: 1,
            experience: 0,
            kills: 0,
            inventory: Vec::new(),
            active_session: None,
            owner: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_opposites() {
        for dir in Direction::all() {
            assert_eq!(dir.opposite().opposite(), dir);
        }
        assert_eq!(Direction::North.opposite(), Direction::South);
        assert_eq!(Direction::East.opposite(), Direction::West);
    }

    #[test]
    fn test_direction_parse_aliases() {
        assert_eq!(Direction::parse("north"), Some(Direction::North));
        assert_eq!(Direction::parse("N"), Some(Direction::North));
        assert_eq!(Direction::parse("  e "), Some(Direction::East));
        assert_eq!(Direction::parse("up"), None);
    }

    #[test]
    fn test_new_player_defaults() {
        let player = Player::new("alice");
        assert_eq!(player.health, 100);
        assert_eq!(player.max_health, 100);
        assert_eq!(player.attack, 10);
        assert_eq!(player.level, 1);
        assert_eq!(player.experience, 0);
        assert!(player.inventory.is_empty());
        assert!(player.active_session.is_none());
    }

    #[test]
    fn test_room_enemy_gate() {
        let mut room = Room {
            id: RoomId(1),
            name: "Cell".to_string(),
            description: String::new(),
            connections: BTreeMap::new(),
            difficulty: 1,
            items: Vec::new(),
            enemy: None,
            npc: None,
            is_entrance: false,
            is_exit: false,
            visited: false,
        };
        assert!(!room.has_live_enemy());

        room.enemy = Some(Enemy {
            name: "Goblin".to_string(),
            hp: 20,
            max_hp: 20,
            attack: 6,
            defense: 1,
            xp_reward: 25,
            alive: true,
        });
        assert!(room.has_live_enemy());

        room.enemy.as_mut().unwrap().alive = false;
        assert!(!room.has_live_enemy());
    }

    #[test]
    fn test_connections_serialize_as_direction_keys() {
        let mut connections = BTreeMap::new();
        connections.insert(Direction::North, RoomId(1));
        connections.insert(Direction::East, RoomId(2));
        let json = serde_json::to_string(&connections).unwrap();
        let back: BTreeMap<Direction, RoomId> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, connections);
    }
}
