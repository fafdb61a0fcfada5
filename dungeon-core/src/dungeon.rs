//! Procedural dungeon generation.
//!
//! One floor at a time, fully determined by (seed, floor): the same pair
//! always yields an identical room graph, enemy roster and item spread.
//! Floors are regenerated on descent, never incrementally edited.

use crate::catalog::{self, ENTRANCE_CONSUMABLE, NPCS, ROOM_TEMPLATES};
use crate::rng::GameRng;
use crate::world::{Direction, Dungeon, Enemy, Npc, Room, RoomId};
use std::collections::BTreeMap;
use tracing::debug;

/// Deepest floor. Descending from this floor's exit ends the game in
/// victory instead of generating another floor.
pub const MAX_FLOOR: u32 = 5;

/// How many times an NPC instance will talk before running dry.
const NPC_TALKS: u32 = 3;

const ENTRANCE_TEXT: &str = "A rope ladder dangles from the hatch you climbed down through. \
     Cool air drifts up from the passages ahead.";

const EXIT_TEXT_DESCENT: &str = "A spiral stair winds down into darkness here. \
     The next floor waits below.";

const EXIT_TEXT_FINAL: &str = "An ancient gate stands here, its seals long broken. \
     Nothing lies deeper than this.";

/// Generate one floor's dungeon.
///
/// Each floor of a run draws from its own stream, mixed from the base seed
/// so a single seed reproduces the entire run.
pub fn generate(seed: u64, floor: u32) -> Dungeon {
    let mut rng = GameRng::new(seed + 1000 * floor as u64);

    let room_count = 8 + (rng.next_f64() * 5.0) as usize;
    let mut rooms = Vec::with_capacity(room_count);

    // Rooms and difficulty ramp.
    for i in 0..room_count {
        let template = rng
            .pick(&ROOM_TEMPLATES)
            .expect("room template catalog is never empty");
        let description = template.descriptions[rng.range(template.descriptions.len())];
        let difficulty = (floor + i as u32 / 3).min(5) as u8;

        rooms.push(Room {
            id: RoomId(i as u32),
            name: template.name.to_string(),
            description: description.to_string(),
            connections: BTreeMap::new(),
            difficulty,
            items: Vec::new(),
            enemy: None,
            npc: None,
            is_entrance: i == 0,
            is_exit: i == room_count - 1,
            visited: i == 0,
        });
    }

    // Enemy placement. The entrance is always safe.
    for (i, room) in rooms.iter_mut().enumerate().skip(1) {
        let probability = (0.3 + 0.1 * floor as f64 + 0.03 * i as f64).min(0.7);
        if !rng.chance(probability) {
            continue;
        }
        let candidates = catalog::eligible_enemies(room.difficulty);
        if let Some(template) = rng.pick(&candidates) {
            room.enemy = Some(scale_enemy(template, floor));
        }
    }

    // NPC placement in enemy-free, non-entrance rooms.
    for room in rooms.iter_mut().skip(1) {
        if room.enemy.is_some() || !rng.chance(0.2) {
            continue;
        }
        let template = rng.pick(&NPCS).expect("npc catalog is never empty");
        room.npc = Some(Npc {
            name: template.name.to_string(),
            personality: template.personality.to_string(),
            talks_remaining: NPC_TALKS,
        });
    }

    // Item placement: one Bernoulli trial per catalog item per room. The
    // entrance instead gets its fixed stock.
    for room in rooms.iter_mut() {
        if room.is_entrance {
            room.items.push(ENTRANCE_CONSUMABLE.to_string());
            continue;
        }
        for def in catalog::ITEMS.iter() {
            if rng.chance(def.base_drop_chance * (1.0 + 0.1 * floor as f64)) {
                room.items.push(def.id.to_string());
            }
        }
    }

    // Connectivity: a backbone i -> i+1 over north/east keeps every room
    // reachable; lateral shortcuts to i+2 are optional sugar. Connections
    // are never removed afterwards.
    for i in 0..room_count - 1 {
        let dir = if rng.chance(0.5) {
            Direction::North
        } else {
            Direction::East
        };
        connect(&mut rooms, i, i + 1, dir);
    }
    for i in 0..room_count.saturating_sub(2) {
        if !rng.chance(0.3) {
            continue;
        }
        let dir = Direction::all()[rng.range(4)];
        let free = !rooms[i].connections.contains_key(&dir)
            && !rooms[i + 2].connections.contains_key(&dir.opposite());
        if free {
            connect(&mut rooms, i, i + 2, dir);
        }
    }

    // Fixed narrative for the boundary rooms.
    rooms[0].description = ENTRANCE_TEXT.to_string();
    let exit_text = if floor < MAX_FLOOR {
        EXIT_TEXT_DESCENT
    } else {
        EXIT_TEXT_FINAL
    };
    rooms[room_count - 1].description = exit_text.to_string();

    debug!(seed, floor, rooms = room_count, "generated dungeon floor");

    Dungeon { rooms, floor, seed }
}

fn scale_enemy(template: &catalog::EnemyTemplate, floor: u32) -> Enemy {
    let steps = (floor - 1) as f64;
    let hp = (template.hp as f64 * (1.0 + 0.3 * steps)) as i32;
    Enemy {
        name: template.name.to_string(),
        hp,
        max_hp: hp,
        attack: (template.attack as f64 * (1.0 + 0.2 * steps)) as i32,
        defense: (template.defense as f64 * (1.0 + 0.15 * steps)) as i32,
        xp_reward: (template.xp as f64 * (1.0 + 0.25 * steps)) as u64,
        alive: true,
    }
}

fn connect(rooms: &mut [Room], from: usize, to: usize, dir: Direction) {
    let to_id = rooms[to].id;
    let from_id = rooms[from].id;
    rooms[from].connections.insert(dir, to_id);
    rooms[to].connections.insert(dir.opposite(), from_id);
}
