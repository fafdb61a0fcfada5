//! Combat resolution.
//!
//! Attack and flee against the enemy occupying the player's current room.
//! Damage formulas are pure helpers so tests can pin the jitter; the
//! resolver functions draw jitter from the game RNG and mutate the enemy
//! instance and player record in place.

use crate::catalog::{self, ITEMS};
use crate::progression::{self, LevelUp};
use crate::rng::GameRng;
use crate::world::{Dungeon, Player, Rarity, RoomId};
use tracing::info;

/// Chance that a defeated enemy drops loot into the room.
const LOOT_CHANCE: f64 = 0.4;
/// Chance that the loot pool also admits rare items.
const RARE_LOOT_CHANCE: f64 = 0.1;
/// Chance that fleeing succeeds.
const FLEE_CHANCE: f64 = 0.6;

/// Player damage: attack plus best weapon, less enemy defense, plus jitter
/// in [-2, 2]. Never below 1.
pub fn attack_damage(attack: i32, weapon_power: i32, defense: i32, jitter: i32) -> i32 {
    (attack + weapon_power - defense + jitter).max(1)
}

/// Enemy counterattack damage: enemy attack less jitter in [0, 2]. Never
/// below 1.
pub fn counter_damage(enemy_attack: i32, jitter: i32) -> i32 {
    (enemy_attack - jitter).max(1)
}

/// What one combat action did.
#[derive(Debug, Clone, Default)]
pub struct CombatReport {
    /// Narration lines in event order.
    pub lines: Vec<String>,
    pub enemy_defeated: bool,
    /// Item id dropped into the room, if the loot roll hit.
    pub loot: Option<String>,
    pub level_up: Option<LevelUp>,
    /// The player hit zero health and took the death penalty.
    pub player_died: bool,
    /// Where the player ended up (changes on flee or death).
    pub player_location: RoomId,
}

/// Resolve one attack by the player against the live enemy in their room.
///
/// The caller must have checked that a live enemy is present.
pub fn resolve_attack(player: &mut Player, dungeon: &mut Dungeon, rng: &mut GameRng) -> CombatReport {
    let entrance = dungeon.entrance().id;
    let weapon = catalog::best_weapon_power(&player.inventory);
    let mut report = CombatReport {
        player_location: player.location,
        ..Default::default()
    };

    let room = dungeon
        .room_mut(player.location)
        .expect("player location always resolves to a room");
    let enemy = room
        .enemy
        .as_mut()
        .expect("resolve_attack requires a live enemy");

    let jitter = rng.jitter(-2, 2);
    let damage = attack_damage(player.attack, weapon, enemy.defense, jitter);
    enemy.hp -= damage;
    report.lines.push(format!(
        "You strike the {} for {} damage.",
        enemy.name, damage
    ));

    if enemy.hp <= 0 {
        enemy.alive = false;
        let name = enemy.name.clone();
        let xp = enemy.xp_reward;
        player.kills += 1;
        report.enemy_defeated = true;
        report
            .lines
            .push(format!("The {name} falls! You gain {xp} experience."));

        report.level_up = progression::grant_experience(player, xp);
        if let Some(up) = &report.level_up {
            report.lines.push(format!(
                "You reach level {}! Max health +{}, attack +{}.",
                up.to, up.max_health_gained, up.attack_gained
            ));
        }
        info!(player = %player.username, enemy = %name, xp, "enemy defeated");

        if rng.chance(LOOT_CHANCE) {
            let include_rare = rng.chance(RARE_LOOT_CHANCE);
            let pool: Vec<_> = ITEMS
                .iter()
                .filter(|def| include_rare || def.rarity != Rarity::Rare)
                .collect();
            if let Some(def) = rng.pick(&pool) {
                room.items.push(def.id.to_string());
                report.loot = Some(def.id.to_string());
                report
                    .lines
                    .push(format!("The {} dropped: {}.", name, def.name));
            }
        }
    } else {
        let counter_jitter = rng.jitter(0, 2);
        let damage = counter_damage(enemy.attack, counter_jitter);
        let name = enemy.name.clone();
        player.health -= damage;
        report.lines.push(format!(
            "The {} hits back for {} damage. ({}/{} hp)",
            name,
            damage,
            player.health.max(0),
            player.max_health
        ));

        if player.health <= 0 {
            progression::apply_death_penalty(player, entrance);
            report.player_died = true;
            report.lines.push(
                "You collapse... and wake at the entrance, battered and poorer in spirit."
                    .to_string(),
            );
            info!(player = %player.username, "player died and respawned at entrance");
        }
    }

    report.player_location = player.location;
    report
}

/// Resolve one flee attempt from the live enemy in the player's room.
///
/// On success the player moves to a uniformly random connected room; on
/// failure the enemy lands one counterattack and the player stays put.
pub fn resolve_flee(player: &mut Player, dungeon: &mut Dungeon, rng: &mut GameRng) -> CombatReport {
    let entrance = dungeon.entrance().id;
    let mut report = CombatReport {
        player_location: player.location,
        ..Default::default()
    };

    if rng.chance(FLEE_CHANCE) {
        let exits: Vec<RoomId> = dungeon
            .room(player.location)
            .expect("player location always resolves to a room")
            .connections
            .values()
            .copied()
            .collect();
        let destination = *rng
            .pick(&exits)
            .expect("every generated room has at least one exit");
        player.location = destination;
        let dest = dungeon
            .room_mut(destination)
            .expect("connections only point at real rooms");
        dest.visited = true;
        report
            .lines
            .push(format!("You slip away to the {}.", dest.name));
    } else {
        let room = dungeon
            .room_mut(player.location)
            .expect("player location always resolves to a room");
        let enemy = room
            .enemy
            .as_mut()
            .expect("resolve_flee requires a live enemy");
        let jitter = rng.jitter(0, 2);
        let damage = counter_damage(enemy.attack, jitter);
        let name = enemy.name.clone();
        player.health -= damage;
        report.lines.push(format!(
            "The {} blocks your escape and hits you for {} damage.",
            name, damage
        ));

        if player.health <= 0 {
            progression::apply_death_penalty(player, entrance);
            report.player_died = true;
            report.lines.push(
                "You collapse... and wake at the entrance, battered and poorer in spirit."
                    .to_string(),
            );
            info!(player = %player.username, "player died and respawned at entrance");
        }
    }

    report.player_location = player.location;
    report
}
