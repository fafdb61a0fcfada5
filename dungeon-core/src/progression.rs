//! Experience and leveling.
//!
//! Pure arithmetic over the player record. `level == experience / 100 + 1`
//! holds after every mutation; these two functions are the only places the
//! engine touches experience, which is what keeps the invariant honest.

use crate::world::{Player, RoomId};

/// Experience required per level.
pub const XP_PER_LEVEL: u64 = 100;

/// Stat grants per level gained.
const MAX_HEALTH_PER_LEVEL: i32 = 10;
const ATTACK_PER_LEVEL: i32 = 2;

/// The level implied by an experience total.
pub fn level_for(experience: u64) -> u32 {
    (experience / XP_PER_LEVEL) as u32 + 1
}

/// A level gain produced by an experience grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelUp {
    pub from: u32,
    pub to: u32,
    pub max_health_gained: i32,
    pub attack_gained: i32,
}

/// Add experience and apply level-up grants exactly once.
///
/// Grants are derived from the before/after level delta; recomputing the
/// level from the same experience total never re-grants stats.
pub fn grant_experience(player: &mut Player, amount: u64) -> Option<LevelUp> {
    let before = player.level;
    player.experience += amount;
    let after = level_for(player.experience);
    player.level = after;

    if after <= before {
        return None;
    }

    let levels = (after - before) as i32;
    let health_gain = MAX_HEALTH_PER_LEVEL * levels;
    player.max_health += health_gain;
    player.health = (player.health + health_gain).min(player.max_health);
    player.attack += ATTACK_PER_LEVEL * levels;

    Some(LevelUp {
        from: before,
        to: after,
        max_health_gained: health_gain,
        attack_gained: ATTACK_PER_LEVEL * levels,
    })
}

/// Apply the death penalty: back to the entrance at half health, with half
/// the experience. The level is recomputed from the new total and may drop;
/// stat grants already received are kept.
pub fn apply_death_penalty(player: &mut Player, entrance: RoomId) {
    player.location = entrance;
    player.health = player.max_health / 2;
    player.experience /= 2;
    player.level = level_for(player.experience);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_formula() {
        assert_eq!(level_for(0), 1);
        assert_eq!(level_for(99), 1);
        assert_eq!(level_for(100), 2);
        assert_eq!(level_for(199), 2);
        assert_eq!(level_for(200), 3);
        assert_eq!(level_for(1000), 11);
    }

    #[test]
    fn test_grant_without_level_up() {
        let mut player = Player::new("alice");
        let result = grant_experience(&mut player, 50);
        assert!(result.is_none());
        assert_eq!(player.experience, 50);
        assert_eq!(player.level, 1);
        assert_eq!(player.max_health, 100);
        assert_eq!(player.attack, 10);
    }

    #[test]
    fn test_grant_with_level_up() {
        let mut player = Player::new("alice");
        player.experience = 90;
        player.health = 80;

        let up = grant_experience(&mut player, 25).unwrap();
        assert_eq!(up.from, 1);
        assert_eq!(up.to, 2);
        assert_eq!(player.experience, 115);
        assert_eq!(player.level, 2);
        assert_eq!(player.max_health, 110);
        // Healed by the same amount as the cap increase.
        assert_eq!(player.health, 90);
        assert_eq!(player.attack, 12);
    }

    #[test]
    fn test_multi_level_jump_grants_per_level() {
        let mut player = Player::new("alice");
        let up = grant_experience(&mut player, 250).unwrap();
        assert_eq!(up.from, 1);
        assert_eq!(up.to, 3);
        assert_eq!(player.max_health, 120);
        assert_eq!(player.attack, 14);
    }

    #[test]
    fn test_heal_clamped_to_new_cap() {
        let mut player = Player::new("alice");
        player.health = 100;
        grant_experience(&mut player, 100).unwrap();
        assert_eq!(player.max_health, 110);
        assert_eq!(player.health, 110);
    }

    #[test]
    fn test_level_invariant_over_sequence() {
        let mut player = Player::new("alice");
        let mut previous_level = player.level;
        for gain in [10, 40, 60, 5, 85, 120, 300, 1] {
            grant_experience(&mut player, gain);
            assert_eq!(player.level, level_for(player.experience));
            assert!(player.level >= previous_level, "level regressed on gain");
            previous_level = player.level;
        }
    }

    #[test]
    fn test_death_penalty() {
        let mut player = Player::new("alice");
        grant_experience(&mut player, 250);
        player.health = 5;
        player.location = RoomId(7);

        apply_death_penalty(&mut player, RoomId(0));

        assert_eq!(player.location, RoomId(0));
        assert_eq!(player.health, player.max_health / 2);
        assert_eq!(player.experience, 125);
        // Level recomputed from halved experience and allowed to drop.
        assert_eq!(player.level, 2);
        // Earlier stat grants are not revoked.
        assert_eq!(player.max_health, 120);
        assert_eq!(player.attack, 14);
    }

    #[test]
    fn test_death_penalty_rounds_down() {
        let mut player = Player::new("alice");
        player.max_health = 105;
        player.experience = 99;
        apply_death_penalty(&mut player, RoomId(0));
        assert_eq!(player.health, 52);
        assert_eq!(player.experience, 49);
        assert_eq!(player.level, 1);
    }
}
