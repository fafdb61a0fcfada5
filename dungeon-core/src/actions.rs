//! Player command dispatch.
//!
//! Single entry point routing one command at a time against the in-memory
//! dungeon and player record. Commands that would move the player, shuffle
//! items, open dialogue or descend are gated while a live enemy occupies
//! the room; combat itself is delegated to [`crate::combat`].

use crate::catalog::{self, NPCS};
use crate::combat;
use crate::dungeon::{self, MAX_FLOOR};
use crate::narrative::Narrator;
use crate::persist::SessionRecord;
use crate::progression;
use crate::rng::GameRng;
use crate::world::{ConsumableEffect, Direction, ItemType, Player, Room};
use tracing::info;

/// Classification of an action's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Ok,
    /// A live enemy blocks the attempted action.
    Blocked,
    /// Unrecognized or inapplicable command.
    Invalid,
    /// The named target (item, NPC, enemy, way down) is absent.
    NotFound,
    /// The final floor has been cleared; the session is over.
    Victory,
}

/// Structured result of one dispatched command.
#[derive(Debug, Clone)]
pub struct ActionResponse {
    pub kind: ResponseKind,
    pub message: String,
    /// Whether the player and session records must be written back.
    pub persist: bool,
}

impl ActionResponse {
    fn read_only(kind: ResponseKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            persist: false,
        }
    }

    fn mutated(message: impl Into<String>) -> Self {
        Self {
            kind: ResponseKind::Ok,
            message: message.into(),
            persist: true,
        }
    }
}

/// The player-facing command set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Look,
    Move(Direction),
    Fight,
    Flee,
    Take,
    Use,
    Talk,
    Descend,
    Inventory,
    Status,
    Map,
    Help,
}

impl Command {
    /// Parse a command word, accepting the usual aliases.
    pub fn parse(input: &str) -> Option<Command> {
        if let Some(direction) = Direction::parse(input) {
            return Some(Command::Move(direction));
        }
        match input.trim().to_lowercase().as_str() {
            "look" => Some(Command::Look),
            "fight" | "attack" => Some(Command::Fight),
            "flee" | "run" => Some(Command::Flee),
            "take" | "get" => Some(Command::Take),
            "use" => Some(Command::Use),
            "talk" => Some(Command::Talk),
            "descend" | "down" => Some(Command::Descend),
            "inventory" | "inv" | "i" => Some(Command::Inventory),
            "status" | "stats" => Some(Command::Status),
            "map" => Some(Command::Map),
            "help" => Some(Command::Help),
            _ => None,
        }
    }
}

/// Route one command. Mutates the player and session in memory and flags
/// `persist` on every branch that changed them; the caller owns the
/// write-back.
pub async fn dispatch(
    player: &mut Player,
    session: &mut SessionRecord,
    rng: &mut GameRng,
    narrator: &Narrator,
    input: &str,
    target: Option<&str>,
) -> ActionResponse {
    let Some(command) = Command::parse(input) else {
        return ActionResponse::read_only(
            ResponseKind::Invalid,
            format!("Unknown command '{}'. Type 'help' for the command list.", input.trim()),
        );
    };

    match command {
        Command::Look => look(player, session),
        Command::Move(direction) => move_player(player, session, narrator, direction).await,
        Command::Fight => fight(player, session, rng),
        Command::Flee => flee(player, session, rng),
        Command::Take => take(player, session, target),
        Command::Use => use_item(player, session, target),
        Command::Talk => talk(player, session, narrator, target).await,
        Command::Descend => descend(player, session),
        Command::Inventory => ActionResponse::read_only(ResponseKind::Ok, render_inventory(player)),
        Command::Status => ActionResponse::read_only(ResponseKind::Ok, render_status(player, session)),
        Command::Map => ActionResponse::read_only(ResponseKind::Ok, render_map(player, session)),
        Command::Help => ActionResponse::read_only(ResponseKind::Ok, help_text()),
    }
}

fn current_room<'a>(player: &Player, session: &'a SessionRecord) -> &'a Room {
    session
        .dungeon
        .room(player.location)
        .expect("player location always resolves to a room")
}

/// Blocked-by-enemy response, or None when the room is clear.
fn enemy_gate(player: &Player, session: &SessionRecord) -> Option<ActionResponse> {
    let room = current_room(player, session);
    room.enemy
        .as_ref()
        .filter(|e| e.alive)
        .map(|e| {
            ActionResponse::read_only(
                ResponseKind::Blocked,
                format!("The {} blocks your way! Fight or flee.", e.name),
            )
        })
}

// ============================================================================
// Commands
// ============================================================================

fn look(player: &Player, session: &SessionRecord) -> ActionResponse {
    ActionResponse::read_only(ResponseKind::Ok, render_room(current_room(player, session)))
}

async fn move_player(
    player: &mut Player,
    session: &mut SessionRecord,
    narrator: &Narrator,
    direction: Direction,
) -> ActionResponse {
    if let Some(blocked) = enemy_gate(player, session) {
        return blocked;
    }

    let Some(&destination) = current_room(player, session).connections.get(&direction) else {
        return ActionResponse::read_only(
            ResponseKind::Invalid,
            format!("You cannot go {direction} from here."),
        );
    };

    // First visit to an ordinary room gets one shot at enhanced flavor
    // text; entrance and exit keep their fixed narrative.
    let enhancement = {
        let room = session
            .dungeon
            .room(destination)
            .expect("connections only point at real rooms");
        if !room.visited && !room.is_entrance && !room.is_exit {
            Some((room.name.clone(), room.description.clone(), room.difficulty))
        } else {
            None
        }
    };
    if let Some((name, base, difficulty)) = enhancement {
        let text = narrator.enhance_room(&name, &base, difficulty).await;
        session
            .dungeon
            .room_mut(destination)
            .expect("connections only point at real rooms")
            .description = text;
    }

    player.location = destination;
    let room = session
        .dungeon
        .room_mut(destination)
        .expect("connections only point at real rooms");
    room.visited = true;

    let message = format!("You head {direction}.\n\n{}", render_room(room));
    ActionResponse::mutated(message)
}

fn fight(player: &mut Player, session: &mut SessionRecord, rng: &mut GameRng) -> ActionResponse {
    if !current_room(player, session).has_live_enemy() {
        return ActionResponse::read_only(ResponseKind::NotFound, "There is nothing to fight here.");
    }
    let report = combat::resolve_attack(player, &mut session.dungeon, rng);
    ActionResponse::mutated(report.lines.join("\n"))
}

fn flee(player: &mut Player, session: &mut SessionRecord, rng: &mut GameRng) -> ActionResponse {
    if !current_room(player, session).has_live_enemy() {
        return ActionResponse::read_only(
            ResponseKind::NotFound,
            "There is nothing to flee from.",
        );
    }
    let report = combat::resolve_flee(player, &mut session.dungeon, rng);
    ActionResponse::mutated(report.lines.join("\n"))
}

fn take(player: &mut Player, session: &mut SessionRecord, target: Option<&str>) -> ActionResponse {
    if let Some(blocked) = enemy_gate(player, session) {
        return blocked;
    }
    let Some(query) = target.filter(|t| !t.trim().is_empty()) else {
        return ActionResponse::read_only(ResponseKind::Invalid, "Take what?");
    };

    let room = session
        .dungeon
        .room_mut(player.location)
        .expect("player location always resolves to a room");
    let found = room.items.iter().position(|id| matches_item(id, query));
    match found {
        Some(index) => {
            let id = room.items.remove(index);
            let name = catalog::item(&id).map(|d| d.name).unwrap_or(id.as_str());
            let message = format!("You take the {name}.");
            player.inventory.push(id);
            ActionResponse::mutated(message)
        }
        None => ActionResponse::read_only(ResponseKind::NotFound, "There is no such item here."),
    }
}

fn use_item(
    player: &mut Player,
    session: &mut SessionRecord,
    target: Option<&str>,
) -> ActionResponse {
    // Changing items mid-combat would break the enemy gate invariant, so
    // consumables are off the table while an enemy is alive.
    if let Some(blocked) = enemy_gate(player, session) {
        return blocked;
    }
    let Some(query) = target.filter(|t| !t.trim().is_empty()) else {
        return ActionResponse::read_only(ResponseKind::Invalid, "Use what?");
    };

    let Some(index) = player.inventory.iter().position(|id| matches_item(id, query)) else {
        return ActionResponse::read_only(ResponseKind::NotFound, "You don't have that.");
    };
    // An id that fell out of the catalog (stale save) is unusable, not fatal.
    let Some(def) = catalog::item(&player.inventory[index]) else {
        return ActionResponse::read_only(
            ResponseKind::Invalid,
            "That item crumbles uselessly in your hands.",
        );
    };

    if def.item_type != ItemType::Consumable {
        return ActionResponse::read_only(
            ResponseKind::Invalid,
            format!("The {} is not something you can use.", def.name),
        );
    }

    // Consumed regardless of how much of the effect applies.
    player.inventory.remove(index);

    let message = match def.effect.expect("consumables always define an effect") {
        ConsumableEffect::Heal => {
            let healed = def.power.min(player.max_health - player.health).max(0);
            player.health += healed;
            format!(
                "You use the {} and recover {} health. ({}/{} hp)",
                def.name, healed, player.health, player.max_health
            )
        }
        ConsumableEffect::RestoreTo => {
            let floor_value = def.power.min(player.max_health);
            if player.health < floor_value {
                player.health = floor_value;
                format!(
                    "The {} knits your wounds. ({}/{} hp)",
                    def.name, player.health, player.max_health
                )
            } else {
                format!("You use the {}, but feel no different.", def.name)
            }
        }
        ConsumableEffect::Experience => {
            let mut message = format!(
                "You study the {} and gain {} experience.",
                def.name, def.power
            );
            if let Some(up) = progression::grant_experience(player, def.power as u64) {
                message.push_str(&format!(
                    "\nYou reach level {}! Max health +{}, attack +{}.",
                    up.to, up.max_health_gained, up.attack_gained
                ));
            }
            message
        }
    };

    ActionResponse::mutated(message)
}

async fn talk(
    player: &mut Player,
    session: &mut SessionRecord,
    narrator: &Narrator,
    target: Option<&str>,
) -> ActionResponse {
    if let Some(blocked) = enemy_gate(player, session) {
        return blocked;
    }

    let (npc_name, personality, room_name) = {
        let room = current_room(player, session);
        let Some(npc) = &room.npc else {
            return ActionResponse::read_only(
                ResponseKind::NotFound,
                "There is no one here to talk to.",
            );
        };
        if npc.talks_remaining == 0 {
            return ActionResponse::read_only(
                ResponseKind::NotFound,
                format!("The {} has nothing more to say.", npc.name),
            );
        }
        (npc.name.clone(), npc.personality.clone(), room.name.clone())
    };

    let fallback = NPCS
        .iter()
        .find(|t| t.name == npc_name)
        .map(|t| t.fallback_line)
        .unwrap_or("They nod, but say nothing.");
    let player_message = target.unwrap_or("Hello.");
    let line = narrator
        .npc_dialogue(&npc_name, &personality, player_message, &room_name, fallback)
        .await;

    let room = session
        .dungeon
        .room_mut(player.location)
        .expect("player location always resolves to a room");
    if let Some(npc) = room.npc.as_mut() {
        npc.talks_remaining -= 1;
    }

    ActionResponse::mutated(format!("{npc_name} says: \"{line}\""))
}

fn descend(player: &mut Player, session: &mut SessionRecord) -> ActionResponse {
    if let Some(blocked) = enemy_gate(player, session) {
        return blocked;
    }
    if !current_room(player, session).is_exit {
        return ActionResponse::read_only(
            ResponseKind::Invalid,
            "There is no way down from here.",
        );
    }

    if session.floor >= MAX_FLOOR {
        session.active = false;
        info!(player = %player.username, floor = session.floor, "final floor cleared");
        return ActionResponse {
            kind: ResponseKind::Victory,
            message: format!(
                "You step through the ancient gate. Floor {MAX_FLOOR} is conquered - \
                 the depths hold nothing more for you. Victory!\n\
                 Type 'start' on the board to begin a new delve."
            ),
            persist: true,
        };
    }

    // The old floor's volatile state goes down with the old dungeon.
    let next_floor = session.floor + 1;
    let next = dungeon::generate(session.dungeon.seed, next_floor);
    player.location = next.entrance().id;
    session.floor = next_floor;
    session.dungeon = next;
    info!(player = %player.username, floor = next_floor, "descended");

    let entrance = current_room(player, session);
    ActionResponse::mutated(format!(
        "You climb down to floor {next_floor}.\n\n{}",
        render_room(entrance)
    ))
}

// ============================================================================
// Rendering
// ============================================================================

fn render_room(room: &Room) -> String {
    let mut out = format!("=== {} ===\n{}", room.name, room.description);

    let exits: Vec<&str> = room.connections.keys().map(|d| d.name()).collect();
    if exits.is_empty() {
        out.push_str("\nThere are no exits.");
    } else {
        out.push_str(&format!("\nExits: {}.", exits.join(", ")));
    }

    if !room.items.is_empty() {
        let names: Vec<&str> = room
            .items
            .iter()
            .map(|id| catalog::item(id).map(|d| d.name).unwrap_or(id.as_str()))
            .collect();
        out.push_str(&format!("\nYou see: {}.", names.join(", ")));
    }

    if let Some(enemy) = room.enemy.as_ref().filter(|e| e.alive) {
        out.push_str(&format!(
            "\nA {} bars the way! ({}/{} hp)",
            enemy.name, enemy.hp, enemy.max_hp
        ));
    } else if let Some(npc) = &room.npc {
        out.push_str(&format!("\n{} is here.", npc.name));
    }

    if room.is_exit {
        out.push_str("\nA way down leads deeper.");
    }

    out
}

fn render_inventory(player: &Player) -> String {
    if player.inventory.is_empty() {
        return "You are carrying nothing.".to_string();
    }
    let names: Vec<&str> = player
        .inventory
        .iter()
        .map(|id| catalog::item(id).map(|d| d.name).unwrap_or(id.as_str()))
        .collect();
    format!("You are carrying: {}.", names.join(", "))
}

fn render_status(player: &Player, session: &SessionRecord) -> String {
    let weapon = catalog::best_weapon_power(&player.inventory);
    let next_level = player.level as u64 * progression::XP_PER_LEVEL;
    format!(
        "{} - level {} (xp {}/{})\n\
         Health: {}/{}  Attack: {}{}  Kills: {}\n\
         Floor {} of {}",
        player.username,
        player.level,
        player.experience,
        next_level,
        player.health,
        player.max_health,
        player.attack,
        if weapon > 0 {
            format!(" (+{weapon} weapon)")
        } else {
            String::new()
        },
        player.kills,
        session.floor,
        MAX_FLOOR,
    )
}

/// Render the floor map. Unvisited rooms are masked; the player's room is
/// marked with `@`.
fn render_map(player: &Player, session: &SessionRecord) -> String {
    let mut out = format!("Floor {} map:", session.floor);
    for room in &session.dungeon.rooms {
        let marker = if room.id == player.location { '@' } else { ' ' };
        if room.visited {
            let exits: Vec<&str> = room.connections.keys().map(|d| d.name()).collect();
            out.push_str(&format!(
                "\n{} [{}] {} - exits: {}",
                marker,
                room.id,
                room.name,
                exits.join(", ")
            ));
        } else {
            out.push_str(&format!("\n{} [{}] unknown", marker, room.id));
        }
    }
    out
}

fn help_text() -> String {
    "Commands:\n\
     look              - describe the current room\n\
     north/south/east/west (n/s/e/w) - move\n\
     fight             - attack the enemy here\n\
     flee              - try to escape combat\n\
     take <item>       - pick up an item\n\
     use <item>        - use a consumable from your pack\n\
     talk [message]    - speak with whoever is here\n\
     descend           - take the way down (exit room only)\n\
     inventory         - list what you carry\n\
     status            - your stats and progress\n\
     map               - chart of explored rooms\n\
     help              - this text"
        .to_string()
}

fn matches_item(id: &str, query: &str) -> bool {
    let q = query.trim().to_lowercase();
    if id == q {
        return true;
    }
    catalog::item(id)
        .map(|d| d.name.to_lowercase() == q)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::generate;
    use crate::world::Enemy;

    fn fixture() -> (Player, SessionRecord, GameRng, Narrator) {
        // Seed 2's first floor keeps the rooms around the entrance free of
        // enemies, so movement tests are not gated by generated monsters.
        let dungeon = generate(2, 1);
        let mut player = Player::new("alice");
        player.location = dungeon.entrance().id;
        let session = SessionRecord::new("alice", dungeon);
        (player, session, GameRng::new(1), Narrator::disabled())
    }

    fn place_enemy(session: &mut SessionRecord, location: crate::world::RoomId) {
        session.dungeon.room_mut(location).unwrap().enemy = Some(Enemy {
            name: "Goblin".to_string(),
            hp: 20,
            max_hp: 20,
            attack: 6,
            defense: 0,
            xp_reward: 25,
            alive: true,
        });
    }

    async fn act(
        player: &mut Player,
        session: &mut SessionRecord,
        rng: &mut GameRng,
        narrator: &Narrator,
        input: &str,
        target: Option<&str>,
    ) -> ActionResponse {
        dispatch(player, session, rng, narrator, input, target).await
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("look"), Some(Command::Look));
        assert_eq!(Command::parse("N"), Some(Command::Move(Direction::North)));
        assert_eq!(Command::parse("attack"), Some(Command::Fight));
        assert_eq!(Command::parse("run"), Some(Command::Flee));
        assert_eq!(Command::parse("inv"), Some(Command::Inventory));
        assert_eq!(Command::parse("xyzzy"), None);
    }

    #[tokio::test]
    async fn test_unknown_command_hints_at_help() {
        let (mut player, mut session, mut rng, narrator) = fixture();
        let response = act(&mut player, &mut session, &mut rng, &narrator, "dance", None).await;
        assert_eq!(response.kind, ResponseKind::Invalid);
        assert!(response.message.contains("help"));
        assert!(!response.persist);
    }

    #[tokio::test]
    async fn test_look_reports_room_without_mutation() {
        let (mut player, mut session, mut rng, narrator) = fixture();
        let before = session.dungeon.clone();
        let response = act(&mut player, &mut session, &mut rng, &narrator, "look", None).await;
        assert_eq!(response.kind, ResponseKind::Ok);
        assert!(!response.persist);
        assert!(response.message.contains("Exits:"));
        assert_eq!(session.dungeon, before);
    }

    #[tokio::test]
    async fn test_movement_follows_connections() {
        let (mut player, mut session, mut rng, narrator) = fixture();
        let entrance = current_room(&player, &session).clone();
        let (direction, destination) = entrance
            .connections
            .iter()
            .map(|(d, t)| (*d, *t))
            .next()
            .unwrap();

        let response = act(
            &mut player,
            &mut session,
            &mut rng,
            &narrator,
            direction.name(),
            None,
        )
        .await;

        assert_eq!(response.kind, ResponseKind::Ok);
        assert!(response.persist);
        assert_eq!(player.location, destination);
        assert!(session.dungeon.room(destination).unwrap().visited);
    }

    #[tokio::test]
    async fn test_movement_into_wall_is_refused() {
        let (mut player, mut session, mut rng, narrator) = fixture();
        // Find a direction with no connection from the entrance.
        let open: Vec<Direction> = current_room(&player, &session)
            .connections
            .keys()
            .copied()
            .collect();
        let closed = Direction::all()
            .into_iter()
            .find(|d| !open.contains(d))
            .expect("entrance never has all four exits");

        let before_location = player.location;
        let response = act(
            &mut player,
            &mut session,
            &mut rng,
            &narrator,
            closed.name(),
            None,
        )
        .await;

        assert_eq!(response.kind, ResponseKind::Invalid);
        assert!(response.message.contains("cannot go"));
        assert!(!response.persist);
        assert_eq!(player.location, before_location);
    }

    #[tokio::test]
    async fn test_first_visit_uses_enhanced_description() {
        let (mut player, mut session, mut rng, _) = fixture();
        let narrator = Narrator::scripted(vec!["Enhanced prose.".to_string()]);
        let entrance = current_room(&player, &session).clone();
        // Pick a destination that is neither entrance nor exit.
        let (direction, destination) = entrance
            .connections
            .iter()
            .map(|(d, t)| (*d, *t))
            .find(|(_, t)| {
                let room = session.dungeon.room(*t).unwrap();
                !room.is_entrance && !room.is_exit
            })
            .expect("entrance connects to an ordinary room");

        act(&mut player, &mut session, &mut rng, &narrator, direction.name(), None).await;
        assert_eq!(
            session.dungeon.room(destination).unwrap().description,
            "Enhanced prose."
        );

        // Moving back and forth does not re-enhance.
        act(&mut player, &mut session, &mut rng, &narrator, direction.opposite().name(), None).await;
        act(&mut player, &mut session, &mut rng, &narrator, direction.name(), None).await;
        assert_eq!(
            session.dungeon.room(destination).unwrap().description,
            "Enhanced prose."
        );
    }

    #[tokio::test]
    async fn test_fight_without_enemy() {
        let (mut player, mut session, mut rng, narrator) = fixture();
        let before = player.clone();
        let response = act(&mut player, &mut session, &mut rng, &narrator, "fight", None).await;
        assert_eq!(response.kind, ResponseKind::NotFound);
        assert_eq!(response.message, "There is nothing to fight here.");
        assert!(!response.persist);
        assert_eq!(player, before);
    }

    #[tokio::test]
    async fn test_flee_without_enemy() {
        let (mut player, mut session, mut rng, narrator) = fixture();
        let response = act(&mut player, &mut session, &mut rng, &narrator, "flee", None).await;
        assert_eq!(response.kind, ResponseKind::NotFound);
        assert_eq!(response.message, "There is nothing to flee from.");
    }

    #[tokio::test]
    async fn test_blocked_actions_leave_state_unchanged() {
        let (mut player, mut session, mut rng, narrator) = fixture();
        place_enemy(&mut session, player.location);
        let player_before = player.clone();
        let dungeon_before = session.dungeon.clone();

        for (input, target) in [
            ("north", None),
            ("south", None),
            ("east", None),
            ("west", None),
            ("take", Some("healing_herb")),
            ("use", Some("healing_herb")),
            ("talk", None),
            ("descend", None),
        ] {
            let response =
                act(&mut player, &mut session, &mut rng, &narrator, input, target).await;
            assert_eq!(
                response.kind,
                ResponseKind::Blocked,
                "'{input}' was not blocked by the live enemy"
            );
            assert!(!response.persist);
            assert_eq!(player, player_before, "'{input}' mutated the player");
            assert_eq!(session.dungeon, dungeon_before, "'{input}' mutated the dungeon");
        }
    }

    #[tokio::test]
    async fn test_look_and_reports_allowed_during_combat() {
        let (mut player, mut session, mut rng, narrator) = fixture();
        place_enemy(&mut session, player.location);

        for input in ["look", "status", "inventory", "map", "help"] {
            let response = act(&mut player, &mut session, &mut rng, &narrator, input, None).await;
            assert_eq!(response.kind, ResponseKind::Ok, "'{input}' should be allowed");
            assert!(!response.persist);
        }
    }

    #[tokio::test]
    async fn test_fight_kills_in_two_clean_hits() {
        let (mut player, mut session, _, narrator) = fixture();
        place_enemy(&mut session, player.location);

        // Seed 1's first draw lands mid-interval: jitter 0, damage 10.
        let mut rng = GameRng::new(1);
        let first = act(&mut player, &mut session, &mut rng, &narrator, "fight", None).await;
        assert!(first.persist);
        assert!(current_room(&player, &session).has_live_enemy());

        let mut rng = GameRng::new(1);
        let second = act(&mut player, &mut session, &mut rng, &narrator, "fight", None).await;
        assert!(second.persist);
        assert!(!current_room(&player, &session).has_live_enemy());
        assert_eq!(player.experience, 25);
        assert_eq!(player.kills, 1);
    }

    #[tokio::test]
    async fn test_take_moves_item_to_inventory() {
        let (mut player, mut session, mut rng, narrator) = fixture();
        let response = act(
            &mut player,
            &mut session,
            &mut rng,
            &narrator,
            "take",
            Some("Healing Herb"),
        )
        .await;

        assert_eq!(response.kind, ResponseKind::Ok);
        assert!(response.persist);
        assert!(player.inventory.contains(&"healing_herb".to_string()));
        assert!(!current_room(&player, &session)
            .items
            .contains(&"healing_herb".to_string()));
    }

    #[tokio::test]
    async fn test_take_missing_item() {
        let (mut player, mut session, mut rng, narrator) = fixture();
        let response = act(
            &mut player,
            &mut session,
            &mut rng,
            &narrator,
            "take",
            Some("flame_blade"),
        )
        .await;
        assert_eq!(response.kind, ResponseKind::NotFound);
        assert_eq!(response.message, "There is no such item here.");
        assert!(player.inventory.is_empty());
    }

    #[tokio::test]
    async fn test_use_heals_and_consumes() {
        let (mut player, mut session, mut rng, narrator) = fixture();
        player.inventory.push("healing_herb".to_string());
        player.health = 50;

        let response = act(
            &mut player,
            &mut session,
            &mut rng,
            &narrator,
            "use",
            Some("healing_herb"),
        )
        .await;

        assert_eq!(response.kind, ResponseKind::Ok);
        assert!(response.persist);
        assert_eq!(player.health, 65);
        assert!(player.inventory.is_empty());
    }

    #[tokio::test]
    async fn test_use_heal_clamps_at_max() {
        let (mut player, mut session, mut rng, narrator) = fixture();
        player.inventory.push("health_potion".to_string());
        player.health = 95;

        act(&mut player, &mut session, &mut rng, &narrator, "use", Some("health_potion")).await;
        assert_eq!(player.health, 100);
    }

    #[tokio::test]
    async fn test_use_restore_to_item() {
        let (mut player, mut session, mut rng, narrator) = fixture();
        player.inventory.push("stoneskin_draught".to_string());
        player.health = 10;

        act(&mut player, &mut session, &mut rng, &narrator, "use", Some("stoneskin_draught")).await;
        // Restores health *to* the draught's power value.
        assert_eq!(player.health, 50);
        assert!(player.inventory.is_empty());

        // Above the threshold it is consumed with no effect.
        player.inventory.push("stoneskin_draught".to_string());
        player.health = 80;
        act(&mut player, &mut session, &mut rng, &narrator, "use", Some("stoneskin_draught")).await;
        assert_eq!(player.health, 80);
        assert!(player.inventory.is_empty());
    }

    #[tokio::test]
    async fn test_use_experience_tome() {
        let (mut player, mut session, mut rng, narrator) = fixture();
        player.inventory.push("ancient_tome".to_string());
        player.experience = 60;

        let response = act(
            &mut player,
            &mut session,
            &mut rng,
            &narrator,
            "use",
            Some("ancient_tome"),
        )
        .await;

        assert_eq!(player.experience, 110);
        assert_eq!(player.level, 2);
        assert_eq!(player.max_health, 110);
        assert_eq!(player.attack, 12);
        assert!(response.message.contains("level 2"));
    }

    #[tokio::test]
    async fn test_use_non_consumable_refused() {
        let (mut player, mut session, mut rng, narrator) = fixture();
        player.inventory.push("rusty_sword".to_string());

        let response = act(
            &mut player,
            &mut session,
            &mut rng,
            &narrator,
            "use",
            Some("rusty_sword"),
        )
        .await;

        assert_eq!(response.kind, ResponseKind::Invalid);
        // Not consumed.
        assert_eq!(player.inventory.len(), 1);
    }

    #[tokio::test]
    async fn test_use_absent_item() {
        let (mut player, mut session, mut rng, narrator) = fixture();
        let response = act(
            &mut player,
            &mut session,
            &mut rng,
            &narrator,
            "use",
            Some("health_potion"),
        )
        .await;
        assert_eq!(response.kind, ResponseKind::NotFound);
    }

    #[tokio::test]
    async fn test_talk_without_npc() {
        let (mut player, mut session, mut rng, narrator) = fixture();
        session.dungeon.room_mut(player.location).unwrap().npc = None;
        let response = act(&mut player, &mut session, &mut rng, &narrator, "talk", None).await;
        assert_eq!(response.kind, ResponseKind::NotFound);
        assert_eq!(response.message, "There is no one here to talk to.");
    }

    #[tokio::test]
    async fn test_talk_decrements_and_runs_dry() {
        let (mut player, mut session, mut rng, narrator) = fixture();
        session.dungeon.room_mut(player.location).unwrap().npc = Some(crate::world::Npc {
            name: "Old Hermit".to_string(),
            personality: "wary".to_string(),
            talks_remaining: 2,
        });

        for _ in 0..2 {
            let response =
                act(&mut player, &mut session, &mut rng, &narrator, "talk", Some("hello")).await;
            assert_eq!(response.kind, ResponseKind::Ok);
            assert!(response.persist);
            assert!(response.message.contains("Old Hermit says:"));
        }

        let dry = act(&mut player, &mut session, &mut rng, &narrator, "talk", None).await;
        assert_eq!(dry.kind, ResponseKind::NotFound);
        assert!(dry.message.contains("nothing more to say"));
        assert!(!dry.persist);
    }

    #[tokio::test]
    async fn test_talk_uses_scripted_dialogue() {
        let (mut player, mut session, mut rng, _) = fixture();
        let narrator = Narrator::scripted(vec!["Beware the third floor.".to_string()]);
        session.dungeon.room_mut(player.location).unwrap().npc = Some(crate::world::Npc {
            name: "Lost Miner".to_string(),
            personality: "jumpy".to_string(),
            talks_remaining: 3,
        });

        let response =
            act(&mut player, &mut session, &mut rng, &narrator, "talk", Some("hello")).await;
        assert!(response.message.contains("Beware the third floor."));
    }

    #[tokio::test]
    async fn test_descend_requires_exit_room() {
        let (mut player, mut session, mut rng, narrator) = fixture();
        // The entrance is not the exit in an 8+ room dungeon.
        let response = act(&mut player, &mut session, &mut rng, &narrator, "descend", None).await;
        assert_eq!(response.kind, ResponseKind::Invalid);
        assert!(!response.persist);
    }

    #[tokio::test]
    async fn test_descend_regenerates_next_floor() {
        let (mut player, mut session, mut rng, narrator) = fixture();
        let seed = session.dungeon.seed;
        player.location = session.dungeon.exit().id;
        session.dungeon.room_mut(player.location).unwrap().enemy = None;

        let response = act(&mut player, &mut session, &mut rng, &narrator, "descend", None).await;

        assert_eq!(response.kind, ResponseKind::Ok);
        assert!(response.persist);
        assert_eq!(session.floor, 2);
        assert_eq!(session.dungeon.floor, 2);
        assert_eq!(player.location, session.dungeon.entrance().id);
        // Same base seed drives every floor of the run.
        assert_eq!(session.dungeon, dungeon::generate(seed, 2));
    }

    #[tokio::test]
    async fn test_descend_on_final_floor_is_victory() {
        let (mut player, mut session, mut rng, narrator) = fixture();
        let seed = session.dungeon.seed;
        session.floor = MAX_FLOOR;
        session.dungeon = generate(seed, MAX_FLOOR);
        player.location = session.dungeon.exit().id;
        session.dungeon.room_mut(player.location).unwrap().enemy = None;

        let response = act(&mut player, &mut session, &mut rng, &narrator, "descend", None).await;

        assert_eq!(response.kind, ResponseKind::Victory);
        assert!(response.persist);
        assert!(!session.active);
        // No further floor was generated.
        assert_eq!(session.floor, MAX_FLOOR);
    }

    #[tokio::test]
    async fn test_map_masks_unvisited_rooms() {
        let (mut player, mut session, mut rng, narrator) = fixture();
        let response = act(&mut player, &mut session, &mut rng, &narrator, "map", None).await;

        // Only the entrance is visited at the start.
        let unknown_count = response.message.matches("unknown").count();
        assert_eq!(unknown_count, session.dungeon.rooms.len() - 1);
        // The player's room is marked.
        assert!(response.message.lines().any(|l| l.starts_with('@')));
        // Visited rooms reveal their exits; masked rooms do not.
        let entrance_line = response
            .message
            .lines()
            .find(|l| l.starts_with('@'))
            .unwrap();
        assert!(entrance_line.contains("exits:"));
    }

    #[tokio::test]
    async fn test_status_and_inventory_render() {
        let (mut player, mut session, mut rng, narrator) = fixture();
        player.inventory.push("iron_sword".to_string());

        let status = act(&mut player, &mut session, &mut rng, &narrator, "status", None).await;
        assert!(status.message.contains("alice"));
        assert!(status.message.contains("+6 weapon"));

        let inventory =
            act(&mut player, &mut session, &mut rng, &narrator, "inventory", None).await;
        assert!(inventory.message.contains("Iron Sword"));
    }
}
