//! Static content catalog.
//!
//! Read-only reference tables: room description templates, enemy and NPC
//! templates, and the item drop table. Loaded once, shared by reference,
//! never mutated at runtime. The generator and combat resolver derive
//! per-room instances from these and mutate only the instances.

use crate::world::{ConsumableEffect, ItemType, Rarity};
use lazy_static::lazy_static;

/// A room description template. Each theme carries several variants so
/// repeated picks don't read identically.
pub struct RoomTemplate {
    pub name: &'static str,
    pub descriptions: &'static [&'static str],
}

/// Base stats for an enemy before floor scaling.
pub struct EnemyTemplate {
    pub name: &'static str,
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub xp: u64,
}

/// An NPC personality template with its canned dialogue fallback.
pub struct NpcTemplate {
    pub name: &'static str,
    pub personality: &'static str,
    pub fallback_line: &'static str,
}

/// An entry in the item drop table.
pub struct ItemDef {
    pub id: &'static str,
    pub name: &'static str,
    pub item_type: ItemType,
    pub power: i32,
    pub rarity: Rarity,
    pub base_drop_chance: f64,
    /// What happens on `use`; None for non-consumables.
    pub effect: Option<ConsumableEffect>,
}

/// Item id of the consumable every entrance room is stocked with.
pub const ENTRANCE_CONSUMABLE: &str = "healing_herb";

lazy_static! {
    /// Room description templates, grouped loosely by theme.
    pub static ref ROOM_TEMPLATES: Vec<RoomTemplate> = vec![
        RoomTemplate {
            name: "Collapsed Cavern",
            descriptions: &[
                "Rubble chokes half the chamber. Dust sifts down with every footstep.",
                "The ceiling has given way here, leaving a slope of shattered stone.",
                "Cracked pillars lean against each other beneath a sagging roof.",
            ],
        },
        RoomTemplate {
            name: "Fungal Grotto",
            descriptions: &[
                "Pale mushrooms glow faintly along the walls, dripping luminous spores.",
                "The floor is spongy with overlapping shelves of fungus.",
            ],
        },
        RoomTemplate {
            name: "Bone Crypt",
            descriptions: &[
                "Niches line the walls, each cradling a jumble of yellowed bones.",
                "Stone sarcophagi stand in rows, their lids pushed slightly askew.",
                "Skulls watch from alcoves cut into the living rock.",
            ],
        },
        RoomTemplate {
            name: "Flooded Passage",
            descriptions: &[
                "Black water pools ankle-deep, hiding whatever litters the floor.",
                "A slow current tugs at your boots. Something drips in the dark ahead.",
            ],
        },
        RoomTemplate {
            name: "Forgotten Armory",
            descriptions: &[
                "Rusted weapon racks line the walls, mostly picked clean long ago.",
                "Broken spear hafts and split shields lie heaped in a corner.",
            ],
        },
        RoomTemplate {
            name: "Mossy Library",
            descriptions: &[
                "Rotted shelves sag under books swollen with damp.",
                "Scraps of vellum crunch underfoot. The air smells of mold and old ink.",
            ],
        },
        RoomTemplate {
            name: "Broken Shrine",
            descriptions: &[
                "A defaced idol looms over a cracked altar stained with old offerings.",
                "Toppled votive candles litter the floor before an empty plinth.",
            ],
        },
        RoomTemplate {
            name: "Echoing Hall",
            descriptions: &[
                "Your footsteps return to you doubled from the vaulted dark above.",
                "Columns march into blackness in both directions.",
                "The hall is vast and cold; drafts moan between the pillars.",
            ],
        },
        RoomTemplate {
            name: "Guard Post",
            descriptions: &[
                "An overturned table and scattered dice mark an abandoned watch.",
                "Arrow slits pierce one wall. A brazier holds cold ashes.",
            ],
        },
        RoomTemplate {
            name: "Spider Warren",
            descriptions: &[
                "Webs thick as sailcloth drape every surface.",
                "Desiccated bundles hang from the ceiling, spinning slowly.",
            ],
        },
    ];

    /// Enemy templates. Base stats are scaled by floor at placement time.
    pub static ref ENEMIES: Vec<EnemyTemplate> = vec![
        EnemyTemplate { name: "Cave Bat", hp: 8, attack: 3, defense: 0, xp: 10 },
        EnemyTemplate { name: "Giant Rat", hp: 12, attack: 4, defense: 0, xp: 15 },
        EnemyTemplate { name: "Goblin", hp: 20, attack: 6, defense: 1, xp: 25 },
        EnemyTemplate { name: "Skeleton", hp: 26, attack: 7, defense: 2, xp: 35 },
        EnemyTemplate { name: "Orc Marauder", hp: 34, attack: 9, defense: 3, xp: 50 },
        EnemyTemplate { name: "Shadow Wraith", hp: 44, attack: 13, defense: 2, xp: 75 },
        EnemyTemplate { name: "Cave Troll", hp: 55, attack: 12, defense: 5, xp: 90 },
        EnemyTemplate { name: "Dungeon Lord", hp: 68, attack: 15, defense: 6, xp: 120 },
    ];

    /// NPC personality templates.
    pub static ref NPCS: Vec<NpcTemplate> = vec![
        NpcTemplate {
            name: "Old Hermit",
            personality: "wary recluse who speaks in half-finished riddles",
            fallback_line: "The hermit mutters something about the deeper floors and falls silent.",
        },
        NpcTemplate {
            name: "Lost Miner",
            personality: "jumpy survivor, desperately glad for company",
            fallback_line: "\"Don't take the dark tunnels,\" the miner whispers, eyes on the shadows.",
        },
        NpcTemplate {
            name: "Ghostly Monk",
            personality: "serene apparition, faded at the edges",
            fallback_line: "The monk's lips move in blessing, but no sound reaches you.",
        },
        NpcTemplate {
            name: "Mad Cartographer",
            personality: "obsessive mapmaker who trusts no one with his charts",
            fallback_line: "The cartographer shields a tattered map with one arm and waves you off.",
        },
    ];

    /// The item drop table.
    pub static ref ITEMS: Vec<ItemDef> = vec![
        ItemDef {
            id: "healing_herb",
            name: "Healing Herb",
            item_type: ItemType::Consumable,
            power: 15,
            rarity: Rarity::Common,
            base_drop_chance: 0.20,
            effect: Some(ConsumableEffect::Heal),
        },
        ItemDef {
            id: "health_potion",
            name: "Health Potion",
            item_type: ItemType::Consumable,
            power: 30,
            rarity: Rarity::Uncommon,
            base_drop_chance: 0.10,
            effect: Some(ConsumableEffect::Heal),
        },
        ItemDef {
            id: "stoneskin_draught",
            name: "Stoneskin Draught",
            item_type: ItemType::Consumable,
            power: 50,
            rarity: Rarity::Uncommon,
            base_drop_chance: 0.06,
            effect: Some(ConsumableEffect::RestoreTo),
        },
        ItemDef {
            id: "ancient_tome",
            name: "Ancient Tome",
            item_type: ItemType::Consumable,
            power: 50,
            rarity: Rarity::Rare,
            base_drop_chance: 0.03,
            effect: Some(ConsumableEffect::Experience),
        },
        ItemDef {
            id: "rusty_sword",
            name: "Rusty Sword",
            item_type: ItemType::Weapon,
            power: 3,
            rarity: Rarity::Common,
            base_drop_chance: 0.15,
            effect: None,
        },
        ItemDef {
            id: "iron_sword",
            name: "Iron Sword",
            item_type: ItemType::Weapon,
            power: 6,
            rarity: Rarity::Uncommon,
            base_drop_chance: 0.08,
            effect: None,
        },
        ItemDef {
            id: "flame_blade",
            name: "Flame Blade",
            item_type: ItemType::Weapon,
            power: 12,
            rarity: Rarity::Rare,
            base_drop_chance: 0.03,
            effect: None,
        },
        ItemDef {
            id: "skeleton_key",
            name: "Skeleton Key",
            item_type: ItemType::Key,
            power: 0,
            rarity: Rarity::Uncommon,
            base_drop_chance: 0.05,
            effect: None,
        },
        ItemDef {
            id: "silver_locket",
            name: "Silver Locket",
            item_type: ItemType::Treasure,
            power: 10,
            rarity: Rarity::Uncommon,
            base_drop_chance: 0.07,
            effect: None,
        },
        ItemDef {
            id: "gold_idol",
            name: "Gold Idol",
            item_type: ItemType::Treasure,
            power: 25,
            rarity: Rarity::Rare,
            base_drop_chance: 0.04,
            effect: None,
        },
    ];
}

/// Look up an item definition by id.
pub fn item(id: &str) -> Option<&'static ItemDef> {
    ITEMS.iter().find(|i| i.id == id)
}

/// Look up an item by id or display name, case-insensitively.
///
/// Players type either form; room and inventory lists store ids.
pub fn find_item(query: &str) -> Option<&'static ItemDef> {
    let q = query.trim().to_lowercase();
    ITEMS
        .iter()
        .find(|i| i.id == q || i.name.to_lowercase() == q)
}

/// Enemy templates whose base hp fits a room of the given difficulty.
pub fn eligible_enemies(difficulty: u8) -> Vec<&'static EnemyTemplate> {
    let threshold = 20 + 10 * difficulty as i32;
    ENEMIES.iter().filter(|e| e.hp <= threshold).collect()
}

/// Best weapon bonus among the given inventory item ids. Zero if unarmed.
pub fn best_weapon_power(inventory: &[String]) -> i32 {
    inventory
        .iter()
        .filter_map(|id| item(id))
        .filter(|def| def.item_type == ItemType::Weapon)
        .map(|def| def.power)
        .max()
        .unwrap_or(0)
}
