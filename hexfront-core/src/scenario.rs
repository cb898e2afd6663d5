//! Scenario configuration: unit catalog, board layout, and starting placements
//!
//! Scenarios are plain JSON files. `Scenario::default()` is the demo skirmish.

use crate::attributes::keys;
use crate::hex::Hex;
use crate::interaction::Effect;
use crate::piece::Faction;
use crate::search::CellSearchRules;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const PLAYER_FACTION: &str = "player";
pub const ENEMY_FACTION: &str = "enemy";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovementConfig {
    pub min_range: i32,
    pub max_range: i32,
    #[serde(default = "default_movement_rules")]
    pub rules: CellSearchRules,
}

fn default_movement_rules() -> CellSearchRules {
    CellSearchRules::MOVEMENT
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbilityConfig {
    Ranged {
        name: String,
        min_range: i32,
        max_range: i32,
        #[serde(default)]
        can_target_own_team: bool,
        effect: Effect,
    },
    FindCover {
        evasion_bonus: f32,
    },
}

impl AbilityConfig {
    /// Range 1..=2, enemies only, 5 damage
    pub fn ranged_gun() -> Self {
        AbilityConfig::Ranged {
            name: "Gun".to_string(),
            min_range: 1,
            max_range: 2,
            can_target_own_team: false,
            effect: Effect::damage(5.0),
        }
    }
}

/// Everything needed to build a piece of one unit type
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitProfile {
    pub name: String,
    pub max_health: f32,
    #[serde(default)]
    pub evasion: f32,
    #[serde(default)]
    pub movement: Option<MovementConfig>,
    #[serde(default)]
    pub abilities: Vec<AbilityConfig>,
}

impl UnitProfile {
    /// The standard infantry unit
    pub fn trooper() -> Self {
        Self {
            name: "trooper".to_string(),
            max_health: 10.0,
            evasion: 0.0,
            movement: Some(MovementConfig {
                min_range: 0,
                max_range: 3,
                rules: CellSearchRules::MOVEMENT,
            }),
            abilities: vec![
                AbilityConfig::ranged_gun(),
                AbilityConfig::FindCover { evasion_bonus: 25.0 },
            ],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardLayout {
    /// Every cell of a `columns` x `rows` rectangle starting at (0, 0)
    Rect { columns: i32, rows: i32 },
    /// An explicit list of usable cells
    Cells(Vec<Hex>),
}

impl BoardLayout {
    pub fn positions(&self) -> Vec<Hex> {
        match self {
            BoardLayout::Rect { columns, rows } => (0..*columns)
                .flat_map(|x| (0..*rows).map(move |y| Hex::new(x, y)))
                .collect(),
            BoardLayout::Cells(cells) => cells.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub unit: String,
    pub faction: Faction,
    pub position: Hex,
}

impl Placement {
    pub fn new(unit: impl Into<String>, faction: impl Into<Faction>, position: Hex) -> Self {
        Self {
            unit: unit.into(),
            faction: faction.into(),
            position,
        }
    }
}

fn default_health_key() -> String {
    keys::HEALTH.to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    /// Faction whose pieces can be selected
    pub controlling_faction: Faction,
    /// Attribute whose minimum removes a piece
    #[serde(default = "default_health_key")]
    pub health_key: String,
    /// Unit placed when an empty cell is touched, if any
    #[serde(default)]
    pub spawn_unit: Option<String>,
    pub layout: BoardLayout,
    pub units: Vec<UnitProfile>,
    #[serde(default)]
    pub placements: Vec<Placement>,
}

impl Scenario {
    /// Load from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let scenario: Scenario = serde_json::from_str(&content)?;

        for placement in &scenario.placements {
            if scenario.unit(&placement.unit).is_none() {
                anyhow::bail!("Unknown unit in placement: {}", placement.unit);
            }
        }
        Ok(scenario)
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn unit(&self, name: &str) -> Option<&UnitProfile> {
        self.units.iter().find(|unit| unit.name == name)
    }

    /// Two sides of troopers at opposite ends of a 22x8 board
    pub fn random_skirmish<R: Rng>(rng: &mut R, name: &str, pieces_per_side: usize) -> Self {
        const COLUMNS: i32 = 22;
        const ROWS: i32 = 8;
        const DEPLOY_DEPTH: i32 = 3;

        let zone = |columns: std::ops::Range<i32>| -> Vec<Hex> {
            columns.flat_map(|x| (0..ROWS).map(move |y| Hex::new(x, y))).collect()
        };
        let player_zone = zone(0..DEPLOY_DEPTH);
        let enemy_zone = zone(COLUMNS - DEPLOY_DEPTH..COLUMNS);

        let unit = UnitProfile::trooper();
        let mut placements = Vec::with_capacity(pieces_per_side * 2);
        for (faction, deploy) in [(PLAYER_FACTION, &player_zone), (ENEMY_FACTION, &enemy_zone)] {
            for &position in deploy.choose_multiple(rng, pieces_per_side) {
                placements.push(Placement::new(unit.name.clone(), faction, position));
            }
        }

        Self {
            name: name.to_string(),
            controlling_faction: Faction::new(PLAYER_FACTION),
            health_key: default_health_key(),
            spawn_unit: Some(unit.name.clone()),
            layout: BoardLayout::Rect {
                columns: COLUMNS,
                rows: ROWS,
            },
            units: vec![unit],
            placements,
        }
    }
}

impl Default for Scenario {
    fn default() -> Self {
        let unit = UnitProfile::trooper();
        let placements = vec![
            Placement::new(unit.name.clone(), PLAYER_FACTION, Hex::new(1, 3)),
            Placement::new(unit.name.clone(), PLAYER_FACTION, Hex::new(19, 0)),
            Placement::new(unit.name.clone(), PLAYER_FACTION, Hex::new(20, 1)),
            Placement::new(unit.name.clone(), ENEMY_FACTION, Hex::new(1, 0)),
        ];

        Self {
            name: "demo".to_string(),
            controlling_faction: Faction::new(PLAYER_FACTION),
            health_key: default_health_key(),
            spawn_unit: Some(unit.name.clone()),
            layout: BoardLayout::Rect { columns: 22, rows: 8 },
            units: vec![unit],
            placements,
        }
    }
}
