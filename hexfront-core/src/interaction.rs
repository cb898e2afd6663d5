//! Piece interactions: movement, ranged abilities, and buffs
//!
//! Interactions validate against cached range results. The board refreshes
//! those caches whenever positions or occupancy change, and resolves the
//! effects that need more than one piece.

use crate::attributes::{keys, AttributeSet, ModifierOp};
use crate::error::GameResult;
use crate::events::EventBus;
use crate::hex::Hex;
use crate::piece::{Faction, Piece, PieceId};
use crate::search::{self, BoardView, CellSearchRules, RangeCells};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which interaction of a piece is meant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionId {
    Movement,
    /// Index into the piece's ability list
    Ability(usize),
}

impl fmt::Display for InteractionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InteractionId::Movement => write!(f, "movement"),
            InteractionId::Ability(index) => write!(f, "ability #{}", index),
        }
    }
}

/// Who acts and what was touched
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InteractionArgs {
    pub acting_piece: PieceId,
    pub acting_cell: Hex,
    pub target_piece: Option<PieceId>,
    pub target_cell: Hex,
}

/// How a range is presented to the player
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HighlightStyle {
    MovementRange,
    AttackRange,
}

/// An interaction with a distance band and a cached range result
pub trait HasRange {
    fn min_range(&self) -> i32;
    fn max_range(&self) -> i32;
    fn highlight_style(&self) -> HighlightStyle;
    fn rules(&self) -> CellSearchRules;

    fn range(&self) -> &RangeCells;
    fn range_mut(&mut self) -> &mut RangeCells;

    /// Every board cell in the band
    fn cells_in_range(&self) -> &[Hex] {
        &self.range().considered
    }

    /// Cells this interaction may currently target
    fn valid_cells_in_range(&self) -> &[Hex] {
        &self.range().valid
    }

    /// Recompute the cached range from `origin`
    fn refresh(&mut self, view: &BoardView<'_>, origin: Hex, faction: &Faction) {
        let result = search::search(view, origin, faction, self.min_range(), self.max_range(), self.rules());
        *self.range_mut() = result;
    }

    fn clear_range(&mut self, origin: Hex) {
        *self.range_mut() = RangeCells::empty(origin);
    }
}

/// A change applied to one attribute of a target
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub attribute: String,
    pub op: ModifierOp,
    pub amount: f32,
}

impl Effect {
    pub fn new(attribute: impl Into<String>, op: ModifierOp, amount: f32) -> Self {
        Self {
            attribute: attribute.into(),
            op,
            amount,
        }
    }

    /// Subtract `amount` from health
    pub fn damage(amount: f32) -> Self {
        Self::new(keys::HEALTH, ModifierOp::Add, -amount)
    }

    /// Returns false when the target lacks the attribute
    pub fn apply(&self, target: &mut AttributeSet, bus: &EventBus) -> GameResult<bool> {
        target.modify(&self.attribute, self.op, self.amount, bus)
    }
}

// ============================================================================
// MOVEMENT
// ============================================================================

#[derive(Clone, Debug)]
pub struct Movement {
    pub min_range: i32,
    pub max_range: i32,
    pub rules: CellSearchRules,
    pub enabled: bool,
    cache: RangeCells,
}

impl Movement {
    pub fn new(min_range: i32, max_range: i32) -> Self {
        Self {
            min_range,
            max_range,
            rules: CellSearchRules::MOVEMENT,
            enabled: true,
            cache: RangeCells::default(),
        }
    }

    pub fn with_rules(mut self, rules: CellSearchRules) -> Self {
        self.rules = rules;
        self
    }

    /// Whether a piece standing on `from` may move to `target`
    pub fn can_move_to(&self, from: Hex, target: Hex) -> bool {
        if !self.enabled || self.max_range <= 0 {
            return false;
        }
        if target == from {
            return false;
        }
        self.cache.is_valid(target)
    }
}

impl HasRange for Movement {
    fn min_range(&self) -> i32 {
        self.min_range
    }

    fn max_range(&self) -> i32 {
        self.max_range
    }

    fn highlight_style(&self) -> HighlightStyle {
        HighlightStyle::MovementRange
    }

    fn rules(&self) -> CellSearchRules {
        self.rules
    }

    fn range(&self) -> &RangeCells {
        &self.cache
    }

    fn range_mut(&mut self) -> &mut RangeCells {
        &mut self.cache
    }
}

// ============================================================================
// RANGED ABILITY
// ============================================================================

#[derive(Clone, Debug)]
pub struct RangedAbility {
    pub name: String,
    pub min_range: i32,
    pub max_range: i32,
    pub can_target_own_team: bool,
    pub enabled: bool,
    pub effect: Effect,
    cache: RangeCells,
}

impl RangedAbility {
    pub fn new(name: impl Into<String>, min_range: i32, max_range: i32, effect: Effect) -> Self {
        Self {
            name: name.into(),
            min_range,
            max_range,
            can_target_own_team: false,
            enabled: true,
            effect,
            cache: RangeCells::default(),
        }
    }

    /// Range 1..=2, enemies only, 5 damage
    pub fn gun() -> Self {
        Self::new("Gun", 1, 2, Effect::damage(5.0))
    }

    pub fn with_own_team(mut self, allowed: bool) -> Self {
        self.can_target_own_team = allowed;
        self
    }

    /// Whether a piece of `actor_faction` may use this ability on `target`
    pub fn can_target(&self, actor_faction: &Faction, target: &Piece) -> bool {
        if !self.enabled || self.max_range <= 0 {
            return false;
        }
        if !self.can_target_own_team && target.faction == *actor_faction {
            return false;
        }
        match target.position {
            Some(position) => self.cache.is_valid(position),
            None => false,
        }
    }
}

impl HasRange for RangedAbility {
    fn min_range(&self) -> i32 {
        self.min_range
    }

    fn max_range(&self) -> i32 {
        self.max_range
    }

    fn highlight_style(&self) -> HighlightStyle {
        HighlightStyle::AttackRange
    }

    fn rules(&self) -> CellSearchRules {
        CellSearchRules::EXCLUDE_ORIGIN
    }

    fn range(&self) -> &RangeCells {
        &self.cache
    }

    fn range_mut(&mut self) -> &mut RangeCells {
        &mut self.cache
    }
}

// ============================================================================
// BUFFS
// ============================================================================

/// One-shot evasion bonus
#[derive(Clone, Debug, Default)]
pub struct FindCover {
    pub evasion_bonus: f32,
    active: bool,
}

impl FindCover {
    pub fn new(evasion_bonus: f32) -> Self {
        Self {
            evasion_bonus,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Raise evasion once. Later calls fail, as do calls on a piece without evasion.
    pub fn perform(&mut self, attributes: &mut AttributeSet, bus: &EventBus) -> GameResult<bool> {
        if self.active {
            return Ok(false);
        }
        if !attributes.add_current(keys::EVASION, self.evasion_bonus, bus)? {
            return Ok(false);
        }
        self.active = true;
        Ok(true)
    }
}

/// Abilities a piece can carry besides movement
#[derive(Clone, Debug)]
pub enum Ability {
    Ranged(RangedAbility),
    FindCover(FindCover),
}

impl Ability {
    pub fn name(&self) -> &str {
        match self {
            Ability::Ranged(ability) => ability.name.as_str(),
            Ability::FindCover(_) => "Find Cover",
        }
    }

    pub fn as_ranged(&self) -> Option<&RangedAbility> {
        match self {
            Ability::Ranged(ability) => Some(ability),
            Ability::FindCover(_) => None,
        }
    }

    pub fn as_range(&self) -> Option<&dyn HasRange> {
        match self {
            Ability::Ranged(ability) => Some(ability as &dyn HasRange),
            Ability::FindCover(_) => None,
        }
    }

    pub fn as_range_mut(&mut self) -> Option<&mut dyn HasRange> {
        match self {
            Ability::Ranged(ability) => Some(ability as &mut dyn HasRange),
            Ability::FindCover(_) => None,
        }
    }
}
