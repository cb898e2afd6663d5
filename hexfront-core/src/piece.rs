//! Board pieces
//!
//! A piece is composed explicitly: an optional [`Movement`], an ordered list of
//! [`Ability`]s, and an [`AttributeSet`]. The board owns every piece and is the
//! only thing that mutates positions outside of a move.

use crate::attributes::{keys, AttributeSet, ObjectAttribute};
use crate::error::GameResult;
use crate::events::{EventBus, GameEvent};
use crate::hex::Hex;
use crate::interaction::{Ability, FindCover, HasRange, InteractionId, Movement, RangedAbility};
use crate::scenario::{AbilityConfig, UnitProfile};
use crate::search::BoardView;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PIECE_ID: AtomicU64 = AtomicU64::new(1);

/// Globally unique piece identity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PieceId(u64);

impl PieceId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        PieceId(NEXT_PIECE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn from_raw(raw: u64) -> Self {
        PieceId(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "piece#{}", self.0)
    }
}

/// Team tag. Pieces of equal factions are friendly.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Faction(String);

impl Faction {
    pub fn new(name: impl Into<String>) -> Self {
        Faction(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Faction {
    fn from(name: &str) -> Self {
        Faction::new(name)
    }
}

#[derive(Clone, Debug)]
pub struct Piece {
    pub id: PieceId,
    pub faction: Faction,
    /// Name of the unit profile this piece was built from
    pub unit: String,
    pub position: Option<Hex>,
    pub attributes: AttributeSet,
    pub movement: Option<Movement>,
    pub abilities: Vec<Ability>,
}

impl Piece {
    pub fn new(faction: Faction, unit: impl Into<String>) -> Self {
        let id = PieceId::next();
        Self {
            id,
            faction,
            unit: unit.into(),
            position: None,
            attributes: AttributeSet::new(id),
            movement: None,
            abilities: Vec::new(),
        }
    }

    /// Build a piece from a unit profile
    pub fn from_profile(profile: &UnitProfile, faction: Faction) -> Self {
        let mut piece = Piece::new(faction, profile.name.clone())
            .with_attribute(ObjectAttribute::health(profile.max_health))
            .with_attribute(ObjectAttribute::evasion(profile.evasion));

        if let Some(config) = &profile.movement {
            piece.movement = Some(Movement::new(config.min_range, config.max_range).with_rules(config.rules));
        }

        for ability in &profile.abilities {
            piece.abilities.push(match ability {
                AbilityConfig::Ranged {
                    name,
                    min_range,
                    max_range,
                    can_target_own_team,
                    effect,
                } => Ability::Ranged(
                    RangedAbility::new(name.clone(), *min_range, *max_range, effect.clone())
                        .with_own_team(*can_target_own_team),
                ),
                AbilityConfig::FindCover { evasion_bonus } => Ability::FindCover(FindCover::new(*evasion_bonus)),
            });
        }
        piece
    }

    pub fn with_attribute(mut self, attribute: ObjectAttribute) -> Self {
        self.attributes.insert(attribute);
        self
    }

    pub fn with_movement(mut self, movement: Movement) -> Self {
        self.movement = Some(movement);
        self
    }

    pub fn with_ability(mut self, ability: Ability) -> Self {
        self.abilities.push(ability);
        self
    }

    pub fn health(&self) -> Option<f32> {
        self.attributes.current(keys::HEALTH)
    }

    /// Interactions in presentation order: movement first, then abilities
    pub fn interactions(&self) -> Vec<InteractionId> {
        let movement = self.movement.as_ref().map(|_| InteractionId::Movement);
        movement
            .into_iter()
            .chain((0..self.abilities.len()).map(InteractionId::Ability))
            .collect()
    }

    pub fn has_interaction(&self, interaction: InteractionId) -> bool {
        match interaction {
            InteractionId::Movement => self.movement.is_some(),
            InteractionId::Ability(index) => index < self.abilities.len(),
        }
    }

    pub fn interaction_name(&self, interaction: InteractionId) -> Option<&str> {
        match interaction {
            InteractionId::Movement => self.movement.as_ref().map(|_| "Move"),
            InteractionId::Ability(index) => self.abilities.get(index).map(Ability::name),
        }
    }

    /// The range-capable interaction behind `interaction`, if it has one
    pub fn range_of(&self, interaction: InteractionId) -> Option<&dyn HasRange> {
        match interaction {
            InteractionId::Movement => self.movement.as_ref().map(|m| m as &dyn HasRange),
            InteractionId::Ability(index) => self.abilities.get(index).and_then(Ability::as_range),
        }
    }

    /// Place the piece without a move and seed its range caches
    pub fn force_position(&mut self, position: Hex, view: &BoardView<'_>) {
        self.position = Some(position);
        self.refresh_ranges(view);
    }

    /// Recompute every cached range from the current position
    pub fn refresh_ranges(&mut self, view: &BoardView<'_>) {
        let faction = &self.faction;
        let position = self.position;
        let refresh = |range: &mut dyn HasRange| match position {
            Some(origin) => range.refresh(view, origin, faction),
            None => range.clear_range(Hex::default()),
        };

        if let Some(movement) = self.movement.as_mut() {
            refresh(movement);
        }
        for ability in self.abilities.iter_mut() {
            if let Some(range) = ability.as_range_mut() {
                refresh(range);
            }
        }
    }

    /// Empty every cached range, anchored at the current position
    pub fn clear_ranges(&mut self) {
        let origin = self.position.unwrap_or_default();
        if let Some(movement) = self.movement.as_mut() {
            movement.clear_range(origin);
        }
        for ability in self.abilities.iter_mut() {
            if let Some(range) = ability.as_range_mut() {
                range.clear_range(origin);
            }
        }
    }

    /// Move to `target` if the cached movement range allows it.
    ///
    /// Publishes `PositionChanged` on success. Every cached range is emptied
    /// until [`Piece::refresh_ranges`] runs against the updated board, so no
    /// targeting decision is made from the old position.
    pub fn attempt_move(&mut self, target: Hex, bus: &EventBus) -> GameResult<bool> {
        let (Some(movement), Some(from)) = (&self.movement, self.position) else {
            return Ok(false);
        };
        if !movement.can_move_to(from, target) {
            return Ok(false);
        }

        self.position = Some(target);
        self.clear_ranges();
        tracing::debug!("{} moved {} -> {}", self.id, from, target);
        bus.publish(&GameEvent::PositionChanged {
            piece: self.id,
            from,
            to: target,
        })?;
        Ok(true)
    }
}
