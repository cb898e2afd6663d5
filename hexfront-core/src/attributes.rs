//! Named attributes attached to a piece
//!
//! An [`AttributeSet`] owns [`ObjectAttribute`]s by key and re-broadcasts every
//! change of their values on the bus, tagged with the owning piece and the key.

use crate::attribute::{ClampedAttribute, ValueEvent};
use crate::error::GameResult;
use crate::events::{EventBus, GameEvent};
use crate::piece::PieceId;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Well-known attribute keys
pub mod keys {
    pub const HEALTH: &str = "health";
    pub const EVASION: &str = "evasion";
}

/// How an amount is combined with an attribute's current value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierOp {
    Add,
    Multiply,
    Set,
}

impl ModifierOp {
    pub fn apply(self, value: &mut ClampedAttribute, amount: f32) -> Vec<ValueEvent> {
        match self {
            ModifierOp::Add => value.add_current(amount),
            ModifierOp::Multiply => value.multiply_current(amount),
            ModifierOp::Set => value.set_current(amount),
        }
    }
}

/// A bounded value with a key, a display name, and an owner
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObjectAttribute {
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(skip)]
    pub owner: Option<PieceId>,
    pub value: ClampedAttribute,
}

impl ObjectAttribute {
    pub fn new(key: impl Into<String>, name: impl Into<String>, value: ClampedAttribute) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: None,
            owner: None,
            value,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Health in `[0, max]`, starting full
    pub fn health(max: f32) -> Self {
        Self::new(keys::HEALTH, "Health", ClampedAttribute::new(0.0, max, max).with_events())
            .with_description("Pieces are removed from the board when this reaches zero")
    }

    /// Evasion in `[0, 100]`
    pub fn evasion(value: f32) -> Self {
        Self::new(keys::EVASION, "Evasion", ClampedAttribute::new(0.0, 100.0, value).with_events())
    }
}

/// Keyed attributes of a single piece
#[derive(Clone, Debug)]
pub struct AttributeSet {
    owner: PieceId,
    attributes: FxHashMap<String, ObjectAttribute>,
}

impl AttributeSet {
    pub fn new(owner: PieceId) -> Self {
        Self {
            owner,
            attributes: FxHashMap::default(),
        }
    }

    pub fn owner(&self) -> PieceId {
        self.owner
    }

    /// Change the owner id and re-parent every attribute onto it
    pub fn set_owner(&mut self, owner: PieceId) {
        self.owner = owner;
        for attribute in self.attributes.values_mut() {
            attribute.owner = Some(owner);
        }
    }

    /// Insert or replace the attribute stored under its key
    pub fn insert(&mut self, mut attribute: ObjectAttribute) -> Option<ObjectAttribute> {
        attribute.owner = Some(self.owner);
        self.attributes.insert(attribute.key.clone(), attribute)
    }

    pub fn remove(&mut self, key: &str) -> Option<ObjectAttribute> {
        self.attributes.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&ObjectAttribute> {
        self.attributes.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Current value of `key`, if present
    pub fn current(&self, key: &str) -> Option<f32> {
        self.get(key).map(|attribute| attribute.value.current())
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    // ========================================================================
    // MUTATION
    // ========================================================================
    //
    // Every mutator returns Ok(false) when the key is absent.

    pub fn set_current(&mut self, key: &str, value: f32, bus: &EventBus) -> GameResult<bool> {
        self.mutate(key, bus, |v| v.set_current(value))
    }

    pub fn set_min(&mut self, key: &str, value: f32, bus: &EventBus) -> GameResult<bool> {
        self.mutate(key, bus, |v| v.set_min(value))
    }

    pub fn set_max(&mut self, key: &str, value: f32, bus: &EventBus) -> GameResult<bool> {
        self.mutate(key, bus, |v| v.set_max(value))
    }

    pub fn add_current(&mut self, key: &str, difference: f32, bus: &EventBus) -> GameResult<bool> {
        self.mutate(key, bus, |v| v.add_current(difference))
    }

    pub fn modify(&mut self, key: &str, op: ModifierOp, amount: f32, bus: &EventBus) -> GameResult<bool> {
        self.mutate(key, bus, |v| op.apply(v, amount))
    }

    fn mutate<F>(&mut self, key: &str, bus: &EventBus, change: F) -> GameResult<bool>
    where
        F: FnOnce(&mut ClampedAttribute) -> Vec<ValueEvent>,
    {
        let Some(attribute) = self.attributes.get_mut(key) else {
            return Ok(false);
        };

        let changes = change(&mut attribute.value);
        for change in changes {
            bus.publish(&tag(self.owner, key, change))?;
        }
        Ok(true)
    }
}

fn tag(owner: PieceId, key: &str, change: ValueEvent) -> GameEvent {
    let key = key.to_string();
    match change {
        ValueEvent::MinChanged { previous, new } => GameEvent::AttributeMinChanged { owner, key, previous, new },
        ValueEvent::MaxChanged { previous, new } => GameEvent::AttributeMaxChanged { owner, key, previous, new },
        ValueEvent::CurrentChanged { previous, new } => {
            GameEvent::AttributeCurrentChanged { owner, key, previous, new }
        }
        ValueEvent::CurrentAtMin { previous, new } => GameEvent::AttributeCurrentAtMin { owner, key, previous, new },
    }
}
