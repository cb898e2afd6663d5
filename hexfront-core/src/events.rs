//! Game events and the synchronous event bus
//!
//! The bus is the only coupling between the board, its pieces, and whatever
//! presents them. It is an explicit value passed to whoever needs it; cloning
//! an [`EventBus`] yields another handle to the same registry.

use crate::board::Cell;
use crate::error::GameResult;
use crate::hex::Hex;
use crate::interaction::{Effect, InteractionId};
use crate::nav::NavGraph;
use crate::piece::{Faction, PieceId};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// Event kinds, used as subscription keys
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    PositionChanged,
    PiecePlaced,
    PieceDisposing,
    AttributeMinChanged,
    AttributeMaxChanged,
    AttributeCurrentChanged,
    AttributeCurrentAtMin,
    BoardPieceActivated,
    BoardPieceDeactivated,
    InteractionButtonClicked,
    SpawnRequested,
    AttackAttempted,
    NavGraphChanged,
    GroundCellsChanged,
    BoardDisposing,
}

impl EventKind {
    pub const ALL: [EventKind; 15] = [
        EventKind::PositionChanged,
        EventKind::PiecePlaced,
        EventKind::PieceDisposing,
        EventKind::AttributeMinChanged,
        EventKind::AttributeMaxChanged,
        EventKind::AttributeCurrentChanged,
        EventKind::AttributeCurrentAtMin,
        EventKind::BoardPieceActivated,
        EventKind::BoardPieceDeactivated,
        EventKind::InteractionButtonClicked,
        EventKind::SpawnRequested,
        EventKind::AttackAttempted,
        EventKind::NavGraphChanged,
        EventKind::GroundCellsChanged,
        EventKind::BoardDisposing,
    ];
}

/// Everything that can travel over the bus
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// A piece moved between cells
    PositionChanged { piece: PieceId, from: Hex, to: Hex },
    /// A piece was created on a cell
    PiecePlaced { piece: PieceId, position: Hex },
    /// A piece is about to be removed from the board
    PieceDisposing { piece: PieceId },

    AttributeMinChanged { owner: PieceId, key: String, previous: f32, new: f32 },
    AttributeMaxChanged { owner: PieceId, key: String, previous: f32, new: f32 },
    AttributeCurrentChanged { owner: PieceId, key: String, previous: f32, new: f32 },
    AttributeCurrentAtMin { owner: PieceId, key: String, previous: f32, new: f32 },

    BoardPieceActivated { piece: PieceId },
    BoardPieceDeactivated { piece: PieceId },

    /// Published by the action bar when the player picks an interaction
    InteractionButtonClicked { piece: PieceId, interaction: InteractionId },
    /// Published by dev tooling to place a unit from the board's catalog
    SpawnRequested { unit: String, faction: Faction, position: Hex },

    /// A ranged ability passed its checks and is about to apply its effect
    AttackAttempted { attacker: PieceId, target: PieceId, effect: Effect },

    NavGraphChanged { graph: Rc<NavGraph> },
    GroundCellsChanged { cells: Vec<Cell> },
    BoardDisposing,
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::PositionChanged { .. } => EventKind::PositionChanged,
            GameEvent::PiecePlaced { .. } => EventKind::PiecePlaced,
            GameEvent::PieceDisposing { .. } => EventKind::PieceDisposing,
            GameEvent::AttributeMinChanged { .. } => EventKind::AttributeMinChanged,
            GameEvent::AttributeMaxChanged { .. } => EventKind::AttributeMaxChanged,
            GameEvent::AttributeCurrentChanged { .. } => EventKind::AttributeCurrentChanged,
            GameEvent::AttributeCurrentAtMin { .. } => EventKind::AttributeCurrentAtMin,
            GameEvent::BoardPieceActivated { .. } => EventKind::BoardPieceActivated,
            GameEvent::BoardPieceDeactivated { .. } => EventKind::BoardPieceDeactivated,
            GameEvent::InteractionButtonClicked { .. } => EventKind::InteractionButtonClicked,
            GameEvent::SpawnRequested { .. } => EventKind::SpawnRequested,
            GameEvent::AttackAttempted { .. } => EventKind::AttackAttempted,
            GameEvent::NavGraphChanged { .. } => EventKind::NavGraphChanged,
            GameEvent::GroundCellsChanged { .. } => EventKind::GroundCellsChanged,
            GameEvent::BoardDisposing => EventKind::BoardDisposing,
        }
    }
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Rc<RefCell<dyn FnMut(&GameEvent) -> GameResult<()>>>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: FxHashMap<EventKind, Vec<(SubscriptionId, Handler)>>,
}

/// Synchronous publish/subscribe registry keyed by [`EventKind`].
///
/// Delivery happens inside [`publish`](EventBus::publish), in subscription order.
/// The subscriber list is snapshotted before delivery starts, so subscribing or
/// unsubscribing from inside a handler only affects later publishes. A handler
/// error stops delivery and is returned to the publisher.
///
/// A handler that causes an event to be delivered back to itself panics: that
/// is a wiring defect, not a game state.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Rc<RefCell<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for one event kind
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&GameEvent) -> GameResult<()> + 'static,
    {
        self.subscribe_multiple(&[kind], handler)
    }

    /// Register one handler for several event kinds under a single id
    pub fn subscribe_multiple<F>(&self, kinds: &[EventKind], handler: F) -> SubscriptionId
    where
        F: FnMut(&GameEvent) -> GameResult<()> + 'static,
    {
        let handler: Handler = Rc::new(RefCell::new(handler));
        let mut registry = self.registry.borrow_mut();

        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;

        for &kind in kinds {
            registry
                .handlers
                .entry(kind)
                .or_default()
                .push((id, Rc::clone(&handler)));
        }
        id
    }

    /// Remove a subscription for one kind. Returns whether anything was removed.
    pub fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) -> bool {
        let mut registry = self.registry.borrow_mut();
        let Some(handlers) = registry.handlers.get_mut(&kind) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        handlers.len() != before
    }

    /// Remove a subscription from every kind it was registered for
    pub fn unsubscribe_all(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry.borrow_mut();
        let mut removed = false;
        for handlers in registry.handlers.values_mut() {
            let before = handlers.len();
            handlers.retain(|(existing, _)| *existing != id);
            removed |= handlers.len() != before;
        }
        removed
    }

    /// Deliver `event` to every handler currently subscribed to its kind
    pub fn publish(&self, event: &GameEvent) -> GameResult<()> {
        let kind = event.kind();

        let snapshot: Vec<Handler> = {
            let registry = self.registry.borrow();
            match registry.handlers.get(&kind) {
                Some(handlers) if !handlers.is_empty() => {
                    handlers.iter().map(|(_, handler)| Rc::clone(handler)).collect()
                }
                _ => {
                    tracing::trace!("No subscribers for {:?}", kind);
                    return Ok(());
                }
            }
        };

        for handler in snapshot {
            (&mut *handler.borrow_mut())(event)?;
        }
        Ok(())
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.registry
            .borrow()
            .handlers
            .get(&kind)
            .map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        let total: usize = registry.handlers.values().map(Vec::len).sum();
        f.debug_struct("EventBus").field("subscriptions", &total).finish()
    }
}

/// FIFO inbox fed by a bus subscription
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    events: Rc<RefCell<VecDeque<GameEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe this queue to `kinds` on `bus`
    pub fn attach(&self, bus: &EventBus, kinds: &[EventKind]) -> SubscriptionId {
        let events = Rc::clone(&self.events);
        bus.subscribe_multiple(kinds, move |event| {
            events.borrow_mut().push_back(event.clone());
            Ok(())
        })
    }

    pub fn pop(&self) -> Option<GameEvent> {
        self.events.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    pub fn drain(&self) -> Vec<GameEvent> {
        self.events.borrow_mut().drain(..).collect()
    }
}
