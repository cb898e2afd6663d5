//! HEXFRONT Core - Hex-grid tactical board simulation
//!
//! This crate provides the simulation core of HEXFRONT:
//! - Board geometry (odd-q offset hex grid, distance bands)
//! - Clamped attributes and per-piece attribute sets
//! - A synchronous event bus decoupling state changes from their consumers
//! - Rule-driven range search and the board nav graph
//! - Pieces with movement, ranged abilities, and buffs
//! - The board selection state machine and scenario configuration

pub mod hex;
pub mod attribute;
pub mod attributes;
pub mod events;
pub mod search;
pub mod nav;
pub mod interaction;
pub mod piece;
pub mod board;
pub mod scenario;
pub mod error;

// Re-exports for convenient access
pub use hex::{Hex, HexSet, ring_size, cells_within_range, cells_within_range_present_on};
pub use attribute::{ClampedAttribute, ValueEvent, approx_eq};
pub use attributes::{AttributeSet, ModifierOp, ObjectAttribute, keys};
pub use events::{EventBus, EventKind, EventQueue, GameEvent, SubscriptionId};
pub use search::{BoardView, CellSearchRules, RangeCells};
pub use nav::NavGraph;
pub use interaction::{Ability, Effect, FindCover, HasRange, HighlightStyle, InteractionArgs, InteractionId, Movement, RangedAbility};
pub use piece::{Faction, Piece, PieceId};
pub use board::{Board, BoardConfig, BoardState, Cell, CellId, Occupant, RangeHighlight};
pub use scenario::{AbilityConfig, BoardLayout, MovementConfig, Placement, Scenario, UnitProfile};
pub use error::{GameError, GameResult};
