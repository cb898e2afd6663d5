//! Core error type

use crate::hex::Hex;
use crate::interaction::InteractionId;
use crate::piece::PieceId;

/// Errors surfaced by board operations and event delivery.
///
/// Gameplay preconditions (occupied cell, out of range, wrong faction) are not
/// errors; those operations report `false` and leave state untouched.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("no cell at {0}")]
    CellNotFound(Hex),

    #[error("no piece with id {0}")]
    PieceNotFound(PieceId),

    #[error("unknown unit: {0}")]
    UnknownUnit(String),

    #[error("{piece} has no interaction {interaction:?}")]
    UnknownInteraction {
        piece: PieceId,
        interaction: InteractionId,
    },

    #[error("event handler failed: {0}")]
    Handler(String),
}

pub type GameResult<T> = Result<T, GameError>;
