//! Error types for the session engine.

use tengen_protocol::GameId;

use crate::MoveError;

/// Errors that a session or registry operation can fail with.
///
/// None of these are fatal to anything: each one is reported back to the
/// requesting client as an `error` frame and leaves the registry and all
/// other games untouched.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The requesting connection already occupies a seat in a live game.
    #[error("connection already seated in a running game")]
    AlreadyInSession,

    /// No live game has this ID (unknown, or already closed).
    #[error("game {0} not found")]
    NotFound(GameId),

    /// Both seats of the game are taken.
    #[error("game {0} already has two players")]
    Full(GameId),

    /// A creator may not take the second seat of their own game.
    #[error("cannot join a game you created")]
    SelfJoin,

    /// The sender has no active game to play in.
    #[error("no active game for this sender")]
    NotInSession,

    /// The sender's color is not the color to move.
    #[error("not this player's turn")]
    NotYourTurn,

    /// The user matches neither seat of the game.
    #[error("user holds no seat in game {0}")]
    NotAMember(GameId),

    /// A board-level rejection.
    #[error(transparent)]
    Move(#[from] MoveError),
}

impl SessionError {
    /// The stable identifier carried in `error` frames.
    ///
    /// Clients match on these strings, so they must never change even if
    /// the human-readable messages do.
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::AlreadyInSession => "AlreadyInSession",
            SessionError::NotFound(_) => "SessionNotFound",
            SessionError::Full(_) => "SessionFull",
            SessionError::SelfJoin => "SelfJoin",
            SessionError::NotInSession => "NotInSession",
            SessionError::NotYourTurn => "NotYourTurn",
            SessionError::NotAMember(_) => "NotAMember",
            SessionError::Move(MoveError::OutOfBounds { .. }) => "OutOfBounds",
            SessionError::Move(MoveError::CellOccupied { .. }) => "CellOccupied",
        }
    }
}
