//! Core protocol types shared by every layer.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a user.
///
/// Newtype over `u64` so a `UserId` can never be confused with a
/// [`GameId`]. `#[serde(transparent)]` serializes it as the bare number.
///
/// The value is assigned by the external auth layer; this engine treats
/// it as opaque and stable for the lifetime of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// A unique identifier for a game session.
///
/// Allocated monotonically by the session registry; never reused within
/// one server process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G-{}", self.0)
    }
}

/// An authenticated user: stable ID plus the name shown in the lobby.
///
/// Produced by the identity seam before a connection is admitted to the
/// engine; the engine trusts these fields for the connection's lifetime
/// and never re-derives them from message payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable user ID.
    pub user_id: UserId,
    /// Name rendered in lobby summaries.
    pub display_name: String,
}

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// Stone color. Black belongs to a session's creator and moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Black,
    White,
}

impl Color {
    /// The other color.
    pub fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Black => write!(f, "black"),
            Color::White => write!(f, "white"),
        }
    }
}

// ---------------------------------------------------------------------------
// Lobby summaries
// ---------------------------------------------------------------------------

/// Placeholder shown in a lobby summary while a seated player has no live
/// connection.
pub const RECONNECTING: &str = "reconnecting";

/// One entry of the lobby snapshot.
///
/// `player1`/`player2` carry a display name, the [`RECONNECTING`]
/// placeholder, or are absent entirely if the seat was never taken —
/// absent (not `null`) so lobby clients can treat the field as falsy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// The game's unique ID.
    #[serde(rename = "gameId")]
    pub game_id: GameId,
    /// Seat A occupant, if the seat was ever taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player1: Option<String>,
    /// Seat B occupant, if the seat was ever taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player2: Option<String>,
}

// =========================================================================
// Tests
// =========================================================================
