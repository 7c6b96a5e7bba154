//! The frames that travel over a client connection.
//!
//! The wire format is plain JSON text frames. The two browser pages
//! speak different tag styles — the lobby page tags its requests with
//! `action`, the game page with `type` — so [`ClientFrame`] is an
//! untagged union over the two tagged enums. Outbound frames are either
//! the lobby snapshot (`{"games": [...]}`) or a `type`-tagged event.
//!
//! The exact JSON shapes are the contract with the browser clients; the
//! tests at the bottom pin them down field by field.

use serde::{Deserialize, Serialize};

use crate::{Color, GameId, GameSummary};

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Any frame a client may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientFrame {
    /// Lobby-level request, tagged with `action`.
    Lobby(LobbyRequest),
    /// In-game request, tagged with `type`.
    Game(GameRequest),
}

/// Requests issued from the lobby.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum LobbyRequest {
    /// Open a new game with the sender in seat A.
    Create,
    /// Take seat B of an existing game.
    Join {
        #[serde(rename = "gameId")]
        game_id: GameId,
    },
}

/// Requests issued from inside a game.
///
/// `Move` carries no game ID — it applies to the sender's current
/// session. `Rejoin` may additionally carry a client-side color hint;
/// it is advisory only and deliberately not modeled here (serde drops
/// unknown fields), since the server always rederives the color from
/// the user-to-seat mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GameRequest {
    /// Place a stone at board coordinates.
    Move { x: i32, y: i32 },
    /// Reattach to a game after reconnecting.
    Rejoin {
        #[serde(rename = "gameId")]
        game_id: GameId,
    },
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Any frame the server may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerFrame {
    /// Full lobby snapshot, pushed to every connected client. Always a
    /// complete replacement, never a delta.
    Lobby { games: Vec<GameSummary> },
    /// Game event, delivered point-to-point.
    Event(GameEvent),
}

/// Events delivered to one or both participants of a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Sent to both participants when a game becomes active, carrying
    /// each recipient's assigned color.
    Start {
        color: Color,
        #[serde(rename = "gameId")]
        game_id: GameId,
    },
    /// Sent to both participants after a successful move.
    Update { x: i32, y: i32, color: Color },
    /// Sent to a client whose rejoin succeeded.
    RejoinSuccess { color: Color },
    /// Sent to the originating client only, on any rejected request.
    /// `message` is the stable error code, e.g. `"NotYourTurn"`.
    Error { message: String },
}

// =========================================================================
// Tests
// =========================================================================
