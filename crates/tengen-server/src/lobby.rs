//! The lobby broadcaster.
//!
//! Derives a public summary of every live game and pushes it to every
//! connected client. Each push is a complete replacement snapshot — a
//! slow client that misses one broadcast is fully caught up by the next.

use tengen_protocol::ServerFrame;
use tengen_session::SessionRegistry;

use crate::server::ServerState;

/// A fresh lobby frame for the current registry contents.
pub(crate) fn snapshot(registry: &SessionRegistry) -> ServerFrame {
    ServerFrame::Lobby {
        games: registry.list_summaries(),
    }
}

/// Recomputes the lobby and sends it to every connected client.
///
/// Callers invoke this after anything that changes what the lobby
/// displays: create, join, a disconnect that darkens a seat, a grace
/// expiry, a rejoin. Ordinary moves never come through here.
pub(crate) fn broadcast(state: &ServerState) {
    let frame = snapshot(&state.registry);
    tracing::debug!(
        clients = state.clients.len(),
        games = state.registry.len(),
        "lobby broadcast"
    );
    for client in state.clients.values() {
        client.conn.send(frame.clone());
    }
}

// =========================================================================
// Tests
// =========================================================================
