//! Per-connection handler: identity, frame routing, and disconnect
//! bookkeeping.
//!
//! Each accepted socket gets its own task running [`handle_connection`].
//! The flow is:
//!   1. WebSocket upgrade, capturing the `Cookie` header
//!   2. Identity resolution — rejected connections never reach the engine
//!   3. Register the client, send it the current lobby snapshot
//!   4. Loop: decode frames → route to the registry → relay outcomes
//!   5. On close: clear seats, arm grace timers, re-broadcast the lobby

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::Message;

use tengen_protocol::{
    ClientFrame, Codec, Color, GameEvent, GameId, GameRequest, Identity, JsonCodec,
    LobbyRequest, ServerFrame,
};
use tengen_session::{ConnRef, ConnectionId, SessionError};

use crate::lobby;
use crate::server::{Client, ServerState, SharedState};
use crate::{IdentityProvider, ServerError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<P: IdentityProvider>(
    stream: TcpStream,
    peer: SocketAddr,
    provider: Arc<P>,
    state: SharedState,
) -> Result<(), ServerError> {
    // Capture the Cookie header during the upgrade — it is the opaque
    // credential blob the identity provider understands.
    let mut credentials = String::new();
    let mut ws = tokio_tungstenite::accept_hdr_async(stream, |req: &Request, resp: Response| {
        if let Some(cookie) = req.headers().get("cookie").and_then(|v| v.to_str().ok()) {
            credentials = cookie.to_owned();
        }
        Ok(resp)
    })
    .await?;

    // Identity comes before admission. A rejected connection is closed
    // without the engine ever learning it existed.
    let identity = match provider.identify(&credentials).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::info!(%peer, error = %e, "connection rejected");
            let _ = ws.close(None).await;
            return Err(e.into());
        }
    };

    let conn_id = ConnectionId(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
    tracing::info!(
        conn = %conn_id,
        %peer,
        user = %identity.user_id,
        name = %identity.display_name,
        "connection admitted"
    );

    let (tx, mut outbound) = mpsc::unbounded_channel();
    let conn = ConnRef::new(conn_id, tx);
    let codec = JsonCodec;

    let (mut sink, mut source) = ws.split();

    // Writer task: drains the outbound queue into the socket. A send
    // failure means the peer is gone; the reader side observes the same
    // close and drives the actual disconnect handling.
    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            let text = match codec.encode(&frame) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to encode outbound frame");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    // Register the client and give it the lobby right away, so a fresh
    // lobby page renders without waiting for the next change.
    {
        let mut st = state.lock().await;
        st.clients.insert(
            conn_id,
            Client {
                identity: identity.clone(),
                conn: conn.clone(),
                current_game: None,
            },
        );
        conn.send(lobby::snapshot(&st.registry));
    }

    // Reader loop.
    while let Some(message) = source.next().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(conn = %conn_id, error = %e, "recv error");
                break;
            }
        };
        let data = match &message {
            Message::Text(text) => text.as_bytes(),
            Message::Binary(data) => data.as_ref(),
            Message::Close(_) => break,
            _ => continue, // ping/pong
        };

        // Malformed frames are dropped, never fatal to the connection.
        let frame: ClientFrame = match codec.decode(data) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(conn = %conn_id, error = %e, "discarding malformed frame");
                continue;
            }
        };

        handle_frame(&state, conn_id, &conn, &identity, frame).await;
    }

    disconnect(&state, conn_id).await;

    // Disconnect handling released every ConnRef the sessions held, so
    // dropping ours closes the outbound queue and lets the writer finish.
    drop(conn);
    let _ = writer.await;

    Ok(())
}

/// Routes one decoded frame to the engine.
async fn handle_frame(
    state: &SharedState,
    conn_id: ConnectionId,
    conn: &ConnRef,
    identity: &Identity,
    frame: ClientFrame,
) {
    match frame {
        ClientFrame::Lobby(LobbyRequest::Create) => {
            create_game(state, conn_id, conn, identity).await;
        }
        ClientFrame::Lobby(LobbyRequest::Join { game_id }) => {
            join_game(state, conn_id, conn, identity, game_id).await;
        }
        ClientFrame::Game(GameRequest::Move { x, y }) => {
            play_move(state, conn_id, conn, identity, x, y).await;
        }
        ClientFrame::Game(GameRequest::Rejoin { game_id }) => {
            rejoin_game(state, conn_id, conn, identity, game_id).await;
        }
    }
}

async fn create_game(
    state: &SharedState,
    conn_id: ConnectionId,
    conn: &ConnRef,
    identity: &Identity,
) {
    let mut st = state.lock().await;
    match st.registry.create(identity.clone(), conn.clone()) {
        Ok(game_id) => {
            if let Some(client) = st.clients.get_mut(&conn_id) {
                client.current_game = Some(game_id);
            }
            lobby::broadcast(&st);
        }
        Err(e) => reject(conn, &e),
    }
}

async fn join_game(
    state: &SharedState,
    conn_id: ConnectionId,
    conn: &ConnRef,
    identity: &Identity,
    game_id: GameId,
) {
    let mut st = state.lock().await;
    match st.registry.join(game_id, identity.clone(), conn.clone()) {
        Ok(()) => {
            if let Some(client) = st.clients.get_mut(&conn_id) {
                client.current_game = Some(game_id);
            }
            // Both participants learn their color and the game ID.
            if let Some(session) = st.registry.get(game_id) {
                for color in [Color::Black, Color::White] {
                    if let Some(peer) = session.connection(color) {
                        peer.send(ServerFrame::Event(GameEvent::Start { color, game_id }));
                    }
                }
            }
            lobby::broadcast(&st);
        }
        Err(e) => reject(conn, &e),
    }
}

async fn play_move(
    state: &SharedState,
    conn_id: ConnectionId,
    conn: &ConnRef,
    identity: &Identity,
    x: i32,
    y: i32,
) {
    let mut st = state.lock().await;

    // The client's back-reference locates the game; the session's seats
    // decide whether (and as which color) the sender may move.
    let Some(game_id) = st.clients.get(&conn_id).and_then(|c| c.current_game) else {
        reject(conn, &SessionError::NotInSession);
        return;
    };

    match st.registry.play_move(game_id, identity.user_id, x, y) {
        Ok(placed) => {
            // Point-to-point relay to the participants; moves never
            // touch the lobby.
            if let Some(session) = st.registry.get(game_id) {
                for peer in session.live_connections() {
                    peer.send(ServerFrame::Event(GameEvent::Update {
                        x: placed.x,
                        y: placed.y,
                        color: placed.color,
                    }));
                }
            }
        }
        Err(e) => reject(conn, &e),
    }
}

async fn rejoin_game(
    state: &SharedState,
    conn_id: ConnectionId,
    conn: &ConnRef,
    identity: &Identity,
    game_id: GameId,
) {
    let mut st = state.lock().await;
    match st.registry.rejoin(game_id, identity, conn.clone()) {
        Ok(color) => {
            if let Some(client) = st.clients.get_mut(&conn_id) {
                client.current_game = Some(game_id);
            }
            conn.send(ServerFrame::Event(GameEvent::RejoinSuccess { color }));
            tracing::info!(conn = %conn_id, game = %game_id, %color, "rejoined");
            // The lobby's "reconnecting" placeholder flips back to a name.
            lobby::broadcast(&st);
        }
        Err(e) => reject(conn, &e),
    }
}

/// Tears down one connection: deregister, vacate seats, arm grace
/// timers for games that just lost their last player.
async fn disconnect(state: &SharedState, conn_id: ConnectionId) {
    let mut st = state.lock().await;

    let client = st.clients.remove(&conn_id);
    let report = st.registry.handle_disconnect(conn_id);

    arm_grace_timers(state, &mut st, &report.abandoned);

    if report.changed {
        lobby::broadcast(&st);
    }

    if let Some(client) = client {
        tracing::info!(conn = %conn_id, user = %client.identity.user_id, "connection closed");
    }
}

/// Spawns a grace timer for each newly abandoned game.
///
/// The timer sleeps, then re-checks under the lock that the game is
/// still abandoned before removing it — so a rejoin that lands the
/// instant the timer fires can never race the removal: exactly one of
/// the two wins the lock and the other sees its outcome.
fn arm_grace_timers(state: &SharedState, st: &mut ServerState, abandoned: &[GameId]) {
    for &game_id in abandoned {
        let grace = st.registry.config().grace_period;
        let shared = Arc::clone(state);
        let task = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let mut st = shared.lock().await;
            if st.registry.expire_abandoned(game_id) {
                lobby::broadcast(&st);
            }
        });

        match st.registry.get_mut(game_id) {
            Some(session) => {
                // arm_grace_timer refuses a second timer; if one is
                // already running the new task must die immediately.
                if !session.arm_grace_timer(task.abort_handle()) {
                    task.abort();
                }
            }
            None => task.abort(),
        }
    }
}

/// Sends a request rejection to the originating connection only.
fn reject(conn: &ConnRef, err: &SessionError) {
    tracing::debug!(conn = %conn.id(), error = %err, code = err.code(), "request rejected");
    conn.send(ServerFrame::Event(GameEvent::Error {
        message: err.code().to_string(),
    }));
}
