//! Error types for the server layer.

use crate::IdentityError;

/// Errors that end a connection or prevent the server from starting.
///
/// Request-level rejections are NOT here — those go back to the client
/// as `error` frames and never terminate anything.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Binding the listen socket failed.
    #[error("bind failed: {0}")]
    Bind(#[source] std::io::Error),

    /// The WebSocket upgrade failed or the socket died mid-handshake.
    #[error("websocket handshake failed: {0}")]
    Handshake(#[from] tokio_tungstenite::tungstenite::Error),

    /// The identity provider rejected the connection.
    #[error(transparent)]
    Identity(#[from] IdentityError),
}
