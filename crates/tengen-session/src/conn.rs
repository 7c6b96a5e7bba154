//! Connection references: how the engine addresses a client without
//! owning it.

use std::fmt;

use tokio::sync::mpsc;

use tengen_protocol::ServerFrame;

/// A unique identifier for one network connection.
///
/// Distinct from a user ID: the same user holds a fresh `ConnectionId`
/// every time they reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

/// The sending half of a connection's outbound frame channel.
pub type FrameSender = mpsc::UnboundedSender<ServerFrame>;

/// An opaque reference to a live connection.
///
/// The gateway owns the actual socket; sessions hold clones of this
/// reference, valid until the next disconnect. It supports exactly two
/// things — sending a frame and comparing by connection ID — and
/// deliberately nothing else.
#[derive(Debug, Clone)]
pub struct ConnRef {
    id: ConnectionId,
    tx: FrameSender,
}

impl ConnRef {
    pub fn new(id: ConnectionId, tx: FrameSender) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues a frame for delivery.
    ///
    /// A failed send means the peer's writer task is already gone, which
    /// is indistinguishable from the peer having disconnected — the
    /// reader side of that connection drives the actual disconnect
    /// handling, so the failure is logged and swallowed here.
    pub fn send(&self, frame: ServerFrame) {
        if self.tx.send(frame).is_err() {
            tracing::debug!(conn = %self.id, "dropped frame for closed connection");
        }
    }
}

impl PartialEq for ConnRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnRef {}
