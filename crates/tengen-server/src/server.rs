//! `TengenServer` builder and accept loop.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Mutex;

use tengen_protocol::{GameId, Identity};
use tengen_session::{ConnRef, ConnectionId, SessionConfig, SessionRegistry};

use crate::handler::handle_connection;
use crate::{IdentityProvider, ServerError};

/// One admitted client connection, as the gateway sees it.
pub(crate) struct Client {
    /// Who this connection belongs to, fixed at admission.
    pub(crate) identity: Identity,
    /// Handle for queueing outbound frames.
    pub(crate) conn: ConnRef,
    /// The game this connection most recently attached to. A lookup aid
    /// for routing `move` frames — seat membership in the sessions is
    /// the authority.
    pub(crate) current_game: Option<GameId>,
}

/// Everything the engine mutates, behind one lock.
///
/// Connection handlers and grace timers all serialize on this mutex, so
/// no two engine operations ever interleave — one event-dispatch thread,
/// expressed as a lock.
pub(crate) struct ServerState {
    pub(crate) clients: HashMap<ConnectionId, Client>,
    pub(crate) registry: SessionRegistry,
}

pub(crate) type SharedState = Arc<Mutex<ServerState>>;

/// Builder for configuring and starting a Tengen server.
///
/// # Example
///
/// ```rust,no_run
/// use tengen_server::{DevIdentity, TengenServerBuilder};
///
/// # async fn run() -> Result<(), tengen_server::ServerError> {
/// let server = TengenServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build(DevIdentity)
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct TengenServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
}

impl TengenServerBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            session_config: SessionConfig::default(),
        }
    }

    /// Sets the address to listen on.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Overrides the session configuration (grace period, board size).
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Binds the listener and assembles the server.
    pub async fn build<P: IdentityProvider>(
        self,
        provider: P,
    ) -> Result<TengenServer<P>, ServerError> {
        let listener = TcpListener::bind(&self.bind_addr)
            .await
            .map_err(ServerError::Bind)?;
        tracing::info!(addr = %self.bind_addr, "listening");

        let state = Arc::new(Mutex::new(ServerState {
            clients: HashMap::new(),
            registry: SessionRegistry::new(self.session_config),
        }));

        Ok(TengenServer {
            listener,
            provider: Arc::new(provider),
            state,
        })
    }
}

impl Default for TengenServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Tengen server. Call [`run()`](Self::run) to start
/// accepting connections.
pub struct TengenServer<P: IdentityProvider> {
    listener: TcpListener,
    provider: Arc<P>,
    state: SharedState,
}

impl<P: IdentityProvider> TengenServer<P> {
    /// Creates a new builder.
    pub fn builder() -> TengenServerBuilder {
        TengenServerBuilder::new()
    }

    /// The address the server is actually bound to (useful with port 0).
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// Every accepted socket gets its own handler task; a connection
    /// failing never affects the loop or any other connection.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("server running");

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let provider = Arc::clone(&self.provider);
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(stream, peer, provider, state).await
                        {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
