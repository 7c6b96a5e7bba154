//! Tengen server: the connection gateway and lobby broadcaster.
//!
//! This crate ties the layers together: it accepts WebSocket
//! connections, requires a resolved identity before a connection may
//! touch the engine, routes inbound frames to the session registry, and
//! relays outcomes back to the affected connections. The lobby
//! broadcaster pushes a fresh snapshot of all games to every client
//! whenever the displayed state changes.
//!
//! # Key types
//!
//! - [`TengenServerBuilder`] / [`TengenServer`] — configure and run the
//!   accept loop
//! - [`IdentityProvider`] — the seam to the external auth layer
//! - [`DevIdentity`] — a credentials parser for development and tests
//!
//! All engine state lives behind a single async mutex, so connection
//! handlers and grace-period timers never run concurrently with each
//! other — the multi-threaded equivalent of one event-dispatch thread.

mod auth;
mod error;
mod handler;
mod lobby;
mod server;

pub use auth::{DevIdentity, IdentityError, IdentityProvider};
pub use error::ServerError;
pub use server::{TengenServer, TengenServerBuilder};
