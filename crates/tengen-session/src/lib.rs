//! Session engine for Tengen.
//!
//! This crate is the stateful core of the server: it tracks every running
//! game, pairs players into seats, validates moves, and keeps the
//! disconnect/rejoin bookkeeping that lets a player survive a page
//! navigation or a brief network drop.
//!
//! # Key types
//!
//! - [`Board`] — the grid and its move-legality check
//! - [`GameSession`] — one match: two seats, a board, a turn tracker, and
//!   a lifecycle state machine
//! - [`SessionRegistry`] — all live sessions, keyed by game ID
//! - [`ConnRef`] — an opaque reference to a client connection, usable for
//!   sending and equality but never ownership
//! - [`SessionConfig`] — grace period and board size
//!
//! # How it fits in the stack
//!
//! ```text
//! Gateway (above)   ← owns connections, routes frames here
//!     ↕
//! Session engine (this crate)   ← owns game state, returns outcomes
//!     ↕
//! Protocol (below)  ← frame and identity types
//! ```
//!
//! Nothing here performs I/O beyond pushing frames into per-connection
//! channels; every operation is synchronous and runs under the caller's
//! exclusivity (the gateway serializes all access behind one lock).

mod board;
mod config;
mod conn;
mod error;
mod game;
mod registry;

pub use board::{Board, MoveError};
pub use config::SessionConfig;
pub use conn::{ConnRef, ConnectionId, FrameSender};
pub use error::SessionError;
pub use game::{DisconnectEffect, GameSession, GameState, PlacedStone};
pub use registry::{DisconnectReport, SessionRegistry};
