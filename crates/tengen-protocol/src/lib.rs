//! Wire protocol for Tengen.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`UserId`], [`GameId`], [`Color`], [`GameSummary`]) — the
//!   identities and values that travel on the wire.
//! - **Frames** ([`ClientFrame`], [`ServerFrame`]) — the JSON messages
//!   themselves. Field names are the contract; the shapes are pinned down
//!   by the serialization tests in `frames.rs`.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how frames are converted
//!   to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! The protocol layer sits below everything else. It doesn't know about
//! connections, sessions, or the lobby — it only knows how to serialize
//! and deserialize messages.

mod codec;
mod error;
mod frames;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use frames::{ClientFrame, GameEvent, GameRequest, LobbyRequest, ServerFrame};
pub use types::{Color, GameId, GameSummary, Identity, UserId, RECONNECTING};
