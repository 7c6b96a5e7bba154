//! The session registry: every live game in one process, keyed by ID.
//!
//! The registry is plain data — no locks, no globals. The gateway owns
//! exactly one instance behind its state lock, and tests construct their
//! own. ID allocation is an instance counter so IDs are monotonic and
//! never reused within one registry's lifetime.

use std::collections::HashMap;

use tengen_protocol::{Color, GameId, GameSummary, Identity, UserId};

use crate::{
    ConnRef, ConnectionId, DisconnectEffect, GameSession, GameState, PlacedStone,
    SessionConfig, SessionError,
};

/// What one connection's disconnect did across all sessions.
#[derive(Debug, Default)]
pub struct DisconnectReport {
    /// Games closed outright (un-joined games the creator walked out of).
    pub closed: Vec<GameId>,
    /// Games that just lost their last connection; the caller should arm
    /// a grace timer for each.
    pub abandoned: Vec<GameId>,
    /// Whether anything the lobby displays changed.
    pub changed: bool,
}

/// All live game sessions.
///
/// Invariant: every session reachable here is Open, Active, or
/// Abandoned — closing a session and removing it happen in the same
/// operation, so a Closed session is never observable.
pub struct SessionRegistry {
    sessions: HashMap<GameId, GameSession>,
    next_id: u64,
    config: SessionConfig,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            next_id: 1,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Opens a new game with the requester in seat A.
    ///
    /// # Errors
    /// [`SessionError::AlreadyInSession`] if this connection already
    /// occupies a seat anywhere — checked against the seats themselves,
    /// which are the authority on membership.
    pub fn create(&mut self, creator: Identity, conn: ConnRef) -> Result<GameId, SessionError> {
        if self.sessions.values().any(|s| s.occupies_seat(conn.id())) {
            return Err(SessionError::AlreadyInSession);
        }

        let id = GameId(self.next_id);
        self.next_id += 1;

        let user = creator.user_id;
        self.sessions
            .insert(id, GameSession::new(id, creator, conn, self.config.board_size));
        tracing::info!(game = %id, user = %user, "game created");
        Ok(id)
    }

    /// Seats a second player in an existing game.
    pub fn join(
        &mut self,
        id: GameId,
        identity: Identity,
        conn: ConnRef,
    ) -> Result<(), SessionError> {
        let session = self.sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        session.join(identity, conn)
    }

    /// Applies a move to the given game.
    ///
    /// A vanished game reports [`SessionError::NotInSession`] — from the
    /// mover's point of view there is simply no active game anymore.
    pub fn play_move(
        &mut self,
        id: GameId,
        user_id: UserId,
        x: i32,
        y: i32,
    ) -> Result<PlacedStone, SessionError> {
        let session = self.sessions.get_mut(&id).ok_or(SessionError::NotInSession)?;
        session.play_move(user_id, x, y)
    }

    /// Reattaches a returning user to their seat in the given game.
    pub fn rejoin(
        &mut self,
        id: GameId,
        identity: &Identity,
        conn: ConnRef,
    ) -> Result<Color, SessionError> {
        let session = self.sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        session.rejoin(identity, conn)
    }

    /// Clears the connection out of every seat it holds.
    ///
    /// Games the disconnect closed are removed here, in the same
    /// operation. Newly abandoned games are reported so the caller can
    /// arm their grace timers.
    pub fn handle_disconnect(&mut self, conn_id: ConnectionId) -> DisconnectReport {
        let mut report = DisconnectReport::default();

        for session in self.sessions.values_mut() {
            match session.on_disconnect(conn_id) {
                DisconnectEffect::Unaffected => {}
                DisconnectEffect::SlotVacated => report.changed = true,
                DisconnectEffect::Abandoned => {
                    report.abandoned.push(session.id());
                    report.changed = true;
                }
                DisconnectEffect::Closed => {
                    report.closed.push(session.id());
                    report.changed = true;
                }
            }
        }

        for id in &report.closed {
            self.sessions.remove(id);
            tracing::info!(game = %id, "game closed, creator left before an opponent joined");
        }

        report
    }

    /// Removes the game if — and only if — it is still Abandoned.
    ///
    /// This is the grace timer's landing point. The timer task and a
    /// racing rejoin both run under the caller's lock, so exactly one of
    /// "expired and removed" / "revived, nothing to remove" happens;
    /// firing after the game is already gone is a no-op.
    pub fn expire_abandoned(&mut self, id: GameId) -> bool {
        let expired = self
            .sessions
            .get(&id)
            .is_some_and(|s| s.state() == GameState::Abandoned);
        if expired {
            self.sessions.remove(&id);
            tracing::info!(game = %id, "grace period elapsed, game discarded");
        }
        expired
    }

    /// Looks up a session.
    pub fn get(&self, id: GameId) -> Option<&GameSession> {
        self.sessions.get(&id)
    }

    /// Looks up a session mutably.
    pub fn get_mut(&mut self, id: GameId) -> Option<&mut GameSession> {
        self.sessions.get_mut(&id)
    }

    /// Removes a session. Removing an unknown ID is a no-op.
    pub fn remove(&mut self, id: GameId) {
        if self.sessions.remove(&id).is_some() {
            tracing::info!(game = %id, "game removed");
        }
    }

    /// A fresh lobby snapshot, ordered by game ID.
    pub fn list_summaries(&self) -> Vec<GameSummary> {
        let mut summaries: Vec<GameSummary> =
            self.sessions.values().map(GameSession::summary).collect();
        summaries.sort_by_key(|s| s.game_id.0);
        summaries
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no sessions are live.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
