//! One game session: two seats, a board, a turn tracker, and the
//! lifecycle state machine.

use std::fmt;

use tokio::task::AbortHandle;

use tengen_protocol::{Color, GameId, GameSummary, Identity, UserId, RECONNECTING};

use crate::{Board, ConnRef, ConnectionId, SessionError};

// ---------------------------------------------------------------------------
// Lifecycle state
// ---------------------------------------------------------------------------

/// The lifecycle state of a game session.
///
/// ```text
///              join                    both seats dark
///   Open ───────────────→ Active ───────────────────────→ Abandoned
///     │                     ↑                                 │
///     │ creator leaves      └────────── rejoin ───────────────┤
///     ▼                                                       │ grace
///   Closed ←──────────────────────────────────────────────────┘ elapsed
/// ```
///
/// - **Open**: only seat A is taken; the game is listed as joinable.
/// - **Active**: both seats taken. One seat losing its connection does
///   NOT leave this state — the connected side may keep playing.
/// - **Abandoned**: both seats dark, grace timer running. A rejoin from
///   either seat's user revives the game to Active.
/// - **Closed**: terminal. A session only ever enters this state in the
///   same operation that removes it from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Open,
    Active,
    Abandoned,
    Closed,
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameState::Open => write!(f, "Open"),
            GameState::Active => write!(f, "Active"),
            GameState::Abandoned => write!(f, "Abandoned"),
            GameState::Closed => write!(f, "Closed"),
        }
    }
}

/// What a disconnect did to one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectEffect {
    /// The connection held no seat here.
    Unaffected,
    /// One seat went dark; the game stays playable.
    SlotVacated,
    /// Both seats are now dark; the caller should arm the grace timer.
    Abandoned,
    /// The creator left an un-joined game; the caller must remove it.
    Closed,
}

/// A successfully placed stone, for relay to both participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedStone {
    pub x: i32,
    pub y: i32,
    pub color: Color,
}

// ---------------------------------------------------------------------------
// Seats
// ---------------------------------------------------------------------------

/// One of the two player seats.
///
/// The seat remembers WHO sits here (`user_id`, `display_name`) for the
/// whole life of the game; `conn` is only the current way to reach them
/// and goes `None` across disconnects. There is no separate
/// "disconnected" flag — an occupied seat with no connection IS the
/// disconnected state.
#[derive(Debug, Clone)]
struct Seat {
    user_id: UserId,
    display_name: String,
    conn: Option<ConnRef>,
}

impl Seat {
    fn new(identity: Identity, conn: ConnRef) -> Self {
        Self {
            user_id: identity.user_id,
            display_name: identity.display_name,
            conn: Some(conn),
        }
    }

    fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// The name shown in lobby summaries.
    fn display(&self) -> String {
        if self.is_connected() {
            self.display_name.clone()
        } else {
            RECONNECTING.to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// GameSession
// ---------------------------------------------------------------------------

/// One match between two players.
///
/// Sessions never touch the network themselves; they hold [`ConnRef`]s
/// for addressing and equality, return outcomes, and let the gateway do
/// the relaying. All methods run under the registry's exclusivity.
#[derive(Debug)]
pub struct GameSession {
    id: GameId,
    /// Seat A: the creator. Plays black and moves first.
    seat_a: Seat,
    /// Seat B: the joiner. Plays white. `None` until someone joins.
    seat_b: Option<Seat>,
    board: Board,
    turn: Color,
    state: GameState,
    /// Abort handle of the running grace timer task, if armed.
    /// At most one timer exists per session at any time.
    grace_timer: Option<AbortHandle>,
}

impl GameSession {
    pub(crate) fn new(id: GameId, creator: Identity, conn: ConnRef, board_size: usize) -> Self {
        Self {
            id,
            seat_a: Seat::new(creator, conn),
            seat_b: None,
            board: Board::new(board_size),
            turn: Color::Black,
            state: GameState::Open,
            grace_timer: None,
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The color owned by this user's seat, if they hold one.
    pub fn color_of(&self, user_id: UserId) -> Option<Color> {
        if self.seat_a.user_id == user_id {
            Some(Color::Black)
        } else if self.seat_b.as_ref().is_some_and(|s| s.user_id == user_id) {
            Some(Color::White)
        } else {
            None
        }
    }

    /// The live connection of the given seat, if any.
    pub fn connection(&self, color: Color) -> Option<&ConnRef> {
        match color {
            Color::Black => self.seat_a.conn.as_ref(),
            Color::White => self.seat_b.as_ref().and_then(|s| s.conn.as_ref()),
        }
    }

    /// All currently reachable participants.
    pub fn live_connections(&self) -> Vec<ConnRef> {
        [Color::Black, Color::White]
            .into_iter()
            .filter_map(|c| self.connection(c).cloned())
            .collect()
    }

    /// Whether this connection currently occupies a seat.
    pub fn occupies_seat(&self, conn_id: ConnectionId) -> bool {
        let held = |seat: &Seat| seat.conn.as_ref().is_some_and(|c| c.id() == conn_id);
        held(&self.seat_a) || self.seat_b.as_ref().is_some_and(held)
    }

    /// The lobby view of this session.
    pub fn summary(&self) -> GameSummary {
        GameSummary {
            game_id: self.id,
            player1: Some(self.seat_a.display()),
            player2: self.seat_b.as_ref().map(Seat::display),
        }
    }

    // -- Operations --------------------------------------------------------

    /// Seats a second player and activates the game.
    pub(crate) fn join(&mut self, identity: Identity, conn: ConnRef) -> Result<(), SessionError> {
        if self.state != GameState::Open {
            return Err(SessionError::Full(self.id));
        }
        if identity.user_id == self.seat_a.user_id {
            return Err(SessionError::SelfJoin);
        }
        self.seat_b = Some(Seat::new(identity, conn));
        self.state = GameState::Active;
        tracing::info!(game = %self.id, "game active");
        Ok(())
    }

    /// Validates and applies a move.
    ///
    /// The acting color is derived from the user-to-seat mapping and
    /// nothing else; whatever color the client believes it has plays no
    /// part. A disconnected opponent does not block play.
    pub(crate) fn play_move(
        &mut self,
        user_id: UserId,
        x: i32,
        y: i32,
    ) -> Result<PlacedStone, SessionError> {
        if self.state != GameState::Active {
            return Err(SessionError::NotInSession);
        }
        let color = self.color_of(user_id).ok_or(SessionError::NotInSession)?;
        if color != self.turn {
            return Err(SessionError::NotYourTurn);
        }
        self.board.place_stone(x, y, color)?;
        self.turn = self.turn.opponent();
        Ok(PlacedStone { x, y, color })
    }

    /// Reattaches a returning user to their seat.
    ///
    /// Cancels any running grace timer and revives an Abandoned game.
    /// The newest connection always wins the seat; a stale one left
    /// behind by a missed close simply stops matching on disconnect.
    pub(crate) fn rejoin(
        &mut self,
        identity: &Identity,
        conn: ConnRef,
    ) -> Result<Color, SessionError> {
        let color = self
            .color_of(identity.user_id)
            .ok_or(SessionError::NotAMember(self.id))?;
        match color {
            Color::Black => self.seat_a.conn = Some(conn),
            Color::White => {
                if let Some(seat) = self.seat_b.as_mut() {
                    seat.conn = Some(conn);
                }
            }
        }
        self.cancel_grace_timer();
        if self.state == GameState::Abandoned {
            self.state = GameState::Active;
            tracing::info!(game = %self.id, "game revived from abandonment");
        }
        Ok(color)
    }

    /// Clears every seat this connection holds and reports the
    /// resulting transition.
    pub(crate) fn on_disconnect(&mut self, conn_id: ConnectionId) -> DisconnectEffect {
        let mut vacated = false;
        if self.seat_a.conn.as_ref().is_some_and(|c| c.id() == conn_id) {
            self.seat_a.conn = None;
            vacated = true;
        }
        if let Some(seat) = self.seat_b.as_mut() {
            if seat.conn.as_ref().is_some_and(|c| c.id() == conn_id) {
                seat.conn = None;
                vacated = true;
            }
        }
        if !vacated {
            return DisconnectEffect::Unaffected;
        }

        match self.state {
            // No opponent to wait for — close on the spot.
            GameState::Open => {
                self.state = GameState::Closed;
                DisconnectEffect::Closed
            }
            GameState::Active => {
                let both_dark = !self.seat_a.is_connected()
                    && self.seat_b.as_ref().is_some_and(|s| !s.is_connected());
                if both_dark {
                    self.state = GameState::Abandoned;
                    tracing::info!(game = %self.id, "both seats dark, game abandoned");
                    DisconnectEffect::Abandoned
                } else {
                    DisconnectEffect::SlotVacated
                }
            }
            // Abandoned and Closed sessions hold no connections.
            GameState::Abandoned | GameState::Closed => DisconnectEffect::Unaffected,
        }
    }

    // -- Grace timer -------------------------------------------------------

    /// Stores the abort handle for a freshly spawned grace timer.
    ///
    /// Returns `false` (and leaves the existing handle in place) if a
    /// timer is already armed — the caller must abort its new task.
    pub fn arm_grace_timer(&mut self, handle: AbortHandle) -> bool {
        if self.grace_timer.is_some() {
            return false;
        }
        self.grace_timer = Some(handle);
        true
    }

    /// Aborts and forgets the grace timer. Safe to call when none is
    /// armed, and safe to call again after the timer already fired —
    /// aborting a finished task does nothing.
    pub fn cancel_grace_timer(&mut self) {
        if let Some(handle) = self.grace_timer.take() {
            handle.abort();
            tracing::debug!(game = %self.id, "grace timer cancelled");
        }
    }

    #[cfg(test)]
    pub(crate) fn grace_timer_armed(&self) -> bool {
        self.grace_timer.is_some()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn identity(id: u64, name: &str) -> Identity {
        Identity {
            user_id: UserId(id),
            display_name: name.into(),
        }
    }

    fn conn(id: u64) -> ConnRef {
        // The receiver is dropped; sessions never read back, and sends
        // to a closed channel are tolerated.
        let (tx, _rx) = mpsc::unbounded_channel();
        ConnRef::new(ConnectionId(id), tx)
    }

    /// A fresh Open game: user 1 ("alice") on connection 10.
    fn open_game() -> GameSession {
        GameSession::new(GameId(1), identity(1, "alice"), conn(10), 19)
    }

    /// A fresh Active game: alice (conn 10) vs bob (conn 20).
    fn active_game() -> GameSession {
        let mut game = open_game();
        game.join(identity(2, "bob"), conn(20)).unwrap();
        game
    }

    // =====================================================================
    // join()
    // =====================================================================

    #[test]
    fn test_join_second_user_activates_game() {
        let mut game = open_game();
        assert_eq!(game.state(), GameState::Open);

        game.join(identity(2, "bob"), conn(20)).unwrap();

        assert_eq!(game.state(), GameState::Active);
        assert_eq!(game.color_of(UserId(1)), Some(Color::Black));
        assert_eq!(game.color_of(UserId(2)), Some(Color::White));
    }

    #[test]
    fn test_join_own_game_rejected() {
        let mut game = open_game();

        let result = game.join(identity(1, "alice"), conn(11));

        assert!(matches!(result, Err(SessionError::SelfJoin)));
        assert_eq!(game.state(), GameState::Open, "game must stay Open");
    }

    #[test]
    fn test_join_active_game_rejected_as_full() {
        let mut game = active_game();

        let result = game.join(identity(3, "carol"), conn(30));

        assert!(matches!(result, Err(SessionError::Full(GameId(1)))));
    }

    // =====================================================================
    // play_move()
    // =====================================================================

    #[test]
    fn test_move_before_join_rejected() {
        let mut game = open_game();

        let result = game.play_move(UserId(1), 0, 0);

        assert!(matches!(result, Err(SessionError::NotInSession)));
    }

    #[test]
    fn test_move_by_non_member_rejected() {
        let mut game = active_game();

        let result = game.play_move(UserId(99), 0, 0);

        assert!(matches!(result, Err(SessionError::NotInSession)));
    }

    #[test]
    fn test_creator_moves_first_as_black() {
        let mut game = active_game();

        let placed = game.play_move(UserId(1), 3, 3).unwrap();

        assert_eq!(
            placed,
            PlacedStone {
                x: 3,
                y: 3,
                color: Color::Black
            }
        );
        assert_eq!(game.turn(), Color::White);
    }

    #[test]
    fn test_move_out_of_turn_rejected() {
        let mut game = active_game();

        // White (bob) tries to open the game.
        let result = game.play_move(UserId(2), 0, 0);
        assert!(matches!(result, Err(SessionError::NotYourTurn)));

        // Black moves, then tries to move again immediately.
        game.play_move(UserId(1), 0, 0).unwrap();
        let result = game.play_move(UserId(1), 1, 0);
        assert!(matches!(result, Err(SessionError::NotYourTurn)));
    }

    #[test]
    fn test_turn_alternates_with_move_parity() {
        let mut game = active_game();

        // After n successful moves, black is to move iff n is even.
        for n in 0..6 {
            let expected = if n % 2 == 0 { Color::Black } else { Color::White };
            assert_eq!(game.turn(), expected, "after {n} moves");
            let mover = if n % 2 == 0 { UserId(1) } else { UserId(2) };
            game.play_move(mover, n, 0).unwrap();
        }
    }

    #[test]
    fn test_rejected_move_does_not_flip_turn() {
        let mut game = active_game();

        let result = game.play_move(UserId(1), -1, 5);

        assert!(matches!(
            result,
            Err(SessionError::Move(crate::MoveError::OutOfBounds { .. }))
        ));
        assert_eq!(game.turn(), Color::Black);
        assert_eq!(game.board().stone_at(0, 5), None);
    }

    #[test]
    fn test_occupied_cell_propagates_from_board() {
        let mut game = active_game();
        game.play_move(UserId(1), 9, 9).unwrap();

        let result = game.play_move(UserId(2), 9, 9);

        assert!(matches!(
            result,
            Err(SessionError::Move(crate::MoveError::CellOccupied { .. }))
        ));
    }

    #[test]
    fn test_play_continues_while_opponent_is_dark() {
        // Losing one connection is bookkeeping, not a pause.
        let mut game = active_game();
        assert_eq!(game.on_disconnect(ConnectionId(20)), DisconnectEffect::SlotVacated);
        assert_eq!(game.state(), GameState::Active);

        game.play_move(UserId(1), 0, 0).unwrap();

        // And the dark side may still move once it's their turn — their
        // seat, not their socket, is what grants the move.
        game.play_move(UserId(2), 1, 0).unwrap();
    }

    // =====================================================================
    // on_disconnect()
    // =====================================================================

    #[test]
    fn test_creator_disconnect_closes_open_game() {
        let mut game = open_game();

        let effect = game.on_disconnect(ConnectionId(10));

        assert_eq!(effect, DisconnectEffect::Closed);
        assert_eq!(game.state(), GameState::Closed);
    }

    #[test]
    fn test_unrelated_disconnect_is_ignored() {
        let mut game = active_game();

        let effect = game.on_disconnect(ConnectionId(77));

        assert_eq!(effect, DisconnectEffect::Unaffected);
        assert_eq!(game.state(), GameState::Active);
    }

    #[test]
    fn test_second_disconnect_abandons_game() {
        let mut game = active_game();

        assert_eq!(game.on_disconnect(ConnectionId(20)), DisconnectEffect::SlotVacated);
        assert_eq!(game.on_disconnect(ConnectionId(10)), DisconnectEffect::Abandoned);
        assert_eq!(game.state(), GameState::Abandoned);
    }

    #[test]
    fn test_stale_connection_does_not_vacate_reclaimed_seat() {
        let mut game = active_game();
        // Bob drops and comes back on a new connection...
        game.on_disconnect(ConnectionId(20));
        game.rejoin(&identity(2, "bob"), conn(21)).unwrap();

        // ...then the old connection's close finally lands.
        let effect = game.on_disconnect(ConnectionId(20));

        assert_eq!(effect, DisconnectEffect::Unaffected);
        assert!(game.connection(Color::White).is_some());
    }

    // =====================================================================
    // rejoin()
    // =====================================================================

    #[test]
    fn test_rejoin_restores_seat_and_color() {
        let mut game = active_game();
        game.on_disconnect(ConnectionId(20));
        assert!(game.connection(Color::White).is_none());

        let color = game.rejoin(&identity(2, "bob"), conn(21)).unwrap();

        assert_eq!(color, Color::White);
        assert_eq!(
            game.connection(Color::White).map(|c| c.id()),
            Some(ConnectionId(21))
        );
    }

    #[test]
    fn test_rejoin_by_stranger_rejected() {
        let mut game = active_game();
        game.on_disconnect(ConnectionId(20));

        let result = game.rejoin(&identity(99, "mallory"), conn(90));

        assert!(matches!(result, Err(SessionError::NotAMember(GameId(1)))));
        assert!(game.connection(Color::White).is_none(), "seat must stay dark");
    }

    #[test]
    fn test_rejoin_revives_abandoned_game() {
        let mut game = active_game();
        game.on_disconnect(ConnectionId(10));
        game.on_disconnect(ConnectionId(20));
        assert_eq!(game.state(), GameState::Abandoned);

        let color = game.rejoin(&identity(1, "alice"), conn(11)).unwrap();

        assert_eq!(color, Color::Black);
        assert_eq!(game.state(), GameState::Active);
    }

    // =====================================================================
    // Grace timer handle
    // =====================================================================

    #[tokio::test]
    async fn test_arm_grace_timer_is_idempotent() {
        let mut game = active_game();
        game.on_disconnect(ConnectionId(10));
        game.on_disconnect(ConnectionId(20));

        let first = tokio::spawn(async {});
        let second = tokio::spawn(async {});

        assert!(game.arm_grace_timer(first.abort_handle()));
        assert!(!game.arm_grace_timer(second.abort_handle()), "second arm must be refused");
        assert!(game.grace_timer_armed());
    }

    #[tokio::test]
    async fn test_rejoin_cancels_armed_timer() {
        let mut game = active_game();
        game.on_disconnect(ConnectionId(10));
        game.on_disconnect(ConnectionId(20));

        let timer = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        });
        assert!(game.arm_grace_timer(timer.abort_handle()));

        game.rejoin(&identity(2, "bob"), conn(21)).unwrap();

        assert!(!game.grace_timer_armed());
        // The sleeping task was actually told to stop.
        assert!(timer.await.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_grace_timer_twice_is_safe() {
        let mut game = active_game();
        let timer = tokio::spawn(async {});
        game.arm_grace_timer(timer.abort_handle());

        game.cancel_grace_timer();
        game.cancel_grace_timer();
    }

    // =====================================================================
    // summary()
    // =====================================================================

    #[test]
    fn test_summary_open_game_has_one_player() {
        let game = open_game();
        let summary = game.summary();

        assert_eq!(summary.player1.as_deref(), Some("alice"));
        assert_eq!(summary.player2, None);
    }

    #[test]
    fn test_summary_shows_placeholder_for_dark_seat() {
        let mut game = active_game();
        game.on_disconnect(ConnectionId(20));

        let summary = game.summary();

        assert_eq!(summary.player1.as_deref(), Some("alice"));
        assert_eq!(summary.player2.as_deref(), Some(RECONNECTING));
    }
}
