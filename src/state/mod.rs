//! Client-side game state.
//!
//! - `session` - identity, connection, lobby roster, settings, notifications
//! - `board` - topology, ownership, turn/attack state, local placement
//! - `barrier` - one-shot latch gating board initialization
//! - `packet` - inbound packet sum type and ping response
//! - `settings` - server config snapshot
//! - `notification` - single error notification slot
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │                             ClientState                               │
//! │                                                                       │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────┐    │
//! │  │   SessionState   │  │    BoardState    │  │ ReadinessBarrier │    │
//! │  │                  │  │                  │  │                  │    │
//! │  │ ids, roster,     │  │ topology,        │  │ network-ready ◀──┼──┐ │
//! │  │ host, settings,  │  │ armies,          │──┼──────────────────┼──┘ │
//! │  │ notification,    │  │ player states,   │  │ gui-ready        │    │
//! │  │ reply target     │  │ attack,placement │  │ (init callback)  │    │
//! │  └──────────────────┘  └──────────────────┘  └──────────────────┘    │
//! └───────────────────────────────────────────────────────────────────────┘
//!          ▲                       ▲
//!          └──────── handle_packet(Packet) ◀──── transport
//! ```
//!
//! Views are computed on demand from the two holders and never stored.

pub mod barrier;
pub mod board;
pub mod notification;
pub mod packet;
pub mod session;
pub mod settings;

pub use barrier::{InitCallback, ReadinessBarrier, ReadySource};
pub use board::{
    ArmyEntry, AttackState, BoardState, BoardTopology, Gameboard, NodeData, Placement,
    PlayerStateEntry, PlayerStateView, TerritoryView, TurnState,
};
pub use notification::Notification;
pub use packet::{
    BoardStatePayload, ConfigPayload, ErrorPayload, GameboardPayload, LobbyUpdate, Packet,
    PacketError, PingResponse, PlayerStateUpdate, ReplyPayload, PING_RESPONSE_TYPE,
};
pub use session::{
    PlayerView, ResponseTarget, RosterEntry, SessionPhase, SessionState, NO_HOST,
};
pub use settings::{
    ClientSettings, GameplaySettings, Settings, SettingsError, DEFAULT_ERROR_MESSAGE_TIMEOUT,
};

/// Combined client state.
///
/// Owns both state holders and the readiness barrier, and routes packets to
/// their handlers. The holders can also be driven directly.
#[derive(Debug, Default)]
pub struct ClientState {
    pub session: SessionState,
    pub board: BoardState,
    pub barrier: ReadinessBarrier,
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one inbound packet.
    ///
    /// Returns the response to send back when the packet was a `PING`.
    pub fn handle_packet(&mut self, packet: Packet) -> Option<PingResponse> {
        tracing::trace!(kind = packet.kind(), "handling packet");

        match packet {
            Packet::LobbyUpdate(update) => self.session.on_lobby_update(update),
            Packet::RequestReply(payload) => self.session.on_request_reply(payload),
            Packet::BadPacket(payload) => self.session.on_bad_packet(payload),
            Packet::StartGame => self.session.on_game_start(),
            Packet::Ping => {
                let mut response = None;
                self.session.on_ping_request(|r| response = Some(r));
                return response;
            }
            Packet::SendConfig(payload) => {
                if let Err(err) = self.session.on_config_received(payload) {
                    tracing::warn!(%err, "ignoring unparseable config");
                }
            }
            Packet::UpdatePlayerState(update) => {
                let local_index = self.session.player_index();
                self.board.on_player_state_received(update, local_index);
            }
            Packet::SendGameboard(payload) => {
                self.board
                    .on_board_topology_received(payload, &mut self.barrier);
            }
            Packet::UpdateBoardState(payload) => self.board.on_board_ownership_received(payload),
        }
        None
    }

    /// Parse and apply a raw JSON frame.
    pub fn handle_frame(&mut self, text: &str) -> Result<Option<PingResponse>, PacketError> {
        let packet = Packet::from_json(text)?;
        Ok(self.handle_packet(packet))
    }

    /// Report the board component as mounted, handing over its init callback.
    pub fn signal_gui_ready(&mut self, on_ready: InitCallback) -> bool {
        self.barrier.signal_ready(ReadySource::Gui, Some(on_ready))
    }

    /// Reinforce `territory` if the local player owns it.
    pub fn add_troops_if_owned(&mut self, territory: usize) -> bool {
        let local_index = self.session.player_index();
        self.board.add_troops_if_owned(territory, local_index)
    }

    pub fn players(&self) -> Vec<PlayerView> {
        self.session.players()
    }

    pub fn player_states(&self) -> Vec<Option<PlayerStateView>> {
        self.board.player_states(self.session.settings())
    }

    pub fn board_ownership_view(&self) -> Vec<TerritoryView> {
        self.board.board_ownership_view()
    }

    pub fn winning_player_index(&self) -> Option<usize> {
        self.board.winning_player_index()
    }
}
