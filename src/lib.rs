//! Skirmish State Library
//!
//! Client-side state reconciliation for Skirmish, a turn-based territory
//! conquest game.
//!
//! # Overview
//!
//! The server is authoritative and pushes partial, out-of-order packets.
//! This crate folds them into one consistent local state and derives the
//! views the UI renders from it:
//!
//! - **Session State** - Game/player identity (set once), connection status,
//!   lobby roster and host, server settings, the error notification slot and
//!   the single pending request/reply target.
//!
//! - **Board State** - Topology, territory ownership, per-player turn state,
//!   the attack in progress and the local reinforcement placement.
//!
//! - **Readiness Barrier** - Runs the board's init callback exactly once,
//!   after both the GUI and the first topology packet are ready.
//!
//! - **Sequence Decoder** - Decodes the `List(...)` and `Name(List(...), a, b)`
//!   text the server uses for attacks and dice rolls.
//!
//! # Design Principles
//!
//! 1. **No networking** - Packets come in already framed; responses go back
//!    as return values.
//!
//! 2. **Server is authoritative** - Nothing is validated, only mirrored.
//!    Malformed attack data resets the attack rather than erroring.
//!
//! 3. **State is passed, not global** - Handlers take the holders they touch.
//!
//! # Example
//!
//! ```rust
//! use skirmish_state::{ClientState, Packet};
//!
//! let mut state = ClientState::new();
//! state.session.set_current_player("alice");
//!
//! state
//!     .handle_frame(r#"{"type":"LOBBY_UPDATE","seq":[{"name":"alice","ordinal":0}],"host":0}"#)
//!     .unwrap();
//! assert!(state.session.is_host);
//!
//! state.handle_packet(Packet::StartGame);
//! assert!(state.session.is_in_game());
//! ```

pub mod sequence;
pub mod state;

// Re-export everything from state module at crate root
pub use sequence::{decode_list, decode_result_tuple, ResultTuple, SequenceError};
pub use state::*;
