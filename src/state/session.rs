//! Root session state.
//!
//! Identity, connection status, the lobby roster, server settings, the error
//! notification slot and the pending request/reply correlation. Packet
//! handlers here are the only writers of this state, apart from the reply
//! target which the request-issuing collaborator registers.
//!
//! # Lifecycle
//!
//! ```text
//! ┌─────────┐   START_GAME   ┌─────────┐
//! │  Lobby  │───────────────▶│ InGame  │
//! └─────────┘                └─────────┘
//! ```
//!
//! There is no way back; a finished game is left by opening a new session.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::notification::Notification;
use super::packet::{ConfigPayload, ErrorPayload, LobbyUpdate, PingResponse, ReplyPayload};
use super::settings::{Settings, SettingsError};

/// Host index meaning "nobody is host".
pub const NO_HOST: i64 = -1;

const CONNECTION_CLOSED_MESSAGE: &str = "The connection with the server has been terminated";
const UNKNOWN_REPLY_MESSAGE: &str = "Unknown Request Reply";
const UNKNOWN_BAD_PACKET_MESSAGE: &str = "Unknown Bad Packet";

/// Callback waiting on the next `REQUEST_REPLY`.
pub type ResponseTarget = Box<dyn FnOnce(ReplyPayload)>;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Lobby,
    InGame,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lobby => "lobby",
            Self::InGame => "in_game",
        }
    }
}

/// A player as listed in the lobby.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub name: String,

    /// Fixed seat/color index
    pub ordinal: usize,
}

impl RosterEntry {
    pub fn new(name: impl Into<String>, ordinal: usize) -> Self {
        Self {
            name: name.into(),
            ordinal,
        }
    }
}

/// Roster entry with its display color resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerView {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Default)]
pub struct SessionState {
    game_id: Option<String>,
    player_id: Option<String>,

    /// Name of the locally-controlled player
    current: Option<String>,

    pub is_host: bool,
    pub is_connected: bool,

    roster: Vec<RosterEntry>,

    /// Name of the lobby host, empty if none
    host: String,

    phase: SessionPhase,

    settings: Settings,
    settings_loaded: bool,

    notification: Notification,

    response_target: Option<ResponseTarget>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    // Identity

    /// Set the game id. Only the first non-empty value sticks.
    pub fn set_game_id(&mut self, game_id: impl Into<String>) -> bool {
        set_once(&mut self.game_id, game_id.into(), "game_id")
    }

    /// Set the player id. Only the first non-empty value sticks.
    pub fn set_player_id(&mut self, player_id: impl Into<String>) -> bool {
        set_once(&mut self.player_id, player_id.into(), "player_id")
    }

    /// Set the local player's name. Only the first non-empty value sticks.
    pub fn set_current_player(&mut self, name: impl Into<String>) -> bool {
        set_once(&mut self.current, name.into(), "current")
    }

    pub fn set_host_flag(&mut self, is_host: bool) {
        self.is_host = is_host;
    }

    pub fn game_id(&self) -> Option<&str> {
        self.game_id.as_deref()
    }

    pub fn player_id(&self) -> Option<&str> {
        self.player_id.as_deref()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    // Connection

    pub fn on_connection_opened(&mut self) {
        self.is_connected = true;
        tracing::info!("connection opened");
    }

    pub fn on_connection_closed(&mut self) {
        self.is_connected = false;
        tracing::warn!("connection closed");
        self.raise_error_notification(CONNECTION_CLOSED_MESSAGE, true);
    }

    pub fn on_connection_error(&mut self, detail: impl fmt::Display) {
        tracing::warn!(%detail, "connection error");
        self.raise_error_notification(format!("An error occurred: {}", detail), false);
    }

    // Lobby

    /// Apply a `LOBBY_UPDATE`.
    ///
    /// The roster is replaced wholesale. Defaulting `current` to the first
    /// roster entry only ever succeeds once since `current` is set-once, so
    /// running it on every update is harmless.
    pub fn on_lobby_update(&mut self, update: LobbyUpdate) {
        if let Some(seq) = update.seq {
            self.roster = seq;
        }

        if let Some(host) = update.host {
            self.host = self.resolve_host(host);
            tracing::debug!(host = %self.host, "lobby host resolved");
            if !self.host.is_empty() && self.current.as_deref() == Some(self.host.as_str()) {
                self.set_host_flag(true);
            }
        }

        if self.is_host && self.current.is_none() {
            if let Some(first) = self.roster.first() {
                self.current = Some(first.name.clone());
            }
        }
    }

    fn resolve_host(&self, index: i64) -> String {
        if index == NO_HOST {
            return String::new();
        }
        match usize::try_from(index).ok().and_then(|i| self.roster.get(i)) {
            Some(entry) => entry.name.clone(),
            None => {
                tracing::warn!(index, roster = self.roster.len(), "host index outside roster");
                String::new()
            }
        }
    }

    /// Append one player to the roster.
    pub fn add_roster_entry(&mut self, entry: RosterEntry) {
        self.roster.push(entry);
    }

    pub fn set_host(&mut self, name: impl Into<String>) {
        self.host = name.into();
    }

    pub fn host(&self) -> Option<&str> {
        if self.host.is_empty() {
            None
        } else {
            Some(&self.host)
        }
    }

    pub fn roster(&self) -> &[RosterEntry] {
        &self.roster
    }

    /// Position of the local player in the roster.
    pub fn player_index(&self) -> Option<usize> {
        let current = self.current.as_deref()?;
        self.roster.iter().position(|p| p.name == current)
    }

    /// Roster with colors resolved, in roster order.
    pub fn players(&self) -> Vec<PlayerView> {
        self.roster
            .iter()
            .map(|p| PlayerView {
                name: p.name.clone(),
                color: self.settings.color_for(p.ordinal),
            })
            .collect()
    }

    // Lifecycle

    pub fn on_game_start(&mut self) {
        if self.phase != SessionPhase::InGame {
            tracing::info!(game_id = ?self.game_id, "game started");
        }
        self.phase = SessionPhase::InGame;
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_in_game(&self) -> bool {
        self.phase == SessionPhase::InGame
    }

    // Requests

    /// Register the target for the next reply, replacing any previous one.
    pub fn start_response_wait(&mut self, target: ResponseTarget) {
        if self.response_target.is_some() {
            tracing::debug!("replacing pending response target");
        }
        self.response_target = Some(target);
    }

    pub fn stop_response_wait(&mut self) {
        self.response_target = None;
    }

    pub fn is_awaiting_response(&self) -> bool {
        self.response_target.is_some()
    }

    /// Deliver a `REQUEST_REPLY` to the pending target, or report it.
    pub fn on_request_reply(&mut self, payload: ReplyPayload) {
        match self.response_target.take() {
            Some(target) => target(payload),
            None => {
                let message = payload
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or(UNKNOWN_REPLY_MESSAGE)
                    .to_string();
                tracing::warn!(%message, "request reply with no pending request");
                self.raise_error_notification(message, false);
            }
        }
    }

    pub fn on_bad_packet(&mut self, payload: ErrorPayload) {
        let message = payload
            .message
            .unwrap_or_else(|| UNKNOWN_BAD_PACKET_MESSAGE.to_string());
        tracing::warn!(%message, "server rejected packet");
        self.raise_error_notification(message, false);
    }

    /// Answer a keepalive ping with our identity.
    pub fn on_ping_request(&self, reply: impl FnOnce(PingResponse)) {
        reply(PingResponse::new(
            self.game_id.clone().unwrap_or_default(),
            self.player_id.clone().unwrap_or_default(),
        ));
    }

    // Settings

    /// Load the settings snapshot. The first successful load wins.
    pub fn on_config_received(&mut self, payload: ConfigPayload) -> Result<(), SettingsError> {
        let Some(config) = payload.config else {
            return Ok(());
        };
        if self.settings_loaded {
            tracing::debug!("settings already loaded, ignoring config");
            return Ok(());
        }
        self.settings = Settings::from_json(&config)?;
        self.settings_loaded = true;
        tracing::info!(colors = self.settings.settings.colors.len(), "settings loaded");
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn has_settings(&self) -> bool {
        self.settings_loaded
    }

    // Notifications

    pub fn raise_error_notification(&mut self, message: impl Into<String>, hold: bool) {
        let timeout = self.settings.error_message_timeout();
        self.notification.raise(message, hold, timeout);
    }

    pub fn clear_error_notification(&mut self) {
        self.notification.clear();
    }

    pub fn notification(&self) -> &Notification {
        &self.notification
    }

    pub fn notification_mut(&mut self) -> &mut Notification {
        &mut self.notification
    }
}

fn set_once(slot: &mut Option<String>, value: String, field: &'static str) -> bool {
    if slot.is_some() {
        tracing::debug!(field, "ignoring second write to set-once field");
        return false;
    }
    if value.is_empty() {
        return false;
    }
    *slot = Some(value);
    true
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("game_id", &self.game_id)
            .field("player_id", &self.player_id)
            .field("current", &self.current)
            .field("is_host", &self.is_host)
            .field("is_connected", &self.is_connected)
            .field("roster", &self.roster)
            .field("host", &self.host)
            .field("phase", &self.phase)
            .field("settings", &self.settings)
            .field("notification", &self.notification)
            .field("awaiting_response", &self.response_target.is_some())
            .finish()
    }
}
