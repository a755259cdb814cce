//! Inbound packets and the outbound ping response.
//!
//! The transport hands each frame over as JSON tagged by `type`. Every tag
//! maps to exactly one variant here and [`super::ClientState::handle_packet`]
//! matches them exhaustively.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::board::{ArmyEntry, Gameboard, PlayerStateEntry};
use super::session::RosterEntry;

/// Type tag the server expects on a ping response.
pub const PING_RESPONSE_TYPE: &str = "controllers.PingResponse";

/// Free-form body of a `REQUEST_REPLY`.
pub type ReplyPayload = serde_json::Map<String, serde_json::Value>;

/// Frame could not be turned into a [`Packet`].
#[derive(Debug, Error)]
pub enum PacketError {
    #[error("malformed packet: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Packet {
    LobbyUpdate(LobbyUpdate),
    RequestReply(ReplyPayload),
    BadPacket(ErrorPayload),
    StartGame,
    Ping,
    SendConfig(ConfigPayload),
    UpdatePlayerState(PlayerStateUpdate),
    SendGameboard(GameboardPayload),
    UpdateBoardState(BoardStatePayload),
}

impl Packet {
    /// Parse a raw frame.
    pub fn from_json(text: &str) -> Result<Self, PacketError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Wire tag of this packet.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LobbyUpdate(_) => "LOBBY_UPDATE",
            Self::RequestReply(_) => "REQUEST_REPLY",
            Self::BadPacket(_) => "BAD_PACKET",
            Self::StartGame => "START_GAME",
            Self::Ping => "PING",
            Self::SendConfig(_) => "SEND_CONFIG",
            Self::UpdatePlayerState(_) => "UPDATE_PLAYER_STATE",
            Self::SendGameboard(_) => "SEND_GAMEBOARD",
            Self::UpdateBoardState(_) => "UPDATE_BOARD_STATE",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LobbyUpdate {
    /// Full roster, replacing the current one
    pub seq: Option<Vec<RosterEntry>>,

    /// Roster index of the host, or [`super::session::NO_HOST`]
    pub host: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorPayload {
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigPayload {
    /// Settings snapshot as a JSON string
    pub config: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStateUpdate {
    pub seq: Option<Vec<PlayerStateEntry>>,

    /// Current turn index
    pub turn: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameboardPayload {
    pub gameboard: Option<Gameboard>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardStatePayload {
    pub armies: Option<Vec<ArmyEntry>>,
}

/// Reply to a keepalive `PING`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResponse {
    #[serde(rename = "_type")]
    pub response_type: String,
    pub game_id: String,
    pub player_id: String,
}

impl PingResponse {
    pub fn new(game_id: impl Into<String>, player_id: impl Into<String>) -> Self {
        Self {
            response_type: PING_RESPONSE_TYPE.to_string(),
            game_id: game_id.into(),
            player_id: player_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_lobby_update() {
        let packet = Packet::from_json(
            r#"{"type":"LOBBY_UPDATE","seq":[{"name":"alice","ordinal":0}],"host":0}"#,
        )
        .unwrap();

        assert_eq!(
            packet,
            Packet::LobbyUpdate(LobbyUpdate {
                seq: Some(vec![RosterEntry::new("alice", 0)]),
                host: Some(0),
            })
        );
        assert_eq!(packet.kind(), "LOBBY_UPDATE");
    }

    #[test]
    fn test_parse_unit_packets() {
        assert_eq!(
            Packet::from_json(r#"{"type":"START_GAME"}"#).unwrap(),
            Packet::StartGame
        );
        assert_eq!(
            Packet::from_json(r#"{"type":"PING","gameId":"ABCD"}"#).unwrap(),
            Packet::Ping
        );
    }

    #[test]
    fn test_parse_request_reply_keeps_body() {
        let packet =
            Packet::from_json(r#"{"type":"REQUEST_REPLY","response":"Accepted","message":"ok"}"#)
                .unwrap();
        let Packet::RequestReply(body) = packet else {
            panic!("expected REQUEST_REPLY");
        };
        assert_eq!(body.get("response"), Some(&json!("Accepted")));
        assert_eq!(body.get("message"), Some(&json!("ok")));
    }

    #[test]
    fn test_parse_player_state() {
        let packet = Packet::from_json(
            r#"{
                "type": "UPDATE_PLAYER_STATE",
                "turn": 4,
                "seq": [
                    {
                        "player": {"name": "bob", "ordinal": 1},
                        "turnState": {"state": "Attack", "attack": "List(3, 7, 2)"},
                        "armies": 12
                    },
                    {"player": {"name": "carol", "ordinal": 2}}
                ]
            }"#,
        )
        .unwrap();

        let Packet::UpdatePlayerState(update) = packet else {
            panic!("expected UPDATE_PLAYER_STATE");
        };
        assert_eq!(update.turn, Some(4));
        let seq = update.seq.unwrap();
        assert_eq!(seq[0].armies, 12);
        assert_eq!(
            seq[0].turn_state.as_ref().and_then(|t| t.attack.as_deref()),
            Some("List(3, 7, 2)")
        );
        assert_eq!(seq[1].turn_state, None);
    }

    #[test]
    fn test_parse_board_state() {
        let packet =
            Packet::from_json(r#"{"type":"UPDATE_BOARD_STATE","armies":[[0,[3,1]],[1,[5,0]]]}"#)
                .unwrap();
        assert_eq!(
            packet,
            Packet::UpdateBoardState(BoardStatePayload {
                armies: Some(vec![(0, (3, 1)), (1, (5, 0))]),
            })
        );
    }

    #[test]
    fn test_parse_gameboard() {
        let packet = Packet::from_json(
            r#"{"type":"SEND_GAMEBOARD","gameboard":{
                "nodes":[{"path":"M0 0","dto":{"castle":true}},{"path":"M1 1","dto":{}}],
                "regions":[[0,1]],
                "waterConnections":[[0,1]],
                "size":[640,480]
            }}"#,
        )
        .unwrap();
        let Packet::SendGameboard(GameboardPayload {
            gameboard: Some(board),
        }) = packet
        else {
            panic!("expected SEND_GAMEBOARD");
        };
        assert_eq!(board.nodes.len(), 2);
        assert!(board.nodes[0].has_castle());
        assert_eq!(board.water_connections, vec![(0, 1)]);
        assert_eq!(board.size, [640.0, 480.0]);
    }

    #[test]
    fn test_unknown_type_is_error() {
        assert!(Packet::from_json(r#"{"type":"CHAT","text":"hi"}"#).is_err());
        assert!(Packet::from_json("not json").is_err());
    }

    #[test]
    fn test_ping_response_wire_shape() {
        let response = PingResponse::new("ABCD", "p-1");
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "_type": "controllers.PingResponse",
                "gameId": "ABCD",
                "playerId": "p-1"
            })
        );
    }
}
