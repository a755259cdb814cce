//! Global settings broadcast by the server.
//!
//! Arrives once near session start as a JSON string inside `SEND_CONFIG`.
//! Field names follow the server's camelCase config; anything missing falls
//! back to its default.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Used when the server has not supplied a positive error timeout.
pub const DEFAULT_ERROR_MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Config snapshot could not be parsed.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Full settings snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub settings: ClientSettings,
    pub gameplay: GameplaySettings,
}

/// Display and input constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientSettings {
    /// Player colors as hex without `#`, indexed by ordinal
    pub colors: Vec<String>,

    /// Territory fill colors, indexed by owner ordinal
    pub territory_colors: Vec<String>,

    pub name_regex: String,
    pub player_id_length: usize,
    pub min_name_length: usize,
    pub max_name_length: usize,
    pub lobby_code_regex: String,
    pub lobby_code_length: usize,

    /// Milliseconds before a transient error notification is dismissed
    pub error_message_timeout: u64,
}

/// Gameplay bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameplaySettings {
    pub min_players: usize,
    pub max_players: usize,
}

impl Settings {
    /// Parse the config string carried by `SEND_CONFIG`.
    pub fn from_json(config: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(config)?)
    }

    /// Display color for a player ordinal, e.g. `#ff0000`.
    pub fn color_for(&self, ordinal: usize) -> Option<String> {
        self.settings.colors.get(ordinal).map(|hex| format!("#{}", hex))
    }

    /// Territory fill color for an owner ordinal.
    pub fn territory_color_for(&self, ordinal: usize) -> Option<String> {
        self.settings
            .territory_colors
            .get(ordinal)
            .map(|hex| format!("#{}", hex))
    }

    pub fn error_message_timeout(&self) -> Duration {
        match self.settings.error_message_timeout {
            0 => DEFAULT_ERROR_MESSAGE_TIMEOUT,
            ms => Duration::from_millis(ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CONFIG: &str = r#"{
        "settings": {
            "colors": ["d94c4c", "4c7bd9", "4cd96b"],
            "territoryColors": ["f2b6b6"],
            "nameRegex": "^[a-zA-Z0-9]+$",
            "playerIdLength": 32,
            "minNameLength": 2,
            "maxNameLength": 16,
            "errorMessageTimeout": 3000
        },
        "gameplay": { "minPlayers": 3, "maxPlayers": 6 }
    }"#;

    #[test]
    fn test_parse_config() {
        let settings = Settings::from_json(CONFIG).unwrap();

        assert_eq!(settings.settings.colors.len(), 3);
        assert_eq!(settings.settings.min_name_length, 2);
        assert_eq!(settings.settings.max_name_length, 16);
        assert_eq!(settings.settings.lobby_code_length, 0); // absent
        assert_eq!(
            settings.gameplay,
            GameplaySettings {
                min_players: 3,
                max_players: 6
            }
        );
        assert_eq!(settings.error_message_timeout(), Duration::from_millis(3000));
    }

    #[test]
    fn test_color_resolution() {
        let settings = Settings::from_json(CONFIG).unwrap();

        assert_eq!(settings.color_for(1).as_deref(), Some("#4c7bd9"));
        assert_eq!(settings.color_for(7), None);
        assert_eq!(settings.territory_color_for(0).as_deref(), Some("#f2b6b6"));
        assert_eq!(settings.territory_color_for(1), None);
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(
            settings.error_message_timeout(),
            DEFAULT_ERROR_MESSAGE_TIMEOUT
        );
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            Settings::from_json("not json"),
            Err(SettingsError::Json(_))
        ));
    }
}
