//! Configuration for the session engine
//!
//! Two layers exist: [`SessionConfiguration`] is the player-facing game
//! configuration the master edits from the lobby, and [`EngineSettings`] are
//! host-level knobs (timer durations, hand size) loaded once at startup.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

const DEFAULT_POINTS_TO_WIN: u32 = 3;

/// Player-facing game configuration, editable by the master in the lobby
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfiguration {
    /// Round wins needed to end the game
    pub points_to_win: u32,
    /// Whether letter-card penalties are distributed automatically
    pub auto_penalty_distribution: bool,
}

impl Default for SessionConfiguration {
    fn default() -> Self {
        Self {
            points_to_win: DEFAULT_POINTS_TO_WIN,
            auto_penalty_distribution: true,
        }
    }
}

/// Raw configuration update as submitted by a client
///
/// Clients are not trusted to send well-typed values: `pointsToWin` may arrive
/// as a number or a string, and either field may be missing entirely.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigurationUpdate {
    pub points_to_win: Option<serde_json::Value>,
    pub auto_penalty_distribution: Option<bool>,
}

impl SessionConfiguration {
    /// Sanitize a client-submitted update into a valid configuration
    ///
    /// `pointsToWin` is coerced to an integer, falling back to the default on
    /// parse failure or zero and clamped to at least 1.
    /// `autoPenaltyDistribution` is true unless explicitly false.
    pub fn from_update(update: &ConfigurationUpdate) -> Self {
        let points_to_win = match update.points_to_win.as_ref().and_then(parse_points) {
            None | Some(0) => DEFAULT_POINTS_TO_WIN,
            Some(n) => n.max(1) as u32,
        };

        Self {
            points_to_win,
            auto_penalty_distribution: update.auto_penalty_distribution != Some(false),
        }
    }
}

fn parse_points(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Host-level engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Cards dealt to each player at round setup
    pub hand_size: usize,
    /// Regular turn duration in milliseconds
    pub turn_duration_ms: u64,
    /// Turn duration when the current player holds exactly one card
    pub last_card_turn_duration_ms: u64,
    /// Pause between a round win and the next round setup
    pub round_pause_ms: u64,
    /// Time without any online player before the session is destroyed
    pub deletion_threshold_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            hand_size: 8,
            turn_duration_ms: 20_000,
            last_card_turn_duration_ms: 10_000,
            round_pause_ms: 2_000,
            deletion_threshold_ms: 1000 * 60 * 20, // 20 minutes
        }
    }
}

impl EngineSettings {
    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SessionError> {
        let content = fs::read_to_string(path).map_err(|e| SessionError::Configuration {
            message: format!("Failed to read settings file: {}", e),
            field: "settings_file".to_string(),
        })?;

        let settings: EngineSettings =
            toml::from_str(&content).map_err(|e| SessionError::Configuration {
                message: format!("Failed to parse settings file: {}", e),
                field: "settings_format".to_string(),
            })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SessionError> {
        let content = toml::to_string_pretty(self).map_err(|e| SessionError::Configuration {
            message: format!("Failed to serialize settings: {}", e),
            field: "settings_serialization".to_string(),
        })?;

        fs::write(path, content).map_err(|e| SessionError::Configuration {
            message: format!("Failed to write settings file: {}", e),
            field: "settings_write".to_string(),
        })?;

        Ok(())
    }

    /// Validate settings values
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.hand_size == 0 {
            return Err(SessionError::Configuration {
                message: "Hand size must be greater than 0".to_string(),
                field: "hand_size".to_string(),
            });
        }

        if self.turn_duration_ms == 0 || self.last_card_turn_duration_ms == 0 {
            return Err(SessionError::Configuration {
                message: "Turn durations must be greater than 0".to_string(),
                field: "turn_duration_ms".to_string(),
            });
        }

        if self.last_card_turn_duration_ms > self.turn_duration_ms {
            return Err(SessionError::Configuration {
                message: "Last-card turn duration must not exceed the regular turn duration"
                    .to_string(),
                field: "last_card_turn_duration_ms".to_string(),
            });
        }

        if self.deletion_threshold_ms < 60_000 {
            return Err(SessionError::Configuration {
                message: "Deletion threshold must be at least 60 seconds".to_string(),
                field: "deletion_threshold_ms".to_string(),
            });
        }

        Ok(())
    }

    /// Create a development configuration with fast timers
    pub fn development() -> Self {
        Self {
            hand_size: 8,
            turn_duration_ms: 5_000,
            last_card_turn_duration_ms: 3_000,
            round_pause_ms: 500,
            deletion_threshold_ms: 60_000,
        }
    }
}
