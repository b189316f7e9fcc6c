//! Service configuration.

use serde::{Deserialize, Serialize};

use crate::RoomError;

// ---------------------------------------------------------------------------
// SantaConfig
// ---------------------------------------------------------------------------

/// Tunables for the room and membership layers.
///
/// Every field has a default, so a JSON document only needs the keys it
/// wants to change:
///
/// ```json
/// { "room_code_len": 6, "rng_seed": 42 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SantaConfig {
    /// Length of a room's shareable join code.
    pub room_code_len: usize,

    /// Length of an invitation code.
    pub invitation_code_len: usize,

    /// How many fresh codes to try when the store reports a collision.
    pub code_attempts: usize,

    /// Smallest roster a draw accepts. Values below 2 are clamped to 2.
    pub min_participants: usize,

    /// Longest room name accepted, in characters.
    pub max_room_name_len: usize,

    /// Longest wish list accepted, in characters.
    pub max_wish_list_len: usize,

    /// Seeds the shuffle and the code generator. `None` seeds from the OS.
    pub rng_seed: Option<u64>,
}

impl Default for SantaConfig {
    fn default() -> Self {
        Self {
            room_code_len: 8,
            invitation_code_len: 12,
            code_attempts: 5,
            min_participants: 2,
            max_room_name_len: 128,
            max_wish_list_len: 2000,
            rng_seed: None,
        }
    }
}

impl SantaConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, RoomError> {
        let mut config: Self = serde_json::from_str(json)
            .map_err(|e| RoomError::Invalid(format!("config: {e}")))?;
        config.validate()?;
        config.min_participants = config.effective_min_participants();
        Ok(config)
    }

    /// Rejects settings no room could work with.
    pub fn validate(&self) -> Result<(), RoomError> {
        if self.room_code_len == 0 {
            return Err(RoomError::Invalid("room_code_len must be > 0".into()));
        }
        if self.invitation_code_len == 0 {
            return Err(RoomError::Invalid(
                "invitation_code_len must be > 0".into(),
            ));
        }
        if self.code_attempts == 0 {
            return Err(RoomError::Invalid("code_attempts must be > 0".into()));
        }
        if self.max_room_name_len == 0 {
            return Err(RoomError::Invalid(
                "max_room_name_len must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// `min_participants`, raised to the hard floor of two.
    pub fn effective_min_participants(&self) -> usize {
        self.min_participants.max(santa_draw::MIN_PARTICIPANTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_santa_config_default() {
        let config = SantaConfig::default();
        assert_eq!(config.room_code_len, 8);
        assert_eq!(config.invitation_code_len, 12);
        assert_eq!(config.code_attempts, 5);
        assert_eq!(config.min_participants, 2);
        assert!(config.rng_seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_str_partial_document_keeps_defaults() {
        let config =
            SantaConfig::from_json_str(r#"{"room_code_len": 6, "rng_seed": 42}"#)
                .unwrap();
        assert_eq!(config.room_code_len, 6);
        assert_eq!(config.rng_seed, Some(42));
        assert_eq!(config.invitation_code_len, 12);
        assert_eq!(config.max_wish_list_len, 2000);
    }

    #[test]
    fn test_from_json_str_clamps_min_participants() {
        let config =
            SantaConfig::from_json_str(r#"{"min_participants": 1}"#).unwrap();
        assert_eq!(config.min_participants, 2);
    }

    #[test]
    fn test_from_json_str_zero_attempts_is_invalid() {
        let err =
            SantaConfig::from_json_str(r#"{"code_attempts": 0}"#).unwrap_err();
        assert!(matches!(err, RoomError::Invalid(_)));
    }

    #[test]
    fn test_from_json_str_malformed_is_invalid() {
        let err = SantaConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, RoomError::Invalid(msg) if msg.starts_with("config")));
    }

    #[test]
    fn test_validate_rejects_zero_length_codes() {
        let config = SantaConfig {
            invitation_code_len: 0,
            ..SantaConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
