//! Error types for the store layer.

/// A uniqueness rule the store enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Room codes are unique across all rooms.
    RoomCode,
    /// Invitation codes are unique across all invitations.
    InvitationCode,
    /// An identity appears at most once per room roster.
    Participant,
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoomCode => write!(f, "room code"),
            Self::InvitationCode => write!(f, "invitation code"),
            Self::Participant => write!(f, "participant"),
        }
    }
}

/// Errors a store implementation can report.
///
/// Stores stay dumb on purpose: they report what happened to the rows,
/// and the layers above decide what that means for the game.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An update or delete targeted a row that does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// An insert violated a uniqueness constraint.
    #[error("duplicate {0}")]
    Duplicate(Constraint),

    /// The backing store failed (connection lost, timeout, I/O error).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns `true` if this is a uniqueness violation on `constraint`.
    pub fn is_duplicate(&self, constraint: Constraint) -> bool {
        matches!(self, Self::Duplicate(c) if *c == constraint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_duplicate_matches_only_same_constraint() {
        let err = StoreError::Duplicate(Constraint::RoomCode);
        assert!(err.is_duplicate(Constraint::RoomCode));
        assert!(!err.is_duplicate(Constraint::InvitationCode));
        assert!(!StoreError::Unavailable("down".into())
            .is_duplicate(Constraint::RoomCode));
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            StoreError::Duplicate(Constraint::Participant).to_string(),
            "duplicate participant"
        );
        assert_eq!(StoreError::NotFound("room").to_string(), "room not found");
        assert!(
            StoreError::Unavailable("timeout".into())
                .to_string()
                .contains("timeout")
        );
    }
}
