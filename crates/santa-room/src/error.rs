//! Error types for the room layer.
//!
//! [`RoomError`] is what the Messaging Gateway sees. Lower-layer errors
//! convert into it with `?`.

use santa_draw::DrawError;
use santa_model::{Identity, RoomId};
use santa_store::StoreError;

/// What a [`RoomError::NotFound`] was looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    Room(RoomId),
    /// No room has the presented join code.
    RoomCode,
    /// No invitation has the presented code.
    Invitation,
    Participant(RoomId, Identity),
    /// A store row vanished between two calls.
    Row(&'static str),
}

impl std::fmt::Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Room(id) => write!(f, "room {id}"),
            Self::RoomCode => write!(f, "room code"),
            Self::Invitation => write!(f, "invitation code"),
            Self::Participant(room, who) => {
                write!(f, "participant {who} in room {room}")
            }
            Self::Row(what) => write!(f, "{what}"),
        }
    }
}

/// Errors that can occur during room and membership operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room, invitation, or participant does not exist.
    #[error("{0} not found")]
    NotFound(Missing),

    /// The actor lacks the role this operation needs.
    #[error("{identity} may not {action}")]
    NotAuthorized {
        identity: Identity,
        action: &'static str,
    },

    /// The room has been drawn; membership and draws are closed.
    #[error("room {0} has already been drawn")]
    AlreadyDrawn(RoomId),

    /// Too few participants to draw.
    #[error("a draw needs at least {required} participants, found {found}")]
    InsufficientParticipants { required: usize, found: usize },

    /// The invitation was used before.
    #[error("invitation already accepted")]
    AlreadyAccepted,

    /// The identity is already on the room's roster.
    #[error("{0} is already a participant of room {1}")]
    AlreadyParticipant(Identity, RoomId),

    /// The invitation is bound to a different identity.
    #[error("invitation was issued to someone else")]
    InvitationMismatch,

    /// Lost a race with a concurrent writer. The caller may retry.
    #[error("conflicting concurrent update: {0}")]
    Conflict(String),

    /// The persistence store failed. Nothing was left half-written.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Input rejected before touching the store.
    #[error("invalid input: {0}")]
    Invalid(String),
}

impl RoomError {
    /// Returns `true` if repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    pub(crate) fn not_authorized(identity: Identity, action: &'static str) -> Self {
        Self::NotAuthorized { identity, action }
    }
}

impl From<StoreError> for RoomError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => Self::NotFound(Missing::Row(what)),
            StoreError::Duplicate(c) => Self::Conflict(format!("duplicate {c}")),
            StoreError::Unavailable(msg) => Self::StoreUnavailable(msg),
        }
    }
}

impl From<DrawError> for RoomError {
    fn from(e: DrawError) -> Self {
        match e {
            DrawError::NotFound(id) => Self::NotFound(Missing::Room(id)),
            DrawError::AlreadyDrawn(id) => Self::AlreadyDrawn(id),
            DrawError::InsufficientParticipants { required, found } => {
                Self::InsufficientParticipants { required, found }
            }
            DrawError::DuplicateParticipant(who) => {
                Self::Invalid(format!("{who} listed twice in roster"))
            }
            DrawError::Conflict(id) => {
                Self::Conflict(format!("draw of room {id}"))
            }
            DrawError::Store(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use santa_store::Constraint;

    use super::*;

    #[test]
    fn test_is_retryable_only_conflict() {
        assert!(RoomError::Conflict("x".into()).is_retryable());
        assert!(!RoomError::AlreadyDrawn(RoomId(1)).is_retryable());
        assert!(!RoomError::StoreUnavailable("down".into()).is_retryable());
        assert!(!RoomError::AlreadyAccepted.is_retryable());
    }

    #[test]
    fn test_from_store_unavailable() {
        let err: RoomError = StoreError::Unavailable("timeout".into()).into();
        assert!(matches!(err, RoomError::StoreUnavailable(ref m) if m == "timeout"));
    }

    #[test]
    fn test_from_store_duplicate_is_conflict() {
        let err: RoomError = StoreError::Duplicate(Constraint::RoomCode).into();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("room code"));
    }

    #[test]
    fn test_from_draw_error_keeps_meaning() {
        let err: RoomError = DrawError::AlreadyDrawn(RoomId(3)).into();
        assert!(matches!(err, RoomError::AlreadyDrawn(RoomId(3))));

        let err: RoomError =
            DrawError::InsufficientParticipants { required: 2, found: 1 }.into();
        assert!(matches!(
            err,
            RoomError::InsufficientParticipants { required: 2, found: 1 }
        ));

        let err: RoomError =
            DrawError::Store(StoreError::Unavailable("gone".into())).into();
        assert!(matches!(err, RoomError::StoreUnavailable(_)));
    }

    #[test]
    fn test_not_found_display() {
        let err = RoomError::NotFound(Missing::Room(RoomId(9)));
        assert_eq!(err.to_string(), "room R-9 not found");
        let err = RoomError::not_authorized(Identity(5), "draw this room");
        assert_eq!(err.to_string(), "U-5 may not draw this room");
    }
}
