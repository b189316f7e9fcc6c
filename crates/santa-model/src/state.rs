//! The room lifecycle state machine.

use serde::{Deserialize, Serialize};

/// The lifecycle state of a room.
///
/// There are exactly two states and one transition:
///
/// ```text
/// Open ──(draw)──→ Drawn
/// ```
///
/// - **Open**: accepting participants; no assignments exist.
/// - **Drawn**: terminal. The assignment cycle is committed and the
///   roster is frozen. No further joins, removals, or re-draws through
///   the normal path.
///
/// The store keeps this as the `is_drawn` flag on [`Room`](crate::Room);
/// `Room::state()` converts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    Open,
    Drawn,
}

impl RoomState {
    /// Returns `true` if the room still admits participants.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns `true` once the draw has been committed.
    pub fn is_drawn(&self) -> bool {
        matches!(self, Self::Drawn)
    }

    /// Returns the state a successful draw moves to, or `None` if the
    /// room is already terminal.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Open => Some(Self::Drawn),
            Self::Drawn => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl From<bool> for RoomState {
    fn from(is_drawn: bool) -> Self {
        if is_drawn { Self::Drawn } else { Self::Open }
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::Drawn => write!(f, "Drawn"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_state_next_open_becomes_drawn() {
        assert_eq!(RoomState::Open.next(), Some(RoomState::Drawn));
        assert_eq!(RoomState::Drawn.next(), None);
    }

    #[test]
    fn test_room_state_can_transition_to() {
        assert!(RoomState::Open.can_transition_to(RoomState::Drawn));
        assert!(!RoomState::Drawn.can_transition_to(RoomState::Open));
        assert!(!RoomState::Drawn.can_transition_to(RoomState::Drawn));
        assert!(!RoomState::Open.can_transition_to(RoomState::Open));
    }

    #[test]
    fn test_room_state_is_joinable() {
        assert!(RoomState::Open.is_joinable());
        assert!(!RoomState::Drawn.is_joinable());
    }

    #[test]
    fn test_room_state_from_flag() {
        assert_eq!(RoomState::from(false), RoomState::Open);
        assert_eq!(RoomState::from(true), RoomState::Drawn);
        assert!(RoomState::from(true).is_drawn());
    }

    #[test]
    fn test_room_state_display() {
        assert_eq!(RoomState::Open.to_string(), "Open");
        assert_eq!(RoomState::Drawn.to_string(), "Drawn");
    }
}
