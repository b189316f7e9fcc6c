//! Entity records kept by the persistence store.
//!
//! Each entity comes in two shapes: the stored record (with the id the
//! store assigned) and a `New*` insert payload without one. The room owns
//! everything else: participants, invitations, and assignments are all
//! scoped by `room_id` and never shared across rooms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    AssignmentId, Identity, InvitationId, ParticipantId, RoomId, RoomState,
};

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// One gift-exchange game.
///
/// Invariant kept by the core: `is_drawn` implies `draw_date.is_some()`
/// and a full assignment cycle exists for the room; `!is_drawn` implies no
/// assignments exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub creator: Identity,
    /// Shareable join code, unique across rooms.
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub draw_date: Option<DateTime<Utc>>,
    pub is_drawn: bool,
}

impl Room {
    /// The lifecycle state implied by `is_drawn`.
    pub fn state(&self) -> RoomState {
        RoomState::from(self.is_drawn)
    }

    /// Returns `true` if `identity` created this room.
    pub fn is_creator(&self, identity: Identity) -> bool {
        self.creator == identity
    }
}

/// Insert payload for a room. New rooms always start `Open`.
#[derive(Debug, Clone)]
pub struct NewRoom {
    pub name: String,
    pub creator: Identity,
    pub code: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// A person enrolled in a room. `(room_id, identity)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub room_id: RoomId,
    pub identity: Identity,
    pub display_name: String,
    pub wish_list: Option<String>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewParticipant {
    pub room_id: RoomId,
    pub identity: Identity,
    pub display_name: String,
    pub joined_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Invitation
// ---------------------------------------------------------------------------

/// A single-use invitation bound to one invitee.
///
/// `is_accepted` flips `false → true` exactly once and is never reopened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: InvitationId,
    pub room_id: RoomId,
    pub invited: Identity,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub is_accepted: bool,
}

impl Invitation {
    /// Returns `true` if this invitation was issued to `identity`.
    pub fn is_for(&self, identity: Identity) -> bool {
        self.invited == identity
    }
}

#[derive(Debug, Clone)]
pub struct NewInvitation {
    pub room_id: RoomId,
    pub invited: Identity,
    pub code: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

/// One edge of a room's gift cycle: `giver` buys a present for
/// `recipient`. Immutable once written; a redraw replaces the whole set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub room_id: RoomId,
    pub giver: Identity,
    pub recipient: Identity,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssignment {
    pub room_id: RoomId,
    pub giver: Identity,
    pub recipient: Identity,
    pub created_at: DateTime<Utc>,
}
