//! The per-entity store traits.
//!
//! Each trait is the contract for one table. The core only ever names
//! these traits, never a concrete store, so swapping the in-memory store
//! for a SQL one touches no game logic.
//!
//! All methods are `async fn`. Timeouts and cancellation belong to the
//! caller; a store reports a failed backend as
//! [`StoreError::Unavailable`].

use chrono::{DateTime, Utc};
use santa_model::{
    Assignment, Identity, Invitation, InvitationId, NewAssignment,
    NewInvitation, NewParticipant, NewRoom, Participant, Room, RoomId,
};

use crate::StoreError;

/// Storage for [`Room`] records.
pub trait RoomStore: Send + Sync + 'static {
    /// Inserts a new, undrawn room and returns it with its assigned id.
    ///
    /// # Errors
    /// [`StoreError::Duplicate`] with
    /// [`Constraint::RoomCode`](crate::Constraint::RoomCode) if the code is
    /// taken. Callers treat that as retryable with a fresh code.
    async fn create_room(&self, room: NewRoom) -> Result<Room, StoreError>;

    async fn get_room(&self, id: RoomId) -> Result<Option<Room>, StoreError>;

    async fn get_room_by_code(
        &self,
        code: &str,
    ) -> Result<Option<Room>, StoreError>;

    /// Changes a room's display name.
    async fn rename_room(
        &self,
        id: RoomId,
        name: String,
    ) -> Result<(), StoreError>;

    /// Deletes a room and everything scoped to it.
    ///
    /// Only used to compensate a room creation that failed half way.
    async fn delete_room(&self, id: RoomId) -> Result<(), StoreError>;

    /// Conditionally flips `is_drawn` from `false` to `true` and stamps
    /// `draw_date`.
    ///
    /// Returns `Ok(true)` if this call made the flip, `Ok(false)` if the
    /// room was already drawn.
    async fn mark_drawn(
        &self,
        id: RoomId,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Unconditionally puts a room back to undrawn and clears
    /// `draw_date`.
    ///
    /// Only used to compensate a draw whose assignment writes failed
    /// after [`mark_drawn`](Self::mark_drawn) succeeded.
    async fn reset_drawn(&self, id: RoomId) -> Result<(), StoreError>;

    /// Rooms created by `identity`, newest first.
    async fn rooms_by_creator(
        &self,
        identity: Identity,
    ) -> Result<Vec<Room>, StoreError>;

    /// Rooms where `identity` is on the roster, newest first.
    async fn rooms_by_participant(
        &self,
        identity: Identity,
    ) -> Result<Vec<Room>, StoreError>;
}

/// Storage for [`Participant`] records.
pub trait ParticipantStore: Send + Sync + 'static {
    /// # Errors
    /// [`StoreError::Duplicate`] with
    /// [`Constraint::Participant`](crate::Constraint::Participant) if the
    /// identity is already on the room's roster.
    async fn add_participant(
        &self,
        participant: NewParticipant,
    ) -> Result<Participant, StoreError>;

    async fn get_participant(
        &self,
        room_id: RoomId,
        identity: Identity,
    ) -> Result<Option<Participant>, StoreError>;

    /// The room's roster in join order.
    async fn list_participants(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<Participant>, StoreError>;

    /// Overwrites the mutable fields (`display_name`, `wish_list`) of the
    /// row matching `participant.room_id` and `participant.identity`.
    async fn update_participant(
        &self,
        participant: &Participant,
    ) -> Result<(), StoreError>;

    /// Returns `Ok(true)` if a row was removed.
    async fn remove_participant(
        &self,
        room_id: RoomId,
        identity: Identity,
    ) -> Result<bool, StoreError>;

    async fn is_participant(
        &self,
        room_id: RoomId,
        identity: Identity,
    ) -> Result<bool, StoreError> {
        Ok(self.get_participant(room_id, identity).await?.is_some())
    }
}

/// Storage for [`Invitation`] records.
pub trait InvitationStore: Send + Sync + 'static {
    /// # Errors
    /// [`StoreError::Duplicate`] with
    /// [`Constraint::InvitationCode`](crate::Constraint::InvitationCode)
    /// if the code is taken.
    async fn create_invitation(
        &self,
        invitation: NewInvitation,
    ) -> Result<Invitation, StoreError>;

    async fn get_invitation_by_code(
        &self,
        code: &str,
    ) -> Result<Option<Invitation>, StoreError>;

    /// Invitations for a room, newest first.
    async fn list_invitations(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<Invitation>, StoreError>;

    /// Conditionally flips `is_accepted` from `false` to `true`.
    ///
    /// Returns `Ok(true)` if this call made the flip, `Ok(false)` if the
    /// invitation was already accepted.
    async fn mark_accepted(&self, id: InvitationId) -> Result<bool, StoreError>;
}

/// Storage for [`Assignment`] records.
pub trait AssignmentStore: Send + Sync + 'static {
    /// Inserts a batch of assignments. Either all rows land or none do.
    async fn insert_assignments(
        &self,
        assignments: Vec<NewAssignment>,
    ) -> Result<Vec<Assignment>, StoreError>;

    /// Deletes every assignment of the room, returning how many went.
    async fn delete_assignments(
        &self,
        room_id: RoomId,
    ) -> Result<usize, StoreError>;

    /// The assignment where `giver` is the giver, if any.
    async fn get_assignment(
        &self,
        room_id: RoomId,
        giver: Identity,
    ) -> Result<Option<Assignment>, StoreError>;

    async fn list_assignments(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<Assignment>, StoreError>;
}

/// The full capability set the core needs.
///
/// Blanket-implemented: any type that implements the four entity traits
/// is a `Store`.
pub trait Store: RoomStore + ParticipantStore + InvitationStore + AssignmentStore {}

impl<T> Store for T where
    T: RoomStore + ParticipantStore + InvitationStore + AssignmentStore
{
}
