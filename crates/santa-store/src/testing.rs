//! Fault injection for tests.
//!
//! [`FaultyStore`] wraps a [`MemoryStore`] and can be told to fail any
//! single operation with [`StoreError::Unavailable`], or to yield to the
//! scheduler before every call so that concurrent tasks interleave at
//! each store round trip the way they would against a real database.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use santa_model::{
    Assignment, Identity, Invitation, InvitationId, NewAssignment,
    NewInvitation, NewParticipant, NewRoom, Participant, Room, RoomId,
};

use crate::{
    AssignmentStore, InvitationStore, MemoryStore, ParticipantStore,
    RoomStore, StoreError,
};

/// A store operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    CreateRoom,
    GetRoom,
    MarkDrawn,
    ResetDrawn,
    DeleteRoom,
    AddParticipant,
    ListParticipants,
    CreateInvitation,
    MarkAccepted,
    InsertAssignments,
    DeleteAssignments,
}

/// A [`MemoryStore`] with switchable failures.
#[derive(Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    failing: Mutex<HashSet<Op>>,
    interleave: AtomicBool,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The wrapped store, for arranging state without fault checks.
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Makes every later call of `op` fail until [`heal`](Self::heal).
    pub fn fail(&self, op: Op) {
        self.failing().insert(op);
    }

    pub fn heal(&self, op: Op) {
        self.failing().remove(&op);
    }

    /// Yield to the runtime before every call.
    pub fn interleave(&self, on: bool) {
        self.interleave.store(on, Ordering::SeqCst);
    }

    fn failing(&self) -> std::sync::MutexGuard<'_, HashSet<Op>> {
        self.failing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn enter(&self, op: Op) -> Result<(), StoreError> {
        if self.interleave.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        if self.failing().contains(&op) {
            return Err(StoreError::Unavailable(format!("injected {op:?}")));
        }
        Ok(())
    }
}

impl RoomStore for FaultyStore {
    async fn create_room(&self, room: NewRoom) -> Result<Room, StoreError> {
        self.enter(Op::CreateRoom).await?;
        self.inner.create_room(room).await
    }

    async fn get_room(&self, id: RoomId) -> Result<Option<Room>, StoreError> {
        self.enter(Op::GetRoom).await?;
        self.inner.get_room(id).await
    }

    async fn get_room_by_code(
        &self,
        code: &str,
    ) -> Result<Option<Room>, StoreError> {
        self.enter(Op::GetRoom).await?;
        self.inner.get_room_by_code(code).await
    }

    async fn rename_room(
        &self,
        id: RoomId,
        name: String,
    ) -> Result<(), StoreError> {
        self.inner.rename_room(id, name).await
    }

    async fn delete_room(&self, id: RoomId) -> Result<(), StoreError> {
        self.enter(Op::DeleteRoom).await?;
        self.inner.delete_room(id).await
    }

    async fn mark_drawn(
        &self,
        id: RoomId,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.enter(Op::MarkDrawn).await?;
        self.inner.mark_drawn(id, at).await
    }

    async fn reset_drawn(&self, id: RoomId) -> Result<(), StoreError> {
        self.enter(Op::ResetDrawn).await?;
        self.inner.reset_drawn(id).await
    }

    async fn rooms_by_creator(
        &self,
        identity: Identity,
    ) -> Result<Vec<Room>, StoreError> {
        self.inner.rooms_by_creator(identity).await
    }

    async fn rooms_by_participant(
        &self,
        identity: Identity,
    ) -> Result<Vec<Room>, StoreError> {
        self.inner.rooms_by_participant(identity).await
    }
}

impl ParticipantStore for FaultyStore {
    async fn add_participant(
        &self,
        participant: NewParticipant,
    ) -> Result<Participant, StoreError> {
        self.enter(Op::AddParticipant).await?;
        self.inner.add_participant(participant).await
    }

    async fn get_participant(
        &self,
        room_id: RoomId,
        identity: Identity,
    ) -> Result<Option<Participant>, StoreError> {
        self.inner.get_participant(room_id, identity).await
    }

    async fn list_participants(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<Participant>, StoreError> {
        self.enter(Op::ListParticipants).await?;
        self.inner.list_participants(room_id).await
    }

    async fn update_participant(
        &self,
        participant: &Participant,
    ) -> Result<(), StoreError> {
        self.inner.update_participant(participant).await
    }

    async fn remove_participant(
        &self,
        room_id: RoomId,
        identity: Identity,
    ) -> Result<bool, StoreError> {
        self.inner.remove_participant(room_id, identity).await
    }
}

impl InvitationStore for FaultyStore {
    async fn create_invitation(
        &self,
        invitation: NewInvitation,
    ) -> Result<Invitation, StoreError> {
        self.enter(Op::CreateInvitation).await?;
        self.inner.create_invitation(invitation).await
    }

    async fn get_invitation_by_code(
        &self,
        code: &str,
    ) -> Result<Option<Invitation>, StoreError> {
        if self.interleave.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        self.inner.get_invitation_by_code(code).await
    }

    async fn list_invitations(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<Invitation>, StoreError> {
        self.inner.list_invitations(room_id).await
    }

    async fn mark_accepted(
        &self,
        id: InvitationId,
    ) -> Result<bool, StoreError> {
        self.enter(Op::MarkAccepted).await?;
        self.inner.mark_accepted(id).await
    }
}

impl AssignmentStore for FaultyStore {
    async fn insert_assignments(
        &self,
        assignments: Vec<NewAssignment>,
    ) -> Result<Vec<Assignment>, StoreError> {
        self.enter(Op::InsertAssignments).await?;
        self.inner.insert_assignments(assignments).await
    }

    async fn delete_assignments(
        &self,
        room_id: RoomId,
    ) -> Result<usize, StoreError> {
        self.enter(Op::DeleteAssignments).await?;
        self.inner.delete_assignments(room_id).await
    }

    async fn get_assignment(
        &self,
        room_id: RoomId,
        giver: Identity,
    ) -> Result<Option<Assignment>, StoreError> {
        self.inner.get_assignment(room_id, giver).await
    }

    async fn list_assignments(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<Assignment>, StoreError> {
        self.inner.list_assignments(room_id).await
    }
}
