//! An in-process implementation of every store trait.
//!
//! # Concurrency note
//!
//! All tables live behind one `std::sync::Mutex`. No method awaits while
//! holding it, so each call is a single atomic step, which is exactly
//! what the conditional primitives (`mark_drawn`, `mark_accepted`) and
//! the all-or-nothing `insert_assignments` need.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use santa_model::{
    Assignment, AssignmentId, Identity, Invitation, InvitationId,
    NewAssignment, NewInvitation, NewParticipant, NewRoom, Participant,
    ParticipantId, Room, RoomId,
};

use crate::{
    AssignmentStore, Constraint, InvitationStore, ParticipantStore,
    RoomStore, StoreError,
};

/// The rows, plus secondary indexes kept in sync with them.
#[derive(Default)]
struct Tables {
    rooms: HashMap<RoomId, Room>,
    /// Index from room code to room id.
    room_codes: HashMap<String, RoomId>,
    participants: HashMap<(RoomId, Identity), Participant>,
    invitations: HashMap<InvitationId, Invitation>,
    /// Index from invitation code to invitation id.
    invitation_codes: HashMap<String, InvitationId>,
    assignments: HashMap<AssignmentId, Assignment>,
    next_id: u64,
}

impl Tables {
    /// Hands out ids from one counter, like a database sequence.
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// A [`Store`](crate::Store) that keeps everything in memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // A panic while holding the lock cannot leave a half-written row:
        // every mutation below is a single insert or remove.
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Sorts rooms newest first, breaking ties by id.
fn newest_first(mut rooms: Vec<Room>) -> Vec<Room> {
    rooms.sort_by(|a, b| {
        b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
    });
    rooms
}

impl RoomStore for MemoryStore {
    async fn create_room(&self, new: NewRoom) -> Result<Room, StoreError> {
        let mut t = self.tables();
        if t.room_codes.contains_key(&new.code) {
            return Err(StoreError::Duplicate(Constraint::RoomCode));
        }

        let room = Room {
            id: RoomId(t.next_id()),
            name: new.name,
            creator: new.creator,
            code: new.code,
            created_at: new.created_at,
            draw_date: None,
            is_drawn: false,
        };
        t.room_codes.insert(room.code.clone(), room.id);
        t.rooms.insert(room.id, room.clone());
        Ok(room)
    }

    async fn get_room(&self, id: RoomId) -> Result<Option<Room>, StoreError> {
        Ok(self.tables().rooms.get(&id).cloned())
    }

    async fn get_room_by_code(
        &self,
        code: &str,
    ) -> Result<Option<Room>, StoreError> {
        let t = self.tables();
        Ok(t.room_codes.get(code).and_then(|id| t.rooms.get(id)).cloned())
    }

    async fn rename_room(
        &self,
        id: RoomId,
        name: String,
    ) -> Result<(), StoreError> {
        let mut t = self.tables();
        let room = t.rooms.get_mut(&id).ok_or(StoreError::NotFound("room"))?;
        room.name = name;
        Ok(())
    }

    async fn delete_room(&self, id: RoomId) -> Result<(), StoreError> {
        let mut t = self.tables();
        let room = t.rooms.remove(&id).ok_or(StoreError::NotFound("room"))?;
        t.room_codes.remove(&room.code);
        t.participants.retain(|(room_id, _), _| *room_id != id);
        t.assignments.retain(|_, a| a.room_id != id);

        // Drop the code index entries before the rows they point at.
        let codes: Vec<String> = t
            .invitations
            .values()
            .filter(|inv| inv.room_id == id)
            .map(|inv| inv.code.clone())
            .collect();
        for code in codes {
            t.invitation_codes.remove(&code);
        }
        t.invitations.retain(|_, inv| inv.room_id != id);
        Ok(())
    }

    async fn mark_drawn(
        &self,
        id: RoomId,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut t = self.tables();
        let room = t.rooms.get_mut(&id).ok_or(StoreError::NotFound("room"))?;
        if room.is_drawn {
            return Ok(false);
        }
        room.is_drawn = true;
        room.draw_date = Some(at);
        Ok(true)
    }

    async fn reset_drawn(&self, id: RoomId) -> Result<(), StoreError> {
        let mut t = self.tables();
        let room = t.rooms.get_mut(&id).ok_or(StoreError::NotFound("room"))?;
        room.is_drawn = false;
        room.draw_date = None;
        Ok(())
    }

    async fn rooms_by_creator(
        &self,
        identity: Identity,
    ) -> Result<Vec<Room>, StoreError> {
        let rooms = self
            .tables()
            .rooms
            .values()
            .filter(|r| r.creator == identity)
            .cloned()
            .collect();
        Ok(newest_first(rooms))
    }

    async fn rooms_by_participant(
        &self,
        identity: Identity,
    ) -> Result<Vec<Room>, StoreError> {
        let t = self.tables();
        let rooms = t
            .participants
            .keys()
            .filter(|(_, who)| *who == identity)
            .filter_map(|(room_id, _)| t.rooms.get(room_id))
            .cloned()
            .collect();
        Ok(newest_first(rooms))
    }
}

impl ParticipantStore for MemoryStore {
    async fn add_participant(
        &self,
        new: NewParticipant,
    ) -> Result<Participant, StoreError> {
        let mut t = self.tables();
        let key = (new.room_id, new.identity);
        if t.participants.contains_key(&key) {
            return Err(StoreError::Duplicate(Constraint::Participant));
        }
        if !t.rooms.contains_key(&new.room_id) {
            return Err(StoreError::NotFound("room"));
        }

        let participant = Participant {
            id: ParticipantId(t.next_id()),
            room_id: new.room_id,
            identity: new.identity,
            display_name: new.display_name,
            wish_list: None,
            joined_at: new.joined_at,
        };
        t.participants.insert(key, participant.clone());
        Ok(participant)
    }

    async fn get_participant(
        &self,
        room_id: RoomId,
        identity: Identity,
    ) -> Result<Option<Participant>, StoreError> {
        Ok(self.tables().participants.get(&(room_id, identity)).cloned())
    }

    async fn list_participants(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<Participant>, StoreError> {
        let mut roster: Vec<Participant> = self
            .tables()
            .participants
            .values()
            .filter(|p| p.room_id == room_id)
            .cloned()
            .collect();
        roster.sort_by(|a, b| {
            a.joined_at.cmp(&b.joined_at).then(a.id.cmp(&b.id))
        });
        Ok(roster)
    }

    async fn update_participant(
        &self,
        participant: &Participant,
    ) -> Result<(), StoreError> {
        let mut t = self.tables();
        let row = t
            .participants
            .get_mut(&(participant.room_id, participant.identity))
            .ok_or(StoreError::NotFound("participant"))?;
        row.display_name = participant.display_name.clone();
        row.wish_list = participant.wish_list.clone();
        Ok(())
    }

    async fn remove_participant(
        &self,
        room_id: RoomId,
        identity: Identity,
    ) -> Result<bool, StoreError> {
        Ok(self
            .tables()
            .participants
            .remove(&(room_id, identity))
            .is_some())
    }
}

impl InvitationStore for MemoryStore {
    async fn create_invitation(
        &self,
        new: NewInvitation,
    ) -> Result<Invitation, StoreError> {
        let mut t = self.tables();
        if t.invitation_codes.contains_key(&new.code) {
            return Err(StoreError::Duplicate(Constraint::InvitationCode));
        }

        let invitation = Invitation {
            id: InvitationId(t.next_id()),
            room_id: new.room_id,
            invited: new.invited,
            code: new.code,
            created_at: new.created_at,
            is_accepted: false,
        };
        t.invitation_codes
            .insert(invitation.code.clone(), invitation.id);
        t.invitations.insert(invitation.id, invitation.clone());
        Ok(invitation)
    }

    async fn get_invitation_by_code(
        &self,
        code: &str,
    ) -> Result<Option<Invitation>, StoreError> {
        let t = self.tables();
        Ok(t.invitation_codes
            .get(code)
            .and_then(|id| t.invitations.get(id))
            .cloned())
    }

    async fn list_invitations(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<Invitation>, StoreError> {
        let mut invitations: Vec<Invitation> = self
            .tables()
            .invitations
            .values()
            .filter(|inv| inv.room_id == room_id)
            .cloned()
            .collect();
        invitations.sort_by(|a, b| {
            b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
        });
        Ok(invitations)
    }

    async fn mark_accepted(
        &self,
        id: InvitationId,
    ) -> Result<bool, StoreError> {
        let mut t = self.tables();
        let inv = t
            .invitations
            .get_mut(&id)
            .ok_or(StoreError::NotFound("invitation"))?;
        if inv.is_accepted {
            return Ok(false);
        }
        inv.is_accepted = true;
        Ok(true)
    }
}

impl AssignmentStore for MemoryStore {
    async fn insert_assignments(
        &self,
        batch: Vec<NewAssignment>,
    ) -> Result<Vec<Assignment>, StoreError> {
        let mut t = self.tables();
        let mut inserted = Vec::with_capacity(batch.len());
        for new in batch {
            let assignment = Assignment {
                id: AssignmentId(t.next_id()),
                room_id: new.room_id,
                giver: new.giver,
                recipient: new.recipient,
                created_at: new.created_at,
            };
            t.assignments.insert(assignment.id, assignment.clone());
            inserted.push(assignment);
        }
        Ok(inserted)
    }

    async fn delete_assignments(
        &self,
        room_id: RoomId,
    ) -> Result<usize, StoreError> {
        let mut t = self.tables();
        let before = t.assignments.len();
        t.assignments.retain(|_, a| a.room_id != room_id);
        let removed = before - t.assignments.len();
        if removed > 0 {
            tracing::debug!(%room_id, removed, "assignments deleted");
        }
        Ok(removed)
    }

    async fn get_assignment(
        &self,
        room_id: RoomId,
        giver: Identity,
    ) -> Result<Option<Assignment>, StoreError> {
        Ok(self
            .tables()
            .assignments
            .values()
            .find(|a| a.room_id == room_id && a.giver == giver)
            .cloned())
    }

    async fn list_assignments(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<Assignment>, StoreError> {
        let mut assignments: Vec<Assignment> = self
            .tables()
            .assignments
            .values()
            .filter(|a| a.room_id == room_id)
            .cloned()
            .collect();
        assignments.sort_by_key(|a| a.id);
        Ok(assignments)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for `MemoryStore`.
    //!
    //! Naming follows `test_{function}_{scenario}_{expected}`.

    use super::*;

    fn new_room(code: &str, creator: u64) -> NewRoom {
        NewRoom {
            name: format!("room {code}"),
            creator: Identity(creator),
            code: code.to_string(),
            created_at: Utc::now(),
        }
    }

    fn new_participant(room_id: RoomId, who: u64) -> NewParticipant {
        NewParticipant {
            room_id,
            identity: Identity(who),
            display_name: format!("user {who}"),
            joined_at: Utc::now(),
        }
    }

    fn new_invitation(room_id: RoomId, who: u64, code: &str) -> NewInvitation {
        NewInvitation {
            room_id,
            invited: Identity(who),
            code: code.to_string(),
            created_at: Utc::now(),
        }
    }

    // =====================================================================
    // RoomStore
    // =====================================================================

    #[tokio::test]
    async fn test_create_room_assigns_id_and_starts_open() {
        let store = MemoryStore::new();
        let room = store.create_room(new_room("AAAA", 1)).await.unwrap();

        assert!(!room.is_drawn);
        assert!(room.draw_date.is_none());
        assert_eq!(store.get_room(room.id).await.unwrap(), Some(room));
    }

    #[tokio::test]
    async fn test_create_room_duplicate_code_returns_duplicate() {
        let store = MemoryStore::new();
        store.create_room(new_room("AAAA", 1)).await.unwrap();

        let err = store.create_room(new_room("AAAA", 2)).await.unwrap_err();
        assert!(err.is_duplicate(Constraint::RoomCode));
    }

    #[tokio::test]
    async fn test_get_room_by_code_finds_room() {
        let store = MemoryStore::new();
        let room = store.create_room(new_room("CODE", 1)).await.unwrap();

        let found = store.get_room_by_code("CODE").await.unwrap();
        assert_eq!(found.map(|r| r.id), Some(room.id));
        assert!(store.get_room_by_code("NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_drawn_flips_exactly_once() {
        let store = MemoryStore::new();
        let room = store.create_room(new_room("AAAA", 1)).await.unwrap();
        let at = Utc::now();

        assert!(store.mark_drawn(room.id, at).await.unwrap());
        assert!(!store.mark_drawn(room.id, Utc::now()).await.unwrap());

        let room = store.get_room(room.id).await.unwrap().unwrap();
        assert!(room.is_drawn);
        assert_eq!(room.draw_date, Some(at));
    }

    #[tokio::test]
    async fn test_reset_drawn_reopens_room() {
        let store = MemoryStore::new();
        let room = store.create_room(new_room("AAAA", 1)).await.unwrap();
        store.mark_drawn(room.id, Utc::now()).await.unwrap();

        store.reset_drawn(room.id).await.unwrap();

        let room = store.get_room(room.id).await.unwrap().unwrap();
        assert!(!room.is_drawn);
        assert!(room.draw_date.is_none());
        assert!(store.mark_drawn(room.id, Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_mark_drawn_unknown_room_returns_not_found() {
        let store = MemoryStore::new();
        let err = store.mark_drawn(RoomId(99), Utc::now()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound("room")));
    }

    #[tokio::test]
    async fn test_delete_room_cascades_and_frees_codes() {
        let store = MemoryStore::new();
        let room = store.create_room(new_room("AAAA", 1)).await.unwrap();
        store.add_participant(new_participant(room.id, 1)).await.unwrap();
        store
            .create_invitation(new_invitation(room.id, 2, "INV1"))
            .await
            .unwrap();

        store.delete_room(room.id).await.unwrap();

        assert!(store.get_room(room.id).await.unwrap().is_none());
        assert!(store.list_participants(room.id).await.unwrap().is_empty());
        assert!(store.get_invitation_by_code("INV1").await.unwrap().is_none());
        // Both codes are free again.
        store.create_room(new_room("AAAA", 1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_rooms_by_participant_lists_joined_rooms() {
        let store = MemoryStore::new();
        let r1 = store.create_room(new_room("R1", 1)).await.unwrap();
        let r2 = store.create_room(new_room("R2", 2)).await.unwrap();
        store.create_room(new_room("R3", 3)).await.unwrap();
        store.add_participant(new_participant(r1.id, 5)).await.unwrap();
        store.add_participant(new_participant(r2.id, 5)).await.unwrap();

        let mut ids: Vec<RoomId> = store
            .rooms_by_participant(Identity(5))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec![r1.id, r2.id]);

        let created = store.rooms_by_creator(Identity(2)).await.unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].id, r2.id);
    }

    // =====================================================================
    // ParticipantStore
    // =====================================================================

    #[tokio::test]
    async fn test_add_participant_twice_returns_duplicate() {
        let store = MemoryStore::new();
        let room = store.create_room(new_room("AAAA", 1)).await.unwrap();
        store.add_participant(new_participant(room.id, 1)).await.unwrap();

        let err = store
            .add_participant(new_participant(room.id, 1))
            .await
            .unwrap_err();
        assert!(err.is_duplicate(Constraint::Participant));
        assert_eq!(store.list_participants(room.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_participant_unknown_room_returns_not_found() {
        let store = MemoryStore::new();
        let err = store
            .add_participant(new_participant(RoomId(42), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound("room")));
    }

    #[tokio::test]
    async fn test_list_participants_in_join_order() {
        let store = MemoryStore::new();
        let room = store.create_room(new_room("AAAA", 1)).await.unwrap();
        for who in [3, 1, 2] {
            store.add_participant(new_participant(room.id, who)).await.unwrap();
        }

        let order: Vec<u64> = store
            .list_participants(room.id)
            .await
            .unwrap()
            .iter()
            .map(|p| p.identity.0)
            .collect();
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_update_participant_changes_profile() {
        let store = MemoryStore::new();
        let room = store.create_room(new_room("AAAA", 1)).await.unwrap();
        let mut p =
            store.add_participant(new_participant(room.id, 1)).await.unwrap();

        p.display_name = "Santa".into();
        p.wish_list = Some("socks".into());
        store.update_participant(&p).await.unwrap();

        let stored =
            store.get_participant(room.id, Identity(1)).await.unwrap().unwrap();
        assert_eq!(stored.display_name, "Santa");
        assert_eq!(stored.wish_list.as_deref(), Some("socks"));
    }

    #[tokio::test]
    async fn test_remove_participant_reports_whether_removed() {
        let store = MemoryStore::new();
        let room = store.create_room(new_room("AAAA", 1)).await.unwrap();
        store.add_participant(new_participant(room.id, 1)).await.unwrap();

        assert!(store.remove_participant(room.id, Identity(1)).await.unwrap());
        assert!(!store.remove_participant(room.id, Identity(1)).await.unwrap());
        assert!(!store.is_participant(room.id, Identity(1)).await.unwrap());
    }

    // =====================================================================
    // InvitationStore
    // =====================================================================

    #[tokio::test]
    async fn test_mark_accepted_flips_exactly_once() {
        let store = MemoryStore::new();
        let room = store.create_room(new_room("AAAA", 1)).await.unwrap();
        let inv = store
            .create_invitation(new_invitation(room.id, 2, "INV1"))
            .await
            .unwrap();

        assert!(store.mark_accepted(inv.id).await.unwrap());
        assert!(!store.mark_accepted(inv.id).await.unwrap());

        let stored = store.get_invitation_by_code("INV1").await.unwrap().unwrap();
        assert!(stored.is_accepted);
    }

    #[tokio::test]
    async fn test_create_invitation_duplicate_code_returns_duplicate() {
        let store = MemoryStore::new();
        let room = store.create_room(new_room("AAAA", 1)).await.unwrap();
        store
            .create_invitation(new_invitation(room.id, 2, "SAME"))
            .await
            .unwrap();

        let err = store
            .create_invitation(new_invitation(room.id, 3, "SAME"))
            .await
            .unwrap_err();
        assert!(err.is_duplicate(Constraint::InvitationCode));
    }

    // =====================================================================
    // AssignmentStore
    // =====================================================================

    #[tokio::test]
    async fn test_delete_assignments_only_touches_one_room() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let edge = |room: u64, giver: u64, recipient: u64| NewAssignment {
            room_id: RoomId(room),
            giver: Identity(giver),
            recipient: Identity(recipient),
            created_at: now,
        };
        store
            .insert_assignments(vec![edge(1, 1, 2), edge(1, 2, 1), edge(2, 3, 4)])
            .await
            .unwrap();

        assert_eq!(store.delete_assignments(RoomId(1)).await.unwrap(), 2);
        assert!(store.list_assignments(RoomId(1)).await.unwrap().is_empty());
        assert_eq!(store.list_assignments(RoomId(2)).await.unwrap().len(), 1);

        let a = store.get_assignment(RoomId(2), Identity(3)).await.unwrap();
        assert_eq!(a.map(|a| a.recipient), Some(Identity(4)));
    }
}
