//! The Room Lifecycle Controller.
//!
//! Entry point for everything that happens to a room as a whole:
//! creation, the draw, queries, and metadata edits. Authorization lives
//! here; the engine below it never checks who is asking.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use santa_draw::{AssignmentEngine, DrawError};
use santa_model::{
    Assignment, CodeGenerator, Identity, NewParticipant, NewRoom, Participant,
    Room, RoomId, RoomState,
};
use santa_store::{Constraint, Store};

use crate::codes::insert_with_unique_code;
use crate::{Missing, RoomError, SantaConfig};

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// A room together with its roster.
#[derive(Debug, Clone, Serialize)]
pub struct RoomInfo {
    pub room: Room,
    pub state: RoomState,
    pub participants: Vec<Participant>,
}

/// Whom a participant buys for, with what the recipient asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentView {
    pub room_id: RoomId,
    pub room_name: String,
    pub recipient: Identity,
    pub recipient_name: String,
    pub wish_list: Option<String>,
}

// ---------------------------------------------------------------------------
// RoomController
// ---------------------------------------------------------------------------

/// Creates rooms, runs draws, and answers room queries.
///
/// ```text
/// Open ──draw (creator, ≥ 2 participants)──→ Drawn
/// ```
///
/// `Drawn` is terminal for the normal path. [`redraw`](Self::redraw) is
/// the one administrative way to replace a committed cycle.
pub struct RoomController<S> {
    store: Arc<S>,
    engine: Arc<AssignmentEngine<S>>,
    codes: Arc<dyn CodeGenerator>,
    config: SantaConfig,
}

impl<S: Store> RoomController<S> {
    pub fn new(
        store: Arc<S>,
        engine: Arc<AssignmentEngine<S>>,
        codes: Arc<dyn CodeGenerator>,
        config: SantaConfig,
    ) -> Self {
        Self {
            store,
            engine,
            codes,
            config,
        }
    }

    pub fn config(&self) -> &SantaConfig {
        &self.config
    }

    // ---- lifecycle ----

    /// Creates an `Open` room and enrolls its creator as the first
    /// participant.
    ///
    /// The room code is regenerated on collision. If enrolling the
    /// creator fails the room is deleted again. Should that delete fail
    /// too, the room is left open with an empty roster; it stays listed
    /// under the creator, who can enroll later with the room code.
    pub async fn create_room(
        &self,
        name: &str,
        creator: Identity,
        creator_name: &str,
    ) -> Result<Room, RoomError> {
        let name = self.check_room_name(name)?;
        let creator_name = check_display_name(creator_name)?;
        let created_at = Utc::now();

        let room = insert_with_unique_code(
            self.codes.as_ref(),
            self.config.room_code_len,
            self.config.code_attempts,
            Constraint::RoomCode,
            |code| {
                self.store.create_room(NewRoom {
                    name: name.clone(),
                    creator,
                    code,
                    created_at,
                })
            },
        )
        .await?;

        let enrolled = self
            .store
            .add_participant(NewParticipant {
                room_id: room.id,
                identity: creator,
                display_name: creator_name,
                joined_at: created_at,
            })
            .await;
        if let Err(e) = enrolled {
            if let Err(undo) = self.store.delete_room(room.id).await {
                tracing::error!(
                    room_id = %room.id,
                    error = %undo,
                    "rollback: deleting half-created room failed"
                );
            }
            return Err(e.into());
        }

        tracing::info!(room_id = %room.id, %creator, "room created");
        Ok(room)
    }

    /// Draws the room. Creator only.
    ///
    /// A lost race with a concurrent draw is reported as
    /// [`RoomError::AlreadyDrawn`]: by the time the caller hears about
    /// it, the room has been drawn by someone else.
    pub async fn draw(
        &self,
        room_id: RoomId,
        requester: Identity,
    ) -> Result<Vec<Assignment>, RoomError> {
        let room = self.room(room_id).await?;
        if !room.is_creator(requester) {
            return Err(RoomError::not_authorized(requester, "draw this room"));
        }
        if !room.state().can_transition_to(RoomState::Drawn) {
            return Err(RoomError::AlreadyDrawn(room_id));
        }

        match self.engine.draw(room_id).await {
            Ok(rows) => Ok(rows),
            Err(DrawError::Conflict(id)) => {
                tracing::warn!(room_id = %id, "draw lost to a concurrent draw");
                Err(RoomError::AlreadyDrawn(id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replaces the room's cycle with a fresh one over today's roster.
    /// Creator only.
    pub async fn redraw(
        &self,
        room_id: RoomId,
        requester: Identity,
    ) -> Result<Vec<Assignment>, RoomError> {
        let room = self.room(room_id).await?;
        if !room.is_creator(requester) {
            return Err(RoomError::not_authorized(requester, "redraw this room"));
        }
        Ok(self.engine.redraw(room_id).await?)
    }

    /// Renames a room. Creator only, allowed in any state.
    pub async fn rename_room(
        &self,
        room_id: RoomId,
        by: Identity,
        name: &str,
    ) -> Result<Room, RoomError> {
        let name = self.check_room_name(name)?;
        let mut room = self.room(room_id).await?;
        if !room.is_creator(by) {
            return Err(RoomError::not_authorized(by, "rename this room"));
        }
        self.store.rename_room(room_id, name.clone()).await?;
        room.name = name;
        tracing::info!(%room_id, "room renamed");
        Ok(room)
    }

    // ---- queries ----

    /// The room and its roster, for the creator or any participant.
    pub async fn room_info(
        &self,
        room_id: RoomId,
        identity: Identity,
    ) -> Result<RoomInfo, RoomError> {
        let room = self.room(room_id).await?;
        let participants = self.store.list_participants(room_id).await?;
        let member = room.is_creator(identity)
            || participants.iter().any(|p| p.identity == identity);
        if !member {
            return Err(RoomError::not_authorized(identity, "view this room"));
        }
        Ok(RoomInfo {
            state: room.state(),
            room,
            participants,
        })
    }

    /// The roster in join order, for the creator or any participant.
    pub async fn list_participants(
        &self,
        room_id: RoomId,
        identity: Identity,
    ) -> Result<Vec<Participant>, RoomError> {
        Ok(self.room_info(room_id, identity).await?.participants)
    }

    /// Rooms `identity` created, newest first.
    pub async fn rooms_created_by(
        &self,
        identity: Identity,
    ) -> Result<Vec<Room>, RoomError> {
        Ok(self.store.rooms_by_creator(identity).await?)
    }

    /// Rooms `identity` is enrolled in, newest first.
    pub async fn rooms_joined_by(
        &self,
        identity: Identity,
    ) -> Result<Vec<Room>, RoomError> {
        Ok(self.store.rooms_by_participant(identity).await?)
    }

    pub async fn find_room_by_code(&self, code: &str) -> Result<Room, RoomError> {
        self.store
            .get_room_by_code(code.trim())
            .await?
            .ok_or(RoomError::NotFound(Missing::RoomCode))
    }

    // ---- participant profile ----

    /// Sets or clears the caller's wish list in one room.
    ///
    /// Blank text clears it. Allowed after the draw: givers read it at
    /// lookup time.
    pub async fn update_wish_list(
        &self,
        room_id: RoomId,
        identity: Identity,
        wish_list: Option<&str>,
    ) -> Result<Participant, RoomError> {
        let wish_list = wish_list
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(str::to_owned);
        if let Some(w) = &wish_list {
            let len = w.chars().count();
            if len > self.config.max_wish_list_len {
                return Err(RoomError::Invalid(format!(
                    "wish list is {len} characters, limit is {}",
                    self.config.max_wish_list_len
                )));
            }
        }

        let mut participant = self.participant(room_id, identity).await?;
        participant.wish_list = wish_list;
        self.store.update_participant(&participant).await?;
        tracing::debug!(%room_id, %identity, "wish list updated");
        Ok(participant)
    }

    /// Changes the caller's display name in one room.
    pub async fn update_display_name(
        &self,
        room_id: RoomId,
        identity: Identity,
        display_name: &str,
    ) -> Result<Participant, RoomError> {
        let display_name = check_display_name(display_name)?;
        let mut participant = self.participant(room_id, identity).await?;
        participant.display_name = display_name;
        self.store.update_participant(&participant).await?;
        Ok(participant)
    }

    // ---- assignments ----

    /// The raw assignment row for `giver`, or `None` before the draw.
    pub async fn get_assignment(
        &self,
        room_id: RoomId,
        giver: Identity,
    ) -> Result<Option<Assignment>, RoomError> {
        self.room(room_id).await?;
        Ok(self.engine.get_assignment(room_id, giver).await?)
    }

    /// Whom `identity` buys for in `room_id`, with the recipient's name
    /// and wish list.
    pub async fn my_assignment(
        &self,
        room_id: RoomId,
        identity: Identity,
    ) -> Result<Option<AssignmentView>, RoomError> {
        let room = self.room(room_id).await?;
        self.view_for(&room, identity).await
    }

    /// [`my_assignment`](Self::my_assignment) across every drawn room the
    /// identity takes part in, newest room first.
    pub async fn my_assignments(
        &self,
        identity: Identity,
    ) -> Result<Vec<AssignmentView>, RoomError> {
        let rooms = self.store.rooms_by_participant(identity).await?;
        let mut views = Vec::new();
        for room in rooms.iter().filter(|r| r.state().is_drawn()) {
            if let Some(view) = self.view_for(room, identity).await? {
                views.push(view);
            }
        }
        Ok(views)
    }

    // ---- helpers ----

    async fn view_for(
        &self,
        room: &Room,
        identity: Identity,
    ) -> Result<Option<AssignmentView>, RoomError> {
        let Some(assignment) =
            self.engine.get_assignment(room.id, identity).await?
        else {
            return Ok(None);
        };
        // Drawn rooms refuse removals, so a missing row means the store
        // lost it. The recipient still shows up, named by identity.
        let recipient = self
            .store
            .get_participant(room.id, assignment.recipient)
            .await?;
        let (recipient_name, wish_list) = match recipient {
            Some(p) => (p.display_name, p.wish_list),
            None => (assignment.recipient.to_string(), None),
        };
        Ok(Some(AssignmentView {
            room_id: room.id,
            room_name: room.name.clone(),
            recipient: assignment.recipient,
            recipient_name,
            wish_list,
        }))
    }

    async fn room(&self, room_id: RoomId) -> Result<Room, RoomError> {
        self.store
            .get_room(room_id)
            .await?
            .ok_or(RoomError::NotFound(Missing::Room(room_id)))
    }

    async fn participant(
        &self,
        room_id: RoomId,
        identity: Identity,
    ) -> Result<Participant, RoomError> {
        self.store
            .get_participant(room_id, identity)
            .await?
            .ok_or(RoomError::NotFound(Missing::Participant(room_id, identity)))
    }

    fn check_room_name(&self, name: &str) -> Result<String, RoomError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RoomError::Invalid("room name is empty".into()));
        }
        let len = name.chars().count();
        if len > self.config.max_room_name_len {
            return Err(RoomError::Invalid(format!(
                "room name is {len} characters, limit is {}",
                self.config.max_room_name_len
            )));
        }
        Ok(name.to_owned())
    }
}

/// Trims a display name and rejects blank ones.
pub(crate) fn check_display_name(name: &str) -> Result<String, RoomError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RoomError::Invalid("display name is empty".into()));
    }
    Ok(name.to_owned())
}
