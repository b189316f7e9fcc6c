//! The Invitation/Membership Manager.
//!
//! Decides who gets onto a room's roster, and who leaves it. Every roster
//! change runs under the room's lock from the shared [`RoomLocks`], the
//! same lock the draw holds, so a draw always sees a settled roster.
//!
//! # Admission rules
//!
//! | check                          | invitation code         | room code   |
//! |--------------------------------|-------------------------|-------------|
//! | code exists                    | `NotFound`              | `NotFound`  |
//! | bound to the caller            | `InvitationMismatch`    | n/a         |
//! | not used before                | `AlreadyAccepted`       | n/a         |
//! | room still `Open`              | `AlreadyDrawn`          | `AlreadyDrawn` |
//! | caller not on the roster yet   | `AlreadyParticipant`    | `AlreadyParticipant` |

use std::sync::Arc;

use chrono::Utc;
use santa_draw::RoomLocks;
use santa_model::{
    CodeGenerator, Identity, Invitation, NewInvitation, NewParticipant,
    Participant, Room, RoomId,
};
use santa_store::{Constraint, Store, StoreError};

use crate::codes::insert_with_unique_code;
use crate::controller::check_display_name;
use crate::{Missing, RoomError, SantaConfig};

/// Issues invitations and admits or removes participants.
pub struct MembershipManager<S> {
    store: Arc<S>,
    locks: RoomLocks,
    codes: Arc<dyn CodeGenerator>,
    config: SantaConfig,
}

impl<S: Store> MembershipManager<S> {
    /// `locks` must be the registry the assignment engine draws under.
    pub fn new(
        store: Arc<S>,
        locks: RoomLocks,
        codes: Arc<dyn CodeGenerator>,
        config: SantaConfig,
    ) -> Self {
        Self {
            store,
            locks,
            codes,
            config,
        }
    }

    // ---- invitations ----

    /// Issues an invitation bound to `target`. Creator only.
    ///
    /// Inviting into a drawn room is allowed; accepting that invitation
    /// is not.
    pub async fn invite(
        &self,
        room_id: RoomId,
        by: Identity,
        target: Identity,
    ) -> Result<Invitation, RoomError> {
        let room = self.room(room_id).await?;
        if !room.is_creator(by) {
            return Err(RoomError::not_authorized(by, "invite to this room"));
        }

        let created_at = Utc::now();
        let invitation = insert_with_unique_code(
            self.codes.as_ref(),
            self.config.invitation_code_len,
            self.config.code_attempts,
            Constraint::InvitationCode,
            |code| {
                self.store.create_invitation(NewInvitation {
                    room_id,
                    invited: target,
                    code,
                    created_at,
                })
            },
        )
        .await?;

        tracing::info!(%room_id, invited = %target, "invitation issued");
        Ok(invitation)
    }

    /// Invitations issued for a room, newest first. Creator only.
    pub async fn list_invitations(
        &self,
        room_id: RoomId,
        by: Identity,
    ) -> Result<Vec<Invitation>, RoomError> {
        let room = self.room(room_id).await?;
        if !room.is_creator(by) {
            return Err(RoomError::not_authorized(by, "list invitations"));
        }
        Ok(self.store.list_invitations(room_id).await?)
    }

    // ---- admission ----

    /// Joins the room an invitation points at.
    ///
    /// The participant row and the invitation's accepted flag land
    /// together: the row is written first, and removed again if the flag
    /// cannot be flipped.
    pub async fn accept_by_invitation_code(
        &self,
        code: &str,
        identity: Identity,
        display_name: &str,
    ) -> Result<Participant, RoomError> {
        let display_name = check_display_name(display_name)?;
        let code = code.trim();
        let room_id = self.invitation(code).await?.room_id;

        let _guard = self.locks.lock(room_id).await;
        // Re-read under the lock: a concurrent accept may have landed
        // while we waited.
        let invitation = self.invitation(code).await?;
        if !invitation.is_for(identity) {
            tracing::debug!(%room_id, %identity, "invitation presented by wrong identity");
            return Err(RoomError::InvitationMismatch);
        }
        if invitation.is_accepted {
            return Err(RoomError::AlreadyAccepted);
        }
        let room = self.room(room_id).await?;
        self.check_admissible(&room, identity).await?;

        let participant = self.enroll(room_id, identity, display_name).await?;

        let accepted = self.store.mark_accepted(invitation.id).await;
        match accepted {
            Ok(true) => {
                tracing::info!(%room_id, %identity, "joined by invitation");
                Ok(participant)
            }
            Ok(false) => {
                tracing::warn!(%room_id, %identity, "invitation accepted concurrently");
                self.unenroll(room_id, identity).await;
                Err(RoomError::AlreadyAccepted)
            }
            Err(e) => {
                self.unenroll(room_id, identity).await;
                Err(e.into())
            }
        }
    }

    /// Joins an `Open` room by its shareable code. Anyone holding the
    /// code may join.
    pub async fn accept_by_room_code(
        &self,
        room_code: &str,
        identity: Identity,
        display_name: &str,
    ) -> Result<Participant, RoomError> {
        let display_name = check_display_name(display_name)?;
        let room_id = self
            .store
            .get_room_by_code(room_code.trim())
            .await?
            .ok_or(RoomError::NotFound(Missing::RoomCode))?
            .id;

        let _guard = self.locks.lock(room_id).await;
        let room = self.room(room_id).await?;
        self.check_admissible(&room, identity).await?;
        let participant = self.enroll(room_id, identity, display_name).await?;
        tracing::info!(%room_id, %identity, "joined by room code");
        Ok(participant)
    }

    /// Joins with whatever code the user typed: an invitation code is
    /// tried first, then a room code.
    ///
    /// Only an unknown invitation code falls through to the room lookup;
    /// a known invitation that rejects the caller is final.
    pub async fn join_by_code(
        &self,
        code: &str,
        identity: Identity,
        display_name: &str,
    ) -> Result<Participant, RoomError> {
        match self
            .accept_by_invitation_code(code, identity, display_name)
            .await
        {
            Err(RoomError::NotFound(Missing::Invitation)) => {
                self.accept_by_room_code(code, identity, display_name).await
            }
            other => other,
        }
    }

    // ---- removal ----

    /// Takes the caller off a room's roster. Only while `Open`; the
    /// creator cannot leave their own room.
    pub async fn leave_room(
        &self,
        room_id: RoomId,
        identity: Identity,
    ) -> Result<(), RoomError> {
        let _guard = self.locks.lock(room_id).await;
        let room = self.room(room_id).await?;
        if room.is_creator(identity) {
            return Err(RoomError::not_authorized(identity, "leave a room they created"));
        }
        self.remove(&room, identity).await?;
        tracing::info!(%room_id, %identity, "participant left");
        Ok(())
    }

    /// Removes `target` from the roster. Creator only, only while
    /// `Open`, and never the creator themselves.
    pub async fn remove_participant(
        &self,
        room_id: RoomId,
        by: Identity,
        target: Identity,
    ) -> Result<(), RoomError> {
        let _guard = self.locks.lock(room_id).await;
        let room = self.room(room_id).await?;
        if !room.is_creator(by) {
            return Err(RoomError::not_authorized(by, "remove participants"));
        }
        if room.is_creator(target) {
            return Err(RoomError::not_authorized(by, "remove the room creator"));
        }
        self.remove(&room, target).await?;
        tracing::info!(%room_id, removed = %target, "participant removed");
        Ok(())
    }

    // ---- helpers ----

    /// Checks the room is open and `identity` is not enrolled yet.
    async fn check_admissible(
        &self,
        room: &Room,
        identity: Identity,
    ) -> Result<(), RoomError> {
        if !room.state().is_joinable() {
            tracing::debug!(room_id = %room.id, %identity, "join rejected: room drawn");
            return Err(RoomError::AlreadyDrawn(room.id));
        }
        if self.store.is_participant(room.id, identity).await? {
            tracing::debug!(room_id = %room.id, %identity, "join rejected: already enrolled");
            return Err(RoomError::AlreadyParticipant(identity, room.id));
        }
        Ok(())
    }

    async fn enroll(
        &self,
        room_id: RoomId,
        identity: Identity,
        display_name: String,
    ) -> Result<Participant, RoomError> {
        self.store
            .add_participant(NewParticipant {
                room_id,
                identity,
                display_name,
                joined_at: Utc::now(),
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(Constraint::Participant) => {
                    RoomError::AlreadyParticipant(identity, room_id)
                }
                other => other.into(),
            })
    }

    /// Compensates an enrollment whose invitation could not be accepted.
    async fn unenroll(&self, room_id: RoomId, identity: Identity) {
        if let Err(e) = self.store.remove_participant(room_id, identity).await {
            tracing::error!(
                %room_id,
                %identity,
                error = %e,
                "rollback: removing participant failed"
            );
        }
    }

    async fn remove(&self, room: &Room, identity: Identity) -> Result<(), RoomError> {
        if !room.state().is_joinable() {
            return Err(RoomError::AlreadyDrawn(room.id));
        }
        if !self.store.remove_participant(room.id, identity).await? {
            return Err(RoomError::NotFound(Missing::Participant(room.id, identity)));
        }
        Ok(())
    }

    async fn room(&self, room_id: RoomId) -> Result<Room, RoomError> {
        self.store
            .get_room(room_id)
            .await?
            .ok_or(RoomError::NotFound(Missing::Room(room_id)))
    }

    async fn invitation(&self, code: &str) -> Result<Invitation, RoomError> {
        self.store
            .get_invitation_by_code(code)
            .await?
            .ok_or(RoomError::NotFound(Missing::Invitation))
    }
}
