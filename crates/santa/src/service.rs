//! `SecretSanta` builder and service facade.
//!
//! Ties the layers together: store → engine → controller / membership.
//! Both front halves share one store, one engine, and one lock registry,
//! which is what makes roster changes and draws on a room mutually
//! exclusive.

use std::sync::Arc;

use santa_draw::{AssignmentEngine, RoomLocks};
use santa_model::{
    Assignment, CodeGenerator, Identity, Invitation, Participant,
    RandomCodeGenerator, Room, RoomId,
};
use santa_room::{
    AssignmentView, MembershipManager, RoomController, RoomInfo, SantaConfig,
};
use santa_store::Store;

use crate::SantaError;

/// Offset between the shuffle seed and the code-generator seed, so the
/// two streams differ when one `rng_seed` drives both.
const CODE_SEED_OFFSET: u64 = 0x5eed;

/// Builder for configuring a [`SecretSanta`] service.
///
/// # Example
///
/// ```rust,ignore
/// use santa::prelude::*;
///
/// let santa = SecretSantaBuilder::new()
///     .config(SantaConfig::from_json_str(r#"{"rng_seed": 7}"#)?)
///     .build(MemoryStore::new())?;
/// ```
#[derive(Default)]
pub struct SecretSantaBuilder {
    config: SantaConfig,
    codes: Option<Arc<dyn CodeGenerator>>,
}

impl SecretSantaBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the service configuration.
    pub fn config(mut self, config: SantaConfig) -> Self {
        self.config = config;
        self
    }

    /// Makes every shuffle and every generated code reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.rng_seed = Some(seed);
        self
    }

    /// Replaces the random code generator.
    pub fn codes(mut self, codes: Arc<dyn CodeGenerator>) -> Self {
        self.codes = Some(codes);
        self
    }

    /// Validates the configuration and wires the service over `store`.
    pub fn build<S: Store>(self, store: S) -> Result<SecretSanta<S>, SantaError> {
        let config = self.config;
        config.validate()?;

        let store = Arc::new(store);
        let locks = RoomLocks::new();
        let engine = match config.rng_seed {
            Some(seed) => AssignmentEngine::seeded(Arc::clone(&store), locks, seed),
            None => AssignmentEngine::new(Arc::clone(&store), locks),
        };
        let engine = Arc::new(
            engine.with_min_participants(config.effective_min_participants()),
        );

        let codes: Arc<dyn CodeGenerator> = match (self.codes, config.rng_seed) {
            (Some(codes), _) => codes,
            (None, Some(seed)) => Arc::new(RandomCodeGenerator::seeded(
                seed.wrapping_add(CODE_SEED_OFFSET),
            )),
            (None, None) => Arc::new(RandomCodeGenerator::new()),
        };

        let members = MembershipManager::new(
            Arc::clone(&store),
            engine.locks().clone(),
            Arc::clone(&codes),
            config.clone(),
        );
        let rooms = RoomController::new(Arc::clone(&store), engine, codes, config);

        tracing::debug!(
            seeded = rooms.config().rng_seed.is_some(),
            min_participants = rooms.config().effective_min_participants(),
            "secret santa service ready"
        );
        Ok(SecretSanta {
            store,
            rooms,
            members,
        })
    }
}

/// The service a Messaging Gateway calls.
///
/// The methods here are the gateway's everyday verbs. Everything else
/// is reachable through [`rooms()`](Self::rooms) and
/// [`members()`](Self::members).
pub struct SecretSanta<S> {
    store: Arc<S>,
    rooms: RoomController<S>,
    members: MembershipManager<S>,
}

impl<S: Store> SecretSanta<S> {
    pub fn rooms(&self) -> &RoomController<S> {
        &self.rooms
    }

    pub fn members(&self) -> &MembershipManager<S> {
        &self.members
    }

    /// The backing store, for gateways that read entities directly.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn create_room(
        &self,
        name: &str,
        creator: Identity,
        creator_name: &str,
    ) -> Result<Room, SantaError> {
        Ok(self.rooms.create_room(name, creator, creator_name).await?)
    }

    pub async fn invite(
        &self,
        room_id: RoomId,
        by: Identity,
        target: Identity,
    ) -> Result<Invitation, SantaError> {
        Ok(self.members.invite(room_id, by, target).await?)
    }

    /// Joins with an invitation code or a room code.
    pub async fn join_by_code(
        &self,
        code: &str,
        identity: Identity,
        display_name: &str,
    ) -> Result<Participant, SantaError> {
        Ok(self.members.join_by_code(code, identity, display_name).await?)
    }

    pub async fn draw(
        &self,
        room_id: RoomId,
        requester: Identity,
    ) -> Result<Vec<Assignment>, SantaError> {
        Ok(self.rooms.draw(room_id, requester).await?)
    }

    pub async fn get_assignment(
        &self,
        room_id: RoomId,
        giver: Identity,
    ) -> Result<Option<Assignment>, SantaError> {
        Ok(self.rooms.get_assignment(room_id, giver).await?)
    }

    pub async fn my_assignment(
        &self,
        room_id: RoomId,
        identity: Identity,
    ) -> Result<Option<AssignmentView>, SantaError> {
        Ok(self.rooms.my_assignment(room_id, identity).await?)
    }

    pub async fn room_info(
        &self,
        room_id: RoomId,
        identity: Identity,
    ) -> Result<RoomInfo, SantaError> {
        Ok(self.rooms.room_info(room_id, identity).await?)
    }

    pub async fn list_participants(
        &self,
        room_id: RoomId,
        identity: Identity,
    ) -> Result<Vec<Participant>, SantaError> {
        Ok(self.rooms.list_participants(room_id, identity).await?)
    }
}
