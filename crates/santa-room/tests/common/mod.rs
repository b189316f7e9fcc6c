//! Shared wiring for the room-layer integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use santa_draw::{AssignmentEngine, RoomLocks};
use santa_model::{CodeGenerator, Identity, RandomCodeGenerator};
use santa_room::{MembershipManager, RoomController, SantaConfig};
use santa_store::Store;

pub struct Harness<S> {
    pub store: Arc<S>,
    pub rooms: RoomController<S>,
    pub members: MembershipManager<S>,
}

/// Wires a controller and a membership manager over `store`, sharing one
/// engine and one lock registry the way the service does.
pub fn harness<S: Store>(store: S) -> Harness<S> {
    harness_with(store, Arc::new(RandomCodeGenerator::seeded(7)), SantaConfig::default())
}

pub fn harness_with<S: Store>(
    store: S,
    codes: Arc<dyn CodeGenerator>,
    config: SantaConfig,
) -> Harness<S> {
    let store = Arc::new(store);
    let engine = Arc::new(
        AssignmentEngine::seeded(Arc::clone(&store), RoomLocks::new(), 99)
            .with_min_participants(config.effective_min_participants()),
    );
    let members = MembershipManager::new(
        Arc::clone(&store),
        engine.locks().clone(),
        Arc::clone(&codes),
        config.clone(),
    );
    let rooms = RoomController::new(Arc::clone(&store), engine, codes, config);
    Harness {
        store,
        rooms,
        members,
    }
}

pub fn uid(id: u64) -> Identity {
    Identity(id)
}
