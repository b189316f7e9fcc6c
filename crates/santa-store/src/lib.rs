//! Entity store interface for Secret Santa.
//!
//! The core never talks to a database directly. It depends on four small
//! traits, one per entity, and anything that implements all four (the
//! [`Store`] capability set) can back a running service:
//!
//! 1. [`RoomStore`]: rooms, their codes, and the conditional draw flag
//! 2. [`ParticipantStore`]: per-room rosters
//! 3. [`InvitationStore`]: invitations and the conditional accept flag
//! 4. [`AssignmentStore`]: the committed giver → recipient cycle
//!
//! [`MemoryStore`] implements all of them in process and is what the
//! tests and the demo run against.
//!
//! # Conditional primitives
//!
//! Two operations are compare-and-set rather than blind writes:
//! [`RoomStore::mark_drawn`] and [`InvitationStore::mark_accepted`]. Each
//! returns `Ok(true)` only for the caller that actually flipped the flag,
//! so two writers sharing one store can never both win.

#![allow(async_fn_in_trait)]

mod error;
mod memory;
mod store;
#[cfg(feature = "testing")]
pub mod testing;

pub use error::{Constraint, StoreError};
pub use memory::MemoryStore;
pub use store::{
    AssignmentStore, InvitationStore, ParticipantStore, RoomStore, Store,
};
