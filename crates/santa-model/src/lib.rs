//! Data model for the Secret Santa gift exchange.
//!
//! This crate defines the nouns every other layer talks about:
//!
//! - **Identifiers** ([`RoomId`], [`Identity`], ...): typed handles so a
//!   room id can never be passed where a person is expected.
//! - **Entities** ([`Room`], [`Participant`], [`Invitation`],
//!   [`Assignment`]): the records the persistence store keeps.
//! - **State machine** ([`RoomState`]): `Open` until the draw, `Drawn`
//!   forever after.
//! - **Codes** ([`CodeGenerator`]): the short shareable tokens used for
//!   room and invitation codes.
//!
//! # Architecture
//!
//! ```text
//! santa-room (controller, membership)
//!     ↕
//! santa-draw (assignment engine)
//!     ↕
//! santa-store (entity store interface)
//!     ↕
//! santa-model (this crate)
//! ```

mod code;
mod entity;
mod state;
mod types;

pub use code::{CODE_ALPHABET, CodeGenerator, RandomCodeGenerator};
pub use entity::{
    Assignment, Invitation, NewAssignment, NewInvitation, NewParticipant,
    NewRoom, Participant, Room,
};
pub use state::RoomState;
pub use types::{AssignmentId, Identity, InvitationId, ParticipantId, RoomId};
