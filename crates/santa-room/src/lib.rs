//! Room lifecycle and membership for Secret Santa.
//!
//! This is the layer the Messaging Gateway talks to. It owns every rule
//! about *who* may do *what* to a room, and leaves the *how* of a draw
//! to [`santa_draw`].
//!
//! # Key types
//!
//! - [`RoomController`]: room creation, the draw, queries, profile edits
//! - [`MembershipManager`]: invitations, joining, leaving
//! - [`SantaConfig`]: code lengths, limits, RNG seed
//! - [`RoomError`]: the error taxonomy callers match on
//!
//! Both front types must be built over the same store and the same
//! [`RoomLocks`](santa_draw::RoomLocks) as the engine; the `santa` crate's
//! builder does that wiring.

mod codes;
mod config;
mod controller;
mod error;
mod membership;

pub use config::SantaConfig;
pub use controller::{AssignmentView, RoomController, RoomInfo};
pub use error::{Missing, RoomError};
pub use membership::MembershipManager;
