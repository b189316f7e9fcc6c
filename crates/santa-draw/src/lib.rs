//! The assignment engine for Secret Santa.
//!
//! Given a room's roster, the engine produces the giver → recipient
//! mapping and commits it. It is split in two:
//!
//! - [`compute_assignments`]: a pure function: shuffle, then pair each
//!   person with the next one around the circle.
//! - [`AssignmentEngine`]: reads the roster, calls the pure function,
//!   and persists the result so that the room's `is_drawn` flag and its
//!   assignment rows always agree.
//!
//! # Concurrency
//!
//! Every write to a room happens while holding that room's lock from
//! [`RoomLocks`]. The engine additionally flips `is_drawn` through the
//! store's compare-and-set before writing any assignment, so a second
//! process sharing the store cannot double-draw either. Rooms never wait
//! on each other.

mod cycle;
mod engine;
mod error;
mod locks;

pub use cycle::{Pairing, compute_assignments, cycle_from_order};
pub use engine::AssignmentEngine;
pub use error::DrawError;
pub use locks::{RoomGuard, RoomLocks};

/// The smallest room a draw can run on. With one person the only cycle
/// is a self-loop.
pub const MIN_PARTICIPANTS: usize = 2;
