//! Identifier newtypes.
//!
//! Every entity in the store is keyed by one of these. They are all thin
//! wrappers around `u64`: the store hands out ids, the transport hands out
//! identities, and nothing in the core ever does arithmetic on them.

use serde::{Deserialize, Serialize};

use std::fmt;

/// Declares a `u64` newtype with the derives every id needs and a
/// `Display` impl that prints `<prefix>-<n>`.
///
/// `#[serde(transparent)]` keeps the JSON shape a plain number, so
/// `RoomId(7)` serializes as `7` rather than `{"0":7}`.
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

id_type!(
    /// A unique identifier for a room (one gift-exchange game).
    RoomId,
    "R"
);

id_type!(
    /// An opaque, stable, externally issued handle for a person.
    ///
    /// The transport supplies this on every call; the core never invents
    /// or verifies one. It is unique across the whole system, and unique
    /// per room among participants.
    Identity,
    "U"
);

id_type!(
    /// Row id of a participant record.
    ParticipantId,
    "P"
);

id_type!(
    /// Row id of an invitation record.
    InvitationId,
    "I"
);

id_type!(
    /// Row id of a single giver → recipient assignment.
    AssignmentId,
    "A"
);
