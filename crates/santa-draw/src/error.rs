//! Error types for the draw layer.

use santa_model::{Identity, RoomId};
use santa_store::StoreError;

/// Errors that can occur while computing or committing a draw.
#[derive(Debug, thiserror::Error)]
pub enum DrawError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room already has a committed draw.
    #[error("room {0} has already been drawn")]
    AlreadyDrawn(RoomId),

    /// Too few people to form a cycle without self-assignment.
    #[error("a draw needs at least {required} participants, found {found}")]
    InsufficientParticipants { required: usize, found: usize },

    /// The same identity was listed twice.
    #[error("identity {0} appears more than once in the roster")]
    DuplicateParticipant(Identity),

    /// Another writer flipped the draw flag first.
    #[error("lost the race to draw room {0}")]
    Conflict(RoomId),

    /// The store failed. Any partial writes were rolled back before this
    /// was returned.
    #[error(transparent)]
    Store(#[from] StoreError),
}
