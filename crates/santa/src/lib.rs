//! # Secret Santa
//!
//! A gift-exchange engine: people gather in rooms, the room's creator
//! triggers a draw, and everybody learns whom they buy a present for.
//! Nobody draws themselves and everybody gives and receives exactly once.
//!
//! The service is transport-agnostic. A Messaging Gateway (a chat bot,
//! an HTTP API) calls into [`SecretSanta`] with the caller's identity
//! and renders the structured results it gets back.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use santa::prelude::*;
//!
//! # async fn run() -> Result<(), SantaError> {
//! let santa = SecretSantaBuilder::new().build(MemoryStore::new())?;
//!
//! let room = santa.create_room("Office", Identity(1), "Ann").await?;
//! santa.join_by_code(&room.code, Identity(2), "Bob").await?;
//! santa.draw(room.id, Identity(1)).await?;
//!
//! let mine = santa.my_assignment(room.id, Identity(2)).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod service;

pub use error::SantaError;
pub use service::{SecretSanta, SecretSantaBuilder};

/// Installs a `tracing` subscriber that prints to stderr.
///
/// The filter comes from `RUST_LOG` and falls back to `info`. Calling
/// this twice is harmless; the second call does nothing.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// Convenience re-exports for gateway code.
pub mod prelude {
    pub use crate::{SantaError, SecretSanta, SecretSantaBuilder, init_tracing};
    pub use santa_model::{
        Assignment, CodeGenerator, Identity, Invitation, Participant,
        RandomCodeGenerator, Room, RoomId, RoomState,
    };
    pub use santa_room::{
        AssignmentView, Missing, RoomError, RoomInfo, SantaConfig,
    };
    pub use santa_store::{MemoryStore, Store, StoreError};
}
