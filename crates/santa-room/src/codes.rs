//! Inserting rows keyed by a freshly generated unique code.

use std::future::Future;

use santa_model::CodeGenerator;
use santa_store::{Constraint, StoreError};

use crate::RoomError;

/// Calls `insert` with new codes until the store accepts one.
///
/// Only a duplicate on `constraint` is retried; any other store error is
/// returned at once. Running out of attempts is a [`RoomError::Conflict`],
/// which the caller may retry as a whole.
pub(crate) async fn insert_with_unique_code<T, F, Fut>(
    codes: &dyn CodeGenerator,
    len: usize,
    attempts: usize,
    constraint: Constraint,
    mut insert: F,
) -> Result<T, RoomError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    for attempt in 1..=attempts {
        match insert(codes.generate(len)).await {
            Ok(row) => return Ok(row),
            Err(e) if e.is_duplicate(constraint) => {
                tracing::debug!(attempt, %constraint, "code collision, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }
    tracing::warn!(attempts, %constraint, "no unique code found");
    Err(RoomError::Conflict(format!(
        "no unique {constraint} after {attempts} attempts"
    )))
}
