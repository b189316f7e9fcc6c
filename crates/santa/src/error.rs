//! Unified error type for the Secret Santa service.

use santa_draw::DrawError;
use santa_room::RoomError;
use santa_store::StoreError;

/// Top-level error that wraps all crate-specific errors.
///
/// Callers of the `santa` facade match on this one type instead of
/// importing each layer's error. The facade's own methods always report
/// through [`Room`](Self::Room), which already carries room-level
/// context. [`Store`](Self::Store) and [`Draw`](Self::Draw) exist as `?`
/// targets for gateway code that also calls `santa_store` or `santa_draw`
/// directly and wants one error type for both.
#[derive(Debug, thiserror::Error)]
pub enum SantaError {
    /// A persistence failure from direct `santa_store` calls.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A failure from direct `santa_draw` calls.
    #[error(transparent)]
    Draw(#[from] DrawError),

    /// A room, membership, or configuration failure.
    #[error(transparent)]
    Room(#[from] RoomError),
}

impl SantaError {
    /// The room-level reading of this error, for gateways that only
    /// want to match one taxonomy.
    pub fn into_room_error(self) -> RoomError {
        match self {
            Self::Store(e) => e.into(),
            Self::Draw(e) => e.into(),
            Self::Room(e) => e,
        }
    }

    /// Returns `true` if the caller may repeat the request.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(_) => false,
            Self::Draw(e) => matches!(e, DrawError::Conflict(_)),
            Self::Room(e) => e.is_retryable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use santa_model::RoomId;

    use super::*;

    #[test]
    fn test_from_store_error() {
        let err = StoreError::Unavailable("gone".into());
        let santa_err: SantaError = err.into();
        assert!(matches!(santa_err, SantaError::Store(_)));
        assert!(santa_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_draw_error() {
        let err = DrawError::Conflict(RoomId(1));
        let santa_err: SantaError = err.into();
        assert!(matches!(santa_err, SantaError::Draw(_)));
        assert!(santa_err.is_retryable());
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::AlreadyAccepted;
        let santa_err: SantaError = err.into();
        assert!(matches!(santa_err, SantaError::Room(_)));
        assert!(!santa_err.is_retryable());
    }

    fn read_room(fail: bool) -> Result<(), StoreError> {
        if fail {
            Err(StoreError::NotFound("room"))
        } else {
            Ok(())
        }
    }

    fn draw_room() -> Result<(), DrawError> {
        Err(DrawError::Conflict(RoomId(9)))
    }

    fn gateway_step(fail_read: bool) -> Result<(), SantaError> {
        read_room(fail_read)?;
        draw_room()?;
        Ok(())
    }

    #[test]
    fn test_question_mark_lifts_layer_errors() {
        let err = gateway_step(true).unwrap_err();
        assert!(matches!(err, SantaError::Store(StoreError::NotFound(_))));
        assert!(!err.is_retryable());

        let err = gateway_step(false).unwrap_err();
        assert!(matches!(err, SantaError::Draw(DrawError::Conflict(RoomId(9)))));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_into_room_error_flattens_layers() {
        let santa_err: SantaError = DrawError::AlreadyDrawn(RoomId(4)).into();
        assert!(matches!(
            santa_err.into_room_error(),
            RoomError::AlreadyDrawn(RoomId(4))
        ));

        let santa_err: SantaError = StoreError::Unavailable("x".into()).into();
        assert!(matches!(
            santa_err.into_room_error(),
            RoomError::StoreUnavailable(_)
        ));
    }
}
