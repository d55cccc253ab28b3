use tracing::warn;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::Identity;

/// Succeeds only when `owner` is the requester. Ownerless rows belong to
/// nobody. The caller turns the failure into the same 404 as a missing row.
pub fn ensure_owner(owner: Option<Uuid>, requester: &Identity) -> Result<(), ApiError> {
    if owner == Some(requester.user_id) {
        return Ok(());
    }

    warn!(
        "Ownership check failed: {} ({}) is not the owner",
        requester.username, requester.user_id
    );
    Err(ApiError::AccessDenied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            username: "alice".into(),
        }
    }

    #[test]
    fn owner_passes() {
        let me = identity();
        assert!(ensure_owner(Some(me.user_id), &me).is_ok());
    }

    #[test]
    fn other_owner_is_denied() {
        let me = identity();
        let result = ensure_owner(Some(Uuid::new_v4()), &me);
        assert!(matches!(result, Err(ApiError::AccessDenied)));
    }

    #[test]
    fn ownerless_is_denied() {
        assert!(matches!(ensure_owner(None, &identity()), Err(ApiError::AccessDenied)));
    }
}
