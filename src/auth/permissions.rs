use crate::error::ApiError;

/// Mutations are reserved for the resource owner
pub fn ensure_owner(user_id: i64, owner_id: i64) -> Result<(), ApiError> {
    if user_id != owner_id {
        tracing::warn!("User {} denied write access to resource owned by {}", user_id, owner_id);
        return Err(ApiError::forbidden(
            "You do not have permission to perform this action",
        ));
    }
    Ok(())
}

/// User records are only visible and editable by the user themselves
pub fn ensure_self(user_id: i64, target_id: i64) -> Result<(), ApiError> {
    if user_id != target_id {
        return Err(ApiError::forbidden("You may only access your own user record"));
    }
    Ok(())
}
