use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, State},
};
use serde::Deserialize;

use crate::api::{Serializer, UserView};
use crate::auth::{ensure_self, generate_slugs, rotate};
use crate::database::models::UserChanges;
use crate::database::store::Store;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UserPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Bodies are optional on user endpoints; an empty body means "no fields"
fn parse_body(body: &Bytes) -> Result<UserPayload, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(UserPayload::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::invalid_json(format!("Invalid JSON: {}", e)))
}

/// POST /users - open registration; the response carries the new credential slugs
pub async fn create(State(state): State<AppState>, body: Bytes) -> ApiResult<UserView> {
    let payload = parse_body(&body)?;
    let slugs = generate_slugs(state.config.security.slug_count);

    let user = state
        .store
        .create_user(slugs, payload.name, payload.email)
        .await?;

    tracing::info!("Registered user {}", user.id);
    Ok(ApiResponse::created(Serializer::new(state.store.as_ref(), Some(user.id)).user(user)))
}

/// GET /users/:id
pub async fn show(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<UserView> {
    let Path(id) = id?;
    ensure_self(current.id, id)?;

    let user = state
        .store
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User {} not found", id)))?;
    Ok(ApiResponse::success(Serializer::new(state.store.as_ref(), Some(current.id)).user(user)))
}

/// PUT|PATCH /users/:id - edit name and email
pub async fn update(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    id: Result<Path<i64>, PathRejection>,
    body: Bytes,
) -> ApiResult<UserView> {
    let Path(id) = id?;
    ensure_self(current.id, id)?;

    let payload = parse_body(&body)?;
    let user = state
        .store
        .update_user(
            id,
            UserChanges {
                name: payload.name,
                email: payload.email,
            },
        )
        .await?;
    Ok(ApiResponse::success(Serializer::new(state.store.as_ref(), Some(current.id)).user(user)))
}

/// POST /users/:id/slugs - issue a fresh slug and retire the oldest
pub async fn rotate_slugs(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<UserView> {
    let Path(id) = id?;
    ensure_self(current.id, id)?;

    let slugs = rotate(&current.random_slugs);
    let user = state.store.set_user_slugs(id, slugs).await?;

    tracing::info!("Rotated credential slugs for user {}", user.id);
    Ok(ApiResponse::success(Serializer::new(state.store.as_ref(), Some(current.id)).user(user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_is_default_payload() {
        let payload = parse_body(&Bytes::new()).unwrap();
        assert!(payload.name.is_none());
        let payload = parse_body(&Bytes::from_static(b"  \n")).unwrap();
        assert!(payload.email.is_none());
    }

    #[test]
    fn parses_profile_fields() {
        let payload = parse_body(&Bytes::from_static(br#"{"name": "Ada", "email": "ada@example.org"}"#)).unwrap();
        assert_eq!(payload.name.as_deref(), Some("Ada"));
        assert_eq!(payload.email.as_deref(), Some("ada@example.org"));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = parse_body(&Bytes::from_static(b"{not json")).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_JSON");
    }
}
