use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{authenticate, AuthenticateError};
use crate::database::models::User;
use crate::error::ApiError;
use crate::state::AppState;

/// Identity resolved for the current request; `None` for anonymous callers
#[derive(Clone, Debug)]
pub struct CurrentUser(pub Option<User>);

/// Slug authentication middleware.
///
/// Requests without an `Authorization` header pass through as anonymous.
/// A header that is malformed or names no known slug is rejected with 401.
pub async fn slug_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let header_value = match request.headers().get(header::AUTHORIZATION) {
        Some(value) => match value.to_str() {
            Ok(s) => Some(s.to_string()),
            Err(_) => {
                return ApiError::unauthorized("Invalid Authorization header format").into_response()
            }
        },
        None => None,
    };

    let user = match authenticate(state.store.as_ref(), header_value.as_deref()).await {
        Ok(user) => user,
        Err(AuthenticateError::Rejected(reason)) => {
            tracing::debug!("Rejected credentials on {}: {}", request.uri().path(), reason);
            return ApiError::unauthorized(reason.to_string()).into_response();
        }
        Err(AuthenticateError::Store(err)) => return ApiError::from(err).into_response(),
    };

    if let Some(user) = &user {
        tracing::debug!("Authenticated user {}", user.id);
    }

    request.extensions_mut().insert(CurrentUser(user));
    next.run(request).await
}

/// Extractor for endpoints that require an authenticated user
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

/// Extractor for endpoints open to anonymous callers
#[derive(Clone, Debug)]
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.id)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<CurrentUser>() {
            Some(CurrentUser(Some(user))) => Ok(AuthUser(user.clone())),
            _ => Err(ApiError::unauthorized(
                "Authentication credentials were not provided",
            )),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<CurrentUser>()
            .and_then(|CurrentUser(user)| user.clone());
        Ok(MaybeUser(user))
    }
}
