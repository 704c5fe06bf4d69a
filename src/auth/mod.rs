pub mod permissions;
pub mod slugs;

pub use permissions::{ensure_owner, ensure_self};
pub use slugs::{generate_slug, generate_slugs, rotate};

use thiserror::Error;

use crate::database::models::User;
use crate::database::store::{Store, StoreError};

/// Why a presented credential was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authorization header must use Bearer token format")]
    InvalidHeader,
    #[error("Empty bearer token")]
    EmptyToken,
    #[error("Invalid token")]
    UnknownToken,
}

/// Pull the slug out of an `Authorization: Bearer <slug>` value
pub fn parse_bearer(header: &str) -> Result<&str, AuthError> {
    let mut parts = header.trim().splitn(2, char::is_whitespace);
    match (parts.next(), parts.next()) {
        (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") => {
            let token = token.trim();
            if token.is_empty() {
                Err(AuthError::EmptyToken)
            } else {
                Ok(token)
            }
        }
        (Some(scheme), None) if scheme.eq_ignore_ascii_case("bearer") => Err(AuthError::EmptyToken),
        _ => Err(AuthError::InvalidHeader),
    }
}

/// Resolve an optional `Authorization` header value to a user.
///
/// `Ok(None)` means the request is anonymous; an unusable or unknown
/// credential is an error rather than a silent downgrade to anonymous.
pub async fn authenticate(
    store: &dyn Store,
    header: Option<&str>,
) -> Result<Option<User>, AuthenticateError> {
    let Some(header) = header else {
        return Ok(None);
    };

    let slug = parse_bearer(header).map_err(AuthenticateError::Rejected)?;
    match store.find_user_by_slug(slug).await? {
        Some(user) => Ok(Some(user)),
        None => Err(AuthenticateError::Rejected(AuthError::UnknownToken)),
    }
}

#[derive(Debug, Error)]
pub enum AuthenticateError {
    #[error("Credentials rejected: {0}")]
    Rejected(AuthError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    #[test]
    fn parses_bearer_tokens() {
        assert_eq!(parse_bearer("Bearer abc123"), Ok("abc123"));
        assert_eq!(parse_bearer("bearer   abc123 "), Ok("abc123"));
        assert_eq!(parse_bearer("Bearer "), Err(AuthError::EmptyToken));
        assert_eq!(parse_bearer("Bearer"), Err(AuthError::EmptyToken));
        assert_eq!(parse_bearer("Basic dXNlcjpwYXNz"), Err(AuthError::InvalidHeader));
        assert_eq!(parse_bearer(""), Err(AuthError::InvalidHeader));
    }

    #[test]
    fn errors_display_their_reason() {
        assert_eq!(AuthError::UnknownToken.to_string(), "Invalid token");
        let err = AuthenticateError::Rejected(AuthError::EmptyToken);
        assert_eq!(err.to_string(), "Credentials rejected: Empty bearer token");
        let err: AuthenticateError = StoreError::NotFound("user 1".into()).into();
        assert_eq!(err.to_string(), "Not found: user 1");
    }

    #[tokio::test]
    async fn missing_header_is_anonymous() {
        let store = MemoryStore::new();
        assert!(matches!(authenticate(&store, None).await, Ok(None)));
    }

    #[tokio::test]
    async fn known_slug_authenticates() {
        let store = MemoryStore::new();
        let user = store
            .create_user(vec!["first".into(), "second".into()], None, None)
            .await
            .unwrap();

        let found = authenticate(&store, Some("Bearer second")).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn unknown_slug_is_rejected() {
        let store = MemoryStore::new();
        store.create_user(vec!["first".into()], None, None).await.unwrap();

        assert!(matches!(
            authenticate(&store, Some("Bearer nope")).await,
            Err(AuthenticateError::Rejected(AuthError::UnknownToken))
        ));
    }
}
