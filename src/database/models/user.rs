use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    /// Credential slugs, newest first. Any of them authenticates the user.
    pub random_slugs: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_slug(&self, slug: &str) -> bool {
        self.random_slugs.iter().any(|s| s == slug)
    }
}

/// Editable profile fields; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
}
