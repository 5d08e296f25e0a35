//! User domain types.

use chrono::{DateTime, Utc};

use storekeep_core::{Email, Role, UserId};

/// An account that can sign in (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Optional address used for password resets.
    pub email: Option<Email>,
    /// Every account has exactly one role.
    pub role: Role,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}
