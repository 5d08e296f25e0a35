//! Password reset links.
//!
//! A link is `/reset/{uidb64}/{token}/`: the user id encoded as unpadded
//! URL-safe base64 and a random token. Only the token's SHA-256 digest is
//! stored. Tokens expire after [`RESET_TOKEN_TTL_DAYS`] and are spent on use.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use storekeep_core::{Email, UserId};

use super::{AuthError, hash_password};
use crate::db::RepositoryError;
use crate::db::password_resets::PasswordResetRepository;
use crate::db::users::UserRepository;
use crate::models::User;

/// Days a reset link stays valid.
pub const RESET_TOKEN_TTL_DAYS: i64 = 3;

/// Random bytes per token.
const TOKEN_BYTES: usize = 32;

/// A reset link issued for one account.
#[derive(Debug, Clone)]
pub struct IssuedReset {
    pub user: User,
    /// Site-relative path of the reset link.
    pub path: String,
}

/// Encode a user id for a reset link.
#[must_use]
pub fn encode_uid(id: UserId) -> String {
    URL_SAFE_NO_PAD.encode(id.to_string())
}

/// Decode the user id from a reset link.
#[must_use]
pub fn decode_uid(uidb64: &str) -> Option<UserId> {
    let bytes = URL_SAFE_NO_PAD.decode(uidb64).ok()?;
    String::from_utf8(bytes).ok()?.parse().ok()
}

/// Generate a fresh random token.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest stored in place of the token.
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Site-relative reset link path.
#[must_use]
pub fn reset_path(id: UserId, token: &str) -> String {
    format!("/reset/{}/{token}/", encode_uid(id))
}

/// Issues and redeems password reset links.
pub struct PasswordResetService<'a> {
    users: UserRepository<'a>,
    tokens: PasswordResetRepository<'a>,
}

impl<'a> PasswordResetService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens: PasswordResetRepository::new(pool),
        }
    }

    /// Issue a link for every account registered with `email`.
    ///
    /// An unknown address yields no links and no error, so callers cannot
    /// tell whether an account exists.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if a query fails.
    pub async fn issue(&self, email: &Email, now: DateTime<Utc>) -> Result<Vec<IssuedReset>, AuthError> {
        let users = self.users.list_by_email(email).await?;
        let expires_at = now + Duration::days(RESET_TOKEN_TTL_DAYS);
        let mut issued = Vec::with_capacity(users.len());

        for user in users {
            let token = generate_token();
            self.tokens
                .create(user.id, &hash_token(&token), expires_at)
                .await?;
            issued.push(IssuedReset {
                path: reset_path(user.id, &token),
                user,
            });
        }

        Ok(issued)
    }

    /// The account a link belongs to, if the link is still usable.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetLink` if the link is malformed, unknown,
    /// spent or expired.
    pub async fn check(&self, uidb64: &str, token: &str, now: DateTime<Utc>) -> Result<User, AuthError> {
        let user_id = decode_uid(uidb64).ok_or(AuthError::InvalidResetLink)?;
        if !self.tokens.is_valid(user_id, &hash_token(token), now).await? {
            return Err(AuthError::InvalidResetLink);
        }
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidResetLink)
    }

    /// Set a new password and spend the link.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetLink` if the link stopped being usable.
    pub async fn complete(
        &self,
        user: &User,
        token: &str,
        new_password: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let password_hash = hash_password(new_password)?;
        self.tokens
            .consume(user.id, &hash_token(token), &password_hash, now)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::InvalidResetLink,
                other => AuthError::Repository(other),
            })
    }
}
