//! Customer domain types.

use chrono::{DateTime, Utc};

use storekeep_core::{CustomerId, UserId};

/// A customer profile.
///
/// Self-registered customers are linked to the account that created them;
/// customers added from the CLI have no account.
#[derive(Debug, Clone)]
pub struct Customer {
    pub id: CustomerId,
    pub user_id: Option<UserId>,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Path of the profile picture relative to the media directory.
    pub profile_pic: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// URL of the profile picture, if one was uploaded.
    #[must_use]
    pub fn profile_pic_url(&self) -> Option<String> {
        self.profile_pic
            .as_deref()
            .map(|path| format!("/media/{path}"))
    }
}

/// A customer together with how many orders they have placed.
#[derive(Debug, Clone)]
pub struct CustomerSummary {
    pub customer: Customer,
    pub order_count: i64,
}

/// What to do with the stored profile picture on an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PictureChange {
    Keep,
    /// Store a newly uploaded picture at this media-relative path.
    Replace(String),
    Clear,
}

/// Validated account-settings changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub profile_pic: PictureChange,
}
