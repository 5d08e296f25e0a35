//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Password sign-in, registration and reset links
//! - `email` - Email delivery via SMTP
//! - `media` - Uploaded profile pictures on disk

pub mod auth;
pub mod email;
pub mod media;

pub use auth::{AuthError, AuthService, PasswordResetService};
pub use email::{EmailError, EmailService};
pub use media::{MediaError, MediaStore};
