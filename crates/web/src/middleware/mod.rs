//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, added by `main`)
//! 2. Session layer (tower-sessions with `PostgreSQL` store, added by `main`)
//! 3. `TraceLayer` (request tracing)
//! 4. Request ID (add unique ID to each request)
//! 5. Security headers (CSP, frame and sniffing protection)
//! 6. Rate limiting on auth form posts (governor)
//!
//! Permission gates are extractors in [`auth`], not layers.

pub mod auth;
pub mod flash;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    OptionalUser, RequireAdmin, RequireAnonymous, RequireCustomer,
    clear_current_user, set_current_user,
};
pub use flash::{FlashLevel, FlashMessage, push_flash, take_flashes};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, session_layer};
