//! Permission gates.
//!
//! Each gate is an extractor. A request that fails a gate is answered with a
//! redirect, never an error page: anonymous visitors go to the login page and
//! signed-in users lacking the role go to their own landing page.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use storekeep_core::{CustomerId, Role};

use crate::models::{CurrentUser, session_keys};

/// Path of the login page.
pub const LOGIN_PATH: &str = "/login/";

/// Who may pass a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Signed-in users with the admin role.
    Admin,
    /// Signed-in customers with a linked customer profile.
    Customer,
    /// Signed-out visitors only.
    Anonymous,
}

/// Decide whether a user passes a gate.
///
/// Returns the path to redirect to on failure.
#[must_use]
pub fn gate(user: Option<&CurrentUser>, requirement: Requirement) -> Result<(), &'static str> {
    match (requirement, user) {
        (Requirement::Anonymous, None) => Ok(()),
        (Requirement::Anonymous, Some(user)) => Err(user.role.landing_path()),
        (_, None) => Err(LOGIN_PATH),
        (Requirement::Admin, Some(user)) => match user.role {
            Role::Admin => Ok(()),
            Role::Customer => Err(Role::Customer.landing_path()),
        },
        (Requirement::Customer, Some(user)) => match (user.role, user.customer_id) {
            (Role::Customer, Some(_)) => Ok(()),
            // Customer account whose profile is gone.
            (Role::Customer, None) => Err(LOGIN_PATH),
            (Role::Admin, _) => Err(Role::Admin.landing_path()),
        },
    }
}

/// Rejection for every gate: a redirect to the decided path.
#[derive(Debug)]
pub struct GateRedirect(pub &'static str);

impl IntoResponse for GateRedirect {
    fn into_response(self) -> Response {
        Redirect::to(self.0).into_response()
    }
}

/// Read the signed-in user from the request's session, if any.
async fn session_user(parts: &Parts) -> (Option<Session>, Option<CurrentUser>) {
    let Some(session) = parts.extensions.get::<Session>().cloned() else {
        return (None, None);
    };
    let user = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten();
    (Some(session), user)
}

/// Run a gate against the request, forgetting an identity that can no
/// longer reach any page.
async fn check(parts: &Parts, requirement: Requirement) -> Result<Option<CurrentUser>, GateRedirect> {
    let (session, user) = session_user(parts).await;
    match gate(user.as_ref(), requirement) {
        Ok(()) => Ok(user),
        Err(target) => {
            if target == LOGIN_PATH
                && user.is_some()
                && let Some(session) = session
                && let Err(e) = clear_current_user(&session).await
            {
                tracing::warn!(error = %e, "Failed to clear stale session identity");
            }
            Err(GateRedirect(target))
        }
    }
}

/// Extractor that requires the admin role.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.username)
/// }
/// ```
pub struct RequireAdmin(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = GateRedirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        check(parts, Requirement::Admin)
            .await?
            .map(Self)
            .ok_or(GateRedirect(LOGIN_PATH))
    }
}

/// Extractor that requires a customer account with a linked profile.
///
/// Yields the user and their customer id.
pub struct RequireCustomer(pub CurrentUser, pub CustomerId);

impl<S> FromRequestParts<S> for RequireCustomer
where
    S: Send + Sync,
{
    type Rejection = GateRedirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = check(parts, Requirement::Customer)
            .await?
            .ok_or(GateRedirect(LOGIN_PATH))?;
        let customer_id = user.customer_id.ok_or(GateRedirect(LOGIN_PATH))?;
        Ok(Self(user, customer_id))
    }
}

/// Extractor that only lets signed-out visitors through (login, register).
pub struct RequireAnonymous;

impl<S> FromRequestParts<S> for RequireAnonymous
where
    S: Send + Sync,
{
    type Rejection = GateRedirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        check(parts, Requirement::Anonymous).await?;
        Ok(Self)
    }
}

/// Extractor that optionally gets the current user, for the navigation bar.
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await.1))
    }
}

/// Store the signed-in user in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Remove the signed-in user from the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}
