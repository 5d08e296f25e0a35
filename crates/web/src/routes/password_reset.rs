//! Password reset route handlers.
//!
//! The flow is request → sent → emailed link → new password → complete.
//! The request page always ends on the "sent" page so it cannot be used to
//! find out which addresses have accounts.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;
use tracing::instrument;

use storekeep_core::Email;

use crate::{
    error::Result,
    filters,
    forms::{
        FormErrors,
        password::{PasswordResetRequestForm, SetPasswordForm},
    },
    middleware::OptionalUser,
    models::{CurrentUser, User},
    routes::Page,
    services::{AuthError, PasswordResetService, auth::reset::RESET_TOKEN_TTL_DAYS},
    state::AppState,
};

const SENT_PATH: &str = "/reset_password_sent/";
const COMPLETE_PATH: &str = "/reset_password_complete/";

// =============================================================================
// Templates
// =============================================================================

/// Reset request page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/password_reset.html")]
pub struct PasswordResetTemplate {
    pub page: Page,
    pub email: String,
    pub errors: FormErrors,
}

/// "Check your inbox" page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/password_reset_sent.html")]
pub struct PasswordResetSentTemplate {
    pub page: Page,
}

/// New password page template. Also shown for dead links.
#[derive(Template, WebTemplate)]
#[template(path = "auth/password_reset_form.html")]
pub struct PasswordResetFormTemplate {
    pub page: Page,
    pub valid_link: bool,
    pub errors: FormErrors,
}

/// Reset complete page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/password_reset_done.html")]
pub struct PasswordResetDoneTemplate {
    pub page: Page,
}

// =============================================================================
// Request
// =============================================================================

/// Display the reset request form.
pub async fn request_page(OptionalUser(user): OptionalUser, session: Session) -> impl IntoResponse {
    PasswordResetTemplate {
        page: Page::load(&session, user).await,
        email: String::new(),
        errors: FormErrors::new(),
    }
}

/// Handle the reset request.
///
/// Every account with the address gets its own link. Without SMTP the
/// links are written to the log instead.
#[instrument(skip_all)]
pub async fn request(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    session: Session,
    Form(form): Form<PasswordResetRequestForm>,
) -> Result<Response> {
    let email = match form.validate() {
        Ok(email) => email,
        Err(errors) => {
            return Ok(PasswordResetTemplate {
                page: Page::load(&session, user).await,
                email: form.email,
                errors,
            }
            .into_response());
        }
    };

    let issued = PasswordResetService::new(state.pool())
        .issue(&email, Utc::now())
        .await?;

    for reset in issued {
        let reset_url = state.config().absolute_url(&reset.path);
        match state.email() {
            Some(mailer) => {
                if let Err(e) = mailer
                    .send_password_reset(
                        reset.user.email.as_ref().unwrap_or(&email).as_str(),
                        &reset.user.username,
                        &reset_url,
                        RESET_TOKEN_TTL_DAYS,
                    )
                    .await
                {
                    let event_id = sentry::capture_error(&e);
                    tracing::error!(
                        error = %e,
                        user_id = %reset.user.id,
                        sentry_event_id = %event_id,
                        "Failed to send password reset email"
                    );
                }
            }
            None => {
                tracing::warn!(
                    user_id = %reset.user.id,
                    reset_url = %reset_url,
                    "SMTP not configured; password reset link not emailed"
                );
            }
        }
    }

    Ok(Redirect::to(SENT_PATH).into_response())
}

/// Display the "check your inbox" page.
pub async fn sent(OptionalUser(user): OptionalUser, session: Session) -> impl IntoResponse {
    PasswordResetSentTemplate {
        page: Page::load(&session, user).await,
    }
}

// =============================================================================
// Confirm
// =============================================================================

/// The account behind a reset link, or `None` if the link is dead.
async fn linked_user(state: &AppState, uidb64: &str, token: &str) -> Result<Option<User>> {
    match PasswordResetService::new(state.pool())
        .check(uidb64, token, Utc::now())
        .await
    {
        Ok(user) => Ok(Some(user)),
        Err(AuthError::InvalidResetLink) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Display the new password form for a reset link.
pub async fn confirm_page(
    State(state): State<AppState>,
    OptionalUser(current): OptionalUser,
    session: Session,
    Path((uidb64, token)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let valid_link = linked_user(&state, &uidb64, &token).await?.is_some();

    Ok(PasswordResetFormTemplate {
        page: Page::load(&session, current).await,
        valid_link,
        errors: FormErrors::new(),
    })
}

/// Set the new password and spend the link.
#[instrument(skip_all)]
pub async fn confirm(
    State(state): State<AppState>,
    OptionalUser(current): OptionalUser,
    session: Session,
    Path((uidb64, token)): Path<(String, String)>,
    Form(form): Form<SetPasswordForm>,
) -> Result<Response> {
    let Some(user) = linked_user(&state, &uidb64, &token).await? else {
        return Ok(dead_link(&session, current).await);
    };

    let errors = match form.validate(&user.username, user.email.as_ref().map(Email::as_str)) {
        Ok(password) => {
            match PasswordResetService::new(state.pool())
                .complete(&user, &token, password, Utc::now())
                .await
            {
                Ok(()) => {
                    tracing::info!(user_id = %user.id, "Password reset completed");
                    return Ok(Redirect::to(COMPLETE_PATH).into_response());
                }
                Err(AuthError::InvalidResetLink) => {
                    return Ok(dead_link(&session, current).await);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(errors) => errors,
    };

    Ok(PasswordResetFormTemplate {
        page: Page::load(&session, current).await,
        valid_link: true,
        errors,
    }
    .into_response())
}

async fn dead_link(session: &Session, current: Option<CurrentUser>) -> Response {
    PasswordResetFormTemplate {
        page: Page::load(session, current).await,
        valid_link: false,
        errors: FormErrors::new(),
    }
    .into_response()
}

/// Display the reset complete page.
pub async fn complete(OptionalUser(user): OptionalUser, session: Session) -> impl IntoResponse {
    PasswordResetDoneTemplate {
        page: Page::load(&session, user).await,
    }
}
