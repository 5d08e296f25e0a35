//! Authentication route handlers.
//!
//! Registration creates a customer account with its linked customer
//! profile. Login stores the identity in the session; logout flushes it.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    error::{Result, clear_sentry_user, set_sentry_user},
    filters,
    forms::{
        FormErrors,
        registration::{RegistrationForm, USERNAME_TAKEN},
    },
    middleware::{
        FlashLevel, RequireAnonymous, auth::LOGIN_PATH, push_flash, set_current_user,
    },
    routes::Page,
    services::{AuthError, AuthService},
    state::AppState,
};

const BAD_CREDENTIALS: &str = "Username or Password is incorrect";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: Page,
    pub username: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: Page,
    pub form: RegistrationForm,
    pub errors: FormErrors,
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(_: RequireAnonymous, session: Session) -> impl IntoResponse {
    RegisterTemplate {
        page: Page::load(&session, None).await,
        form: RegistrationForm::default(),
        errors: FormErrors::new(),
    }
}

/// Handle registration form submission.
///
/// On success exactly one user and one linked customer exist and the
/// visitor is sent to the login page.
#[instrument(skip_all)]
pub async fn register(
    _: RequireAnonymous,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegistrationForm>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool());

    let errors = match form.validate() {
        Ok(valid) if auth.username_taken(&valid.username).await? => {
            let mut errors = FormErrors::new();
            errors.add("username", USERNAME_TAKEN);
            errors
        }
        Ok(valid) => match auth.register_customer(&valid).await {
            Ok((user, customer)) => {
                tracing::info!(user_id = %user.id, customer_id = %customer.id, "Customer registered");
                push_flash(
                    &session,
                    FlashLevel::Success,
                    format!("Account was created for {}", user.username),
                )
                .await;
                return Ok(Redirect::to(LOGIN_PATH).into_response());
            }
            Err(AuthError::UserAlreadyExists) => {
                let mut errors = FormErrors::new();
                errors.add("username", USERNAME_TAKEN);
                errors
            }
            Err(e) => return Err(e.into()),
        },
        Err(errors) => errors,
    };

    Ok(RegisterTemplate {
        page: Page::load(&session, None).await,
        form,
        errors,
    }
    .into_response())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(_: RequireAnonymous, session: Session) -> impl IntoResponse {
    LoginTemplate {
        page: Page::load(&session, None).await,
        username: String::new(),
    }
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    _: RequireAnonymous,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match AuthService::new(state.pool())
        .login(&form.username, &form.password)
        .await
    {
        Ok(user) => {
            set_current_user(&session, &user).await?;
            set_sentry_user(&user.id, &user.username);
            tracing::info!(user_id = %user.id, role = %user.role, "User logged in");
            Ok(Redirect::to(user.role.landing_path()).into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Login rejected");
            push_flash(&session, FlashLevel::Info, BAD_CREDENTIALS).await;
            Ok(LoginTemplate {
                page: Page::load(&session, None).await,
                username: form.username,
            }
            .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout: the whole session is discarded.
pub async fn logout(session: Session) -> Result<Response> {
    session.flush().await?;
    clear_sentry_user();
    Ok(Redirect::to(LOGIN_PATH).into_response())
}
