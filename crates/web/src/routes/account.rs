//! Account settings route handlers.
//!
//! Customers edit their own profile here. The picture upload arrives as
//! `multipart/form-data`; accepted images are written to the media store
//! before the row is updated, and a replaced or cleared picture is removed
//! from disk afterwards.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use storekeep_core::CustomerId;

use crate::{
    db::CustomerRepository,
    error::Result,
    filters,
    forms::{
        FormErrors,
        customer::{CLEAR_FIELD, CustomerForm, PictureAction},
    },
    middleware::{FlashLevel, RequireCustomer, auth::LOGIN_PATH, clear_current_user, push_flash},
    models::{
        Customer, CurrentUser,
        customer::{PictureChange, ProfileUpdate},
    },
    routes::Page,
    state::AppState,
};

/// Account settings template.
#[derive(Template, WebTemplate)]
#[template(path = "accounts/account_settings.html")]
pub struct AccountSettingsTemplate {
    pub page: Page,
    pub customer: Customer,
    pub form: CustomerForm,
    pub errors: FormErrors,
    pub clear_field: &'static str,
}

impl AccountSettingsTemplate {
    async fn render_for(
        session: &Session,
        user: CurrentUser,
        customer: Customer,
        form: CustomerForm,
        errors: FormErrors,
    ) -> Self {
        Self {
            page: Page::load(session, Some(user)).await,
            customer,
            form,
            errors,
            clear_field: CLEAR_FIELD,
        }
    }
}

/// Load the signed-in customer's profile.
///
/// A session pointing at a deleted profile is signed out.
async fn load_customer(
    state: &AppState,
    session: &Session,
    customer_id: CustomerId,
) -> Result<Option<Customer>> {
    let customer = CustomerRepository::new(state.pool()).get(customer_id).await?;
    if customer.is_none() {
        tracing::warn!(customer_id = %customer_id, "Session refers to a missing customer");
        clear_current_user(session).await?;
    }
    Ok(customer)
}

/// Display the account settings form.
pub async fn settings_page(
    State(state): State<AppState>,
    RequireCustomer(user, customer_id): RequireCustomer,
    session: Session,
) -> Result<Response> {
    let Some(customer) = load_customer(&state, &session, customer_id).await? else {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };

    let form = CustomerForm::from_customer(&customer);
    Ok(
        AccountSettingsTemplate::render_for(&session, user, customer, form, FormErrors::new())
            .await
            .into_response(),
    )
}

/// Handle the account settings form submission.
#[instrument(skip_all, fields(customer_id = %customer_id))]
pub async fn save_settings(
    State(state): State<AppState>,
    RequireCustomer(user, customer_id): RequireCustomer,
    session: Session,
    mut multipart: Multipart,
) -> Result<Response> {
    let Some(customer) = load_customer(&state, &session, customer_id).await? else {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };

    let form = CustomerForm::from_multipart(&mut multipart).await?;
    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => {
            return Ok(
                AccountSettingsTemplate::render_for(&session, user, customer, form, errors)
                    .await
                    .into_response(),
            );
        }
    };

    let profile_pic = match valid.picture {
        PictureAction::Keep => PictureChange::Keep,
        PictureAction::Clear => PictureChange::Clear,
        PictureAction::Store { bytes, kind } => {
            PictureChange::Replace(state.media().save_profile_pic(&bytes, kind).await?)
        }
    };
    let update = ProfileUpdate {
        name: valid.name,
        phone: valid.phone,
        email: valid.email,
        profile_pic,
    };

    let updated = match CustomerRepository::new(state.pool())
        .update_profile(customer_id, &update)
        .await
    {
        Ok(updated) => updated,
        Err(e) => {
            if let PictureChange::Replace(path) = &update.profile_pic {
                remove_quietly(&state, path).await;
            }
            return Err(e.into());
        }
    };

    if update.profile_pic != PictureChange::Keep
        && let Some(old) = customer.profile_pic.as_deref()
        && updated.profile_pic.as_deref() != Some(old)
    {
        remove_quietly(&state, old).await;
    }

    tracing::info!("Account settings saved");
    push_flash(&session, FlashLevel::Success, "Your settings were saved.").await;

    let form = CustomerForm::from_customer(&updated);
    Ok(
        AccountSettingsTemplate::render_for(&session, user, updated, form, FormErrors::new())
            .await
            .into_response(),
    )
}

/// Delete a media file, logging instead of failing.
async fn remove_quietly(state: &AppState, relative: &str) {
    if let Err(e) = state.media().remove(relative).await {
        tracing::warn!(error = %e, path = relative, "Failed to remove profile picture");
    }
}
