use super::{form_page, see_other};
use crate::accounts::{
    flow,
    forms::{ConfirmForm, FormErrors},
    views, AccountsState,
};
use axum::{
    extract::{Extension, Query},
    response::{Html, IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::IntoParams;

/// Query string of the confirm page, set by the signup redirect.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(default)]
#[into_params(parameter_in = Query)]
pub struct ConfirmPrefill {
    /// Prefill the email field
    pub email: String,
}

#[utoipa::path(
    get,
    path = "/accounts/confirm",
    responses(
        (status = 200, description = "Confirmation form", body = String, content_type = "text/html")
    ),
    tag = "accounts"
)]
pub async fn confirm_form(Query(prefill): Query<ConfirmPrefill>) -> impl IntoResponse {
    let form = ConfirmForm {
        email: prefill.email,
        code: String::new(),
    };
    Html(views::confirm_page(&form, &FormErrors::new()))
}

#[utoipa::path(
    post,
    path = "/accounts/confirm",
    request_body(content = ConfirmForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Account confirmed"),
        (status = 200, description = "Form shown again with errors", body = String, content_type = "text/html")
    ),
    tag = "accounts"
)]
#[instrument(skip_all)]
pub async fn confirm(
    state: Extension<Arc<AccountsState>>,
    Form(form): Form<ConfirmForm>,
) -> Response {
    match flow::confirm(state.provider(), &form).await {
        Ok(()) => see_other("/"),
        Err(err) => form_page(views::confirm_page(&form, &err.into_form_errors())),
    }
}
