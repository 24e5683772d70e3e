use super::{form_page, see_other};
use crate::accounts::{
    flow,
    forms::{FormErrors, SignupForm},
    views, AccountsState,
};
use axum::{
    extract::Extension,
    response::{Html, IntoResponse, Response},
    Form,
};
use std::sync::Arc;
use tracing::instrument;
use url::form_urlencoded;

#[utoipa::path(
    get,
    path = "/accounts/signup",
    responses(
        (status = 200, description = "Signup form", body = String, content_type = "text/html")
    ),
    tag = "accounts"
)]
pub async fn signup_form() -> impl IntoResponse {
    Html(views::signup_page(&SignupForm::default(), &FormErrors::new()))
}

#[utoipa::path(
    post,
    path = "/accounts/signup",
    request_body(content = SignupForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "User created, continue to the confirm page"),
        (status = 200, description = "Form shown again with errors", body = String, content_type = "text/html")
    ),
    tag = "accounts"
)]
#[instrument(skip_all)]
pub async fn signup(
    state: Extension<Arc<AccountsState>>,
    Form(form): Form<SignupForm>,
) -> Response {
    match flow::signup(
        state.provider(),
        &form,
        state.config().password_min_length(),
    )
    .await
    {
        Ok(email) => {
            let query: String = form_urlencoded::Serializer::new(String::new())
                .append_pair("email", &email)
                .finish();
            see_other(&format!("/accounts/confirm?{query}"))
        }
        Err(err) => form_page(views::signup_page(&form, &err.into_form_errors())),
    }
}
