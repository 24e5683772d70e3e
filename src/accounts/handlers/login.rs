use super::{form_page, see_other};
use crate::accounts::{
    flow::{self, KEY_PROVIDER_UNAVAILABLE, PROVIDER_UNAVAILABLE},
    forms::{FormErrors, LoginForm},
    session::{clear_session_cookie, session_cookie},
    views, AccountsState,
};
use axum::{
    extract::Extension,
    http::header::SET_COOKIE,
    response::{Html, IntoResponse, Response},
    Form,
};
use std::sync::Arc;
use tracing::{error, instrument};

#[utoipa::path(
    get,
    path = "/accounts/login",
    responses(
        (status = 200, description = "Login form", body = String, content_type = "text/html")
    ),
    tag = "accounts"
)]
pub async fn login_form() -> impl IntoResponse {
    Html(views::login_page(&LoginForm::default(), &FormErrors::new()))
}

#[utoipa::path(
    post,
    path = "/accounts/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Signed in, session cookie set"),
        (status = 200, description = "Form shown again with errors", body = String, content_type = "text/html")
    ),
    tag = "accounts"
)]
#[instrument(skip_all)]
pub async fn login(state: Extension<Arc<AccountsState>>, Form(form): Form<LoginForm>) -> Response {
    let session = match flow::login(state.provider(), &form).await {
        Ok(session) => session,
        Err(err) => return form_page(views::login_page(&form, &err.into_form_errors())),
    };

    match session_cookie(state.config(), &session, form.remember_me) {
        Ok(cookie) => {
            let mut response = see_other("/");
            response.headers_mut().insert(SET_COOKIE, cookie);
            response
        }
        Err(err) => {
            error!("Failed to build session cookie: {err}");

            form_page(views::login_page(
                &form,
                &FormErrors::single(KEY_PROVIDER_UNAVAILABLE, PROVIDER_UNAVAILABLE),
            ))
        }
    }
}

#[utoipa::path(
    post,
    path = "/accounts/logout",
    responses(
        (status = 303, description = "Session cookie cleared")
    ),
    tag = "accounts"
)]
#[instrument(skip_all)]
pub async fn logout(state: Extension<Arc<AccountsState>>) -> Response {
    let mut response = see_other("/");
    match clear_session_cookie(state.config()) {
        Ok(cookie) => {
            response.headers_mut().insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build session cookie: {err}"),
    }
    response
}
