use crate::accounts::{session::has_session, views};
use axum::{
    http::HeaderMap,
    response::{Html, IntoResponse},
};

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Home page", body = String, content_type = "text/html")
    ),
    tag = "accounts"
)]
pub async fn home(headers: HeaderMap) -> impl IntoResponse {
    Html(views::home_page(has_session(&headers)))
}

#[utoipa::path(
    get,
    path = "/accounts",
    responses(
        (status = 200, description = "Links to the account pages", body = String, content_type = "text/html")
    ),
    tag = "accounts"
)]
pub async fn index() -> impl IntoResponse {
    Html(views::landing_page())
}
