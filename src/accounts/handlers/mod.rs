pub mod confirm;
pub mod health;
pub mod home;
pub mod login;
pub mod signup;

use axum::{
    http::{header::LOCATION, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
};

/// 303 so browsers follow a form POST with a GET.
pub(crate) fn see_other(location: &str) -> Response {
    let location = HeaderValue::from_str(location).unwrap_or(HeaderValue::from_static("/"));
    (StatusCode::SEE_OTHER, [(LOCATION, location)]).into_response()
}

/// Failed submissions re-render the form with a 200.
pub(crate) fn form_page(html: String) -> Response {
    (StatusCode::OK, Html(html)).into_response()
}
