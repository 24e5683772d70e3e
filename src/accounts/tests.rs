#![allow(clippy::unwrap_used)]

use super::{
    flow::{LOGIN_FAILURE, PROVIDER_UNAVAILABLE, USER_EXISTS, USER_NOT_FOUND},
    router,
    test_support::{MemoryProvider, CONFIRMATION_CODE},
    AccountsConfig, AccountsState,
};
use axum::{
    body::{to_bytes, Body},
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        Method, Request, StatusCode,
    },
    response::Response,
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;

fn app(provider: &Arc<MemoryProvider>) -> Router {
    let config = AccountsConfig::new("http://localhost:8080".to_string());
    router(Arc::new(AccountsState::new(provider.clone(), config)))
}

async fn get(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post(app: &Router, uri: &str, body: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers().get(LOCATION).unwrap().to_str().unwrap()
}

#[tokio::test]
async fn pages_render() {
    let provider = Arc::new(MemoryProvider::new());
    let app = app(&provider);

    for (uri, marker) in [
        ("/", "You are not signed in."),
        ("/accounts", "href=\"/accounts/confirm\""),
        ("/accounts/signup", "name=\"confirmPassword\""),
        ("/accounts/confirm", "name=\"code\""),
        ("/accounts/login", "name=\"rememberMe\""),
    ] {
        let response = get(&app, uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert!(response.headers().contains_key("x-request-id"), "{uri}");
        assert!(text(response).await.contains(marker), "{uri}");
    }
}

#[tokio::test]
async fn confirm_page_prefills_email_from_query() {
    let provider = Arc::new(MemoryProvider::new());
    let response = get(&app(&provider), "/accounts/confirm?email=a%40b.com").await;
    assert!(text(response).await.contains("value=\"a@b.com\""));
}

#[tokio::test]
async fn mismatched_confirmation_is_reported_without_creating() {
    let provider = Arc::new(MemoryProvider::new());
    let response = post(
        &app(&provider),
        "/accounts/signup",
        "email=a%40b.com&password=secret1&confirmPassword=secret2",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = text(response).await;
    assert!(html.contains("Password and its confirmation do not match"));
    assert!(html.contains("value=\"a@b.com\""));
    assert!(!html.contains("secret1"));
    assert_eq!(provider.calls().create, 0);
}

#[tokio::test]
async fn existing_user_cannot_sign_up_again() {
    let provider =
        Arc::new(MemoryProvider::new().with_user("taken@b.com", Some("CONFIRMED"), "secret1"));
    let response = post(
        &app(&provider),
        "/accounts/signup",
        "email=taken%40b.com&password=secret1&confirmPassword=secret1",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(text(response).await.contains(USER_EXISTS));
    assert_eq!(provider.calls().create, 0);
}

#[tokio::test]
async fn signup_redirects_to_confirm_with_email() {
    let provider = Arc::new(MemoryProvider::new());
    let response = post(
        &app(&provider),
        "/accounts/signup",
        "email=New%40B.com&password=secret1&confirmPassword=secret1",
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/accounts/confirm?email=new%40b.com");
    assert_eq!(provider.status_of("new@b.com").as_deref(), Some("UNCONFIRMED"));
}

#[tokio::test]
async fn provider_policy_errors_are_shown_on_the_form() {
    let provider = Arc::new(MemoryProvider::new());
    let response = post(
        &app(&provider),
        "/accounts/signup",
        "email=a%40b.com&password=weakpass&confirmPassword=weakpass",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(text(response)
        .await
        .contains("Password did not conform with policy"));
}

#[tokio::test]
async fn blank_password_is_required() {
    let provider = Arc::new(MemoryProvider::new());
    let response = post(
        &app(&provider),
        "/accounts/signup",
        "email=a%40b.com&password=++++++&confirmPassword=++++++",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = text(response).await;
    assert!(html.contains("Password is required"));
    assert!(html.contains("Confirm Password is required"));
    assert_eq!(provider.calls().find, 0);
    assert_eq!(provider.calls().create, 0);
}

#[tokio::test]
async fn missing_fields_render_errors_instead_of_rejecting() {
    let provider = Arc::new(MemoryProvider::new());
    let response = post(&app(&provider), "/accounts/signup", "").await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = text(response).await;
    assert!(html.contains("Email is required"));
    assert!(html.contains("Password is required"));
    assert!(html.contains("Confirm Password is required"));
}

#[tokio::test]
async fn confirm_unknown_user_is_not_found() {
    let provider = Arc::new(MemoryProvider::new());
    let response = post(
        &app(&provider),
        "/accounts/confirm",
        &format!("email=nobody%40b.com&code={CONFIRMATION_CODE}"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(text(response).await.contains(USER_NOT_FOUND));
    assert!(provider.calls().confirm_force.is_empty());
}

#[tokio::test]
async fn reconfirming_surfaces_provider_error() {
    let provider =
        Arc::new(MemoryProvider::new().with_user("a@b.com", Some("CONFIRMED"), "secret1"));
    let response = post(
        &app(&provider),
        "/accounts/confirm",
        &format!("email=a%40b.com&code={CONFIRMATION_CODE}"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(text(response)
        .await
        .contains("User cannot be confirmed. Current status is CONFIRMED"));
    assert_eq!(provider.status_of("a@b.com").as_deref(), Some("CONFIRMED"));
    assert_eq!(provider.calls().create, 0);
}

#[tokio::test]
async fn correct_login_sets_cookie_and_goes_home() {
    let provider =
        Arc::new(MemoryProvider::new().with_user("a@b.com", Some("CONFIRMED"), "secret1"));
    let response = post(
        &app(&provider),
        "/accounts/login",
        "email=a%40b.com&password=secret1&rememberMe=true",
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("webadvert_session=session-a@b.com;"));
    assert!(cookie.contains("Max-Age=3600"));

    let calls = provider.calls();
    assert_eq!(calls.sign_in.len(), 1);
    assert_eq!(calls.sign_in[0].email, "a@b.com");
    assert!(calls.sign_in[0].remember_me);
    assert!(!calls.sign_in[0].lockout_on_failure);
}

#[tokio::test]
async fn incorrect_login_shows_exact_message() {
    let provider =
        Arc::new(MemoryProvider::new().with_user("a@b.com", Some("CONFIRMED"), "secret1"));
    let app = app(&provider);

    for body in [
        "email=a%40b.com&password=wrong",
        "email=nobody%40b.com&password=secret1",
    ] {
        let response = post(&app, "/accounts/login", body).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(SET_COOKIE));
        let html = text(response).await;
        assert!(html.contains(&format!("<li>{LOGIN_FAILURE}</li>")));
        assert!(!html.contains("Incorrect username or password"));
    }
}

#[tokio::test]
async fn provider_outage_shows_generic_error() {
    let provider =
        Arc::new(MemoryProvider::new().with_user("a@b.com", Some("CONFIRMED"), "secret1"));
    provider.set_outage(true);
    let app = app(&provider);

    let response = post(&app, "/accounts/login", "email=a%40b.com&password=secret1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = text(response).await;
    assert!(html.contains(PROVIDER_UNAVAILABLE));
    assert!(!html.contains(LOGIN_FAILURE));

    let response = post(
        &app,
        "/accounts/signup",
        "email=c%40d.com&password=secret1&confirmPassword=secret1",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(text(response).await.contains(PROVIDER_UNAVAILABLE));
}

#[tokio::test]
async fn logout_clears_cookie() {
    let provider = Arc::new(MemoryProvider::new());
    let response = post(&app(&provider), "/accounts/logout", "").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("webadvert_session=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn home_shows_signed_in_state() {
    let provider = Arc::new(MemoryProvider::new());
    let response = app(&provider)
        .oneshot(
            Request::builder()
                .uri("/")
                .header(COOKIE, "webadvert_session=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let html = text(response).await;
    assert!(html.contains("You are signed in."));
    assert!(html.contains("action=\"/accounts/logout\""));
}

#[tokio::test]
async fn health_reports_build_info() {
    let provider = Arc::new(MemoryProvider::new());
    let app = app(&provider);

    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let x_app = response.headers().get("X-App").unwrap().to_str().unwrap();
    assert!(x_app.starts_with(&format!(
        "{}:{}:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )));
    let body: serde_json::Value = serde_json::from_str(&text(response).await).unwrap();
    assert_eq!(body["name"], env!("CARGO_PKG_NAME"));
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(text(response).await.is_empty());
}

#[tokio::test]
async fn request_id_is_propagated() {
    let provider = Arc::new(MemoryProvider::new());
    let response = app(&provider)
        .oneshot(
            Request::builder()
                .uri("/accounts")
                .header("x-request-id", "req-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers().get("x-request-id").unwrap(), "req-1");
}

#[tokio::test]
async fn signup_confirm_login() {
    let provider = Arc::new(MemoryProvider::new());
    let app = app(&provider);

    let response = post(
        &app,
        "/accounts/signup",
        "email=a%40b.com&password=secret1&confirmPassword=secret1",
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // Unconfirmed users cannot sign in yet
    let response = post(&app, "/accounts/login", "email=a%40b.com&password=secret1").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(text(response).await.contains(LOGIN_FAILURE));

    let response = post(
        &app,
        "/accounts/confirm",
        &format!("email=a%40b.com&code={CONFIRMATION_CODE}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert_eq!(provider.calls().confirm_force, vec![true]);

    let response = post(
        &app,
        "/accounts/login",
        "email=a%40b.com&password=secret1&rememberMe=true",
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.contains("Max-Age=3600"));
    assert!(provider.calls().sign_in.last().unwrap().remember_me);
}

#[test]
fn openapi_documents_every_route() {
    let doc = super::openapi();
    for path in [
        "/",
        "/accounts",
        "/accounts/signup",
        "/accounts/confirm",
        "/accounts/login",
        "/accounts/logout",
        "/health",
    ] {
        assert!(doc.paths.paths.contains_key(path), "{path} missing");
    }
}
