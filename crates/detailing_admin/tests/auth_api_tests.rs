use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use detailing_admin::{routes, InMemorySessionStore, SessionGuard};
use detailing_config::{AppConfig, RunMode};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn guard(dev_bypass: bool) -> Arc<SessionGuard> {
    Arc::new(
        SessionGuard::new(
            Arc::new(InMemorySessionStore::new(100)),
            Some("hunter2".to_string()),
        )
        .with_dev_bypass(dev_bypass),
    )
}

fn app(dev_bypass: bool) -> Router {
    routes(guard(dev_bypass))
}

fn configured_app(run_mode: RunMode) -> Router {
    let mut config = AppConfig::default();
    config.run_mode = run_mode;
    config.admin.password = "hunter2".to_string();
    assert!(config.admin.dev_session_bypass);
    routes(Arc::new(SessionGuard::from_config(&config)))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn login_request(password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/admin/auth")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(format!(r#"{{"password":"{}"}}"#, password)))
        .unwrap()
}

fn check_request(cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri("/admin/auth");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_check_without_cookie_is_401_in_production() {
    let response = app(false).oneshot(check_request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_any_non_empty_cookie_passes_in_development() {
    let response = app(true)
        .oneshot(check_request(Some("admin_session=whatever")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["authenticated"], true);
}

#[tokio::test]
async fn test_unknown_cookie_is_401_in_production() {
    let response = app(false)
        .oneshot(check_request(Some("admin_session=whatever")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_check_logout_flow() {
    let app = app(false);

    let response = app.clone().oneshot(login_request("hunter2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Max-Age=86400"));
    assert_eq!(body_json(response).await["success"], true);

    let session = set_cookie.split(';').next().unwrap().to_string();
    let response = app
        .clone()
        .oneshot(check_request(Some(&session)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let logout = Request::builder()
        .method("DELETE")
        .uri("/admin/auth")
        .header(header::COOKIE, &session)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(logout).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = response.headers().get(header::SET_COOKIE).unwrap();
    assert!(cleared.to_str().unwrap().contains("Max-Age=0"));

    let response = app.oneshot(check_request(Some(&session))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_password_is_401() {
    let response = app(false).oneshot(login_request("nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_missing_password_is_400() {
    let request = Request::builder()
        .method("POST")
        .uri("/admin/auth")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = app(false).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_production_config_ignores_dev_bypass_flag() {
    let app = configured_app(RunMode::Production);
    let response = app
        .clone()
        .oneshot(check_request(Some("admin_session=whatever")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.oneshot(login_request("hunter2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers().get(header::SET_COOKIE).unwrap();
    assert!(set_cookie.to_str().unwrap().contains("Secure"));
}

#[tokio::test]
async fn test_development_config_accepts_any_cookie() {
    let response = configured_app(RunMode::Development)
        .oneshot(check_request(Some("admin_session=whatever")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["authenticated"], true);
}
