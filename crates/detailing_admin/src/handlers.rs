// --- File: crates/detailing_admin/src/handlers.rs ---

use crate::error::AdminError;
use crate::extract::{session_token, AdminSession};
use crate::guard::SessionGuard;
use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Json},
};
use detailing_common::DetailingError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub password: Option<String>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Serialize, Debug)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Serialize, Debug)]
pub struct AuthActionResponse {
    pub success: bool,
}

/// Reports whether the caller holds a valid admin session.
#[axum::debug_handler(state = Arc<SessionGuard>)]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/admin/auth",
    responses(
        (status = 200, description = "Session is valid", body = AuthStatusResponse),
        (status = 401, description = "No or invalid admin_session cookie")
    ),
    tag = "Admin"
))]
pub async fn check_session_handler(_admin: AdminSession) -> Json<AuthStatusResponse> {
    Json(AuthStatusResponse {
        authenticated: true,
    })
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/admin/auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; admin_session cookie set", body = AuthActionResponse),
        (status = 400, description = "Password missing"),
        (status = 401, description = "Wrong password"),
        (status = 500, description = "ADMIN_PASSWORD not configured")
    ),
    tag = "Admin"
))]
pub async fn login_handler(
    State(guard): State<Arc<SessionGuard>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, DetailingError> {
    let password = payload.password.unwrap_or_default();
    if password.is_empty() {
        return Err(AdminError::MissingPassword.into());
    }

    let token = guard.authenticate(&password)?;
    let cookie = guard.session_cookie(&token);

    Ok((
        [(SET_COOKIE, cookie.to_string())],
        Json(AuthActionResponse { success: true }),
    ))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/admin/auth",
    responses(
        (status = 200, description = "Logged out; admin_session cookie cleared", body = AuthActionResponse)
    ),
    tag = "Admin"
))]
pub async fn logout_handler(
    State(guard): State<Arc<SessionGuard>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    guard.logout(session_token(&headers).as_deref());
    (
        [(SET_COOKIE, guard.removal_cookie().to_string())],
        Json(AuthActionResponse { success: true }),
    )
}
