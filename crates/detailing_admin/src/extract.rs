// --- File: crates/detailing_admin/src/extract.rs ---
use crate::error::AdminError;
use crate::guard::{SessionGuard, SESSION_COOKIE};
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use cookie::Cookie;
use detailing_common::DetailingError;
use std::sync::Arc;

/// Router states that can hand out the session guard.
pub trait HasSessionGuard {
    fn session_guard(&self) -> &SessionGuard;
}

impl HasSessionGuard for SessionGuard {
    fn session_guard(&self) -> &SessionGuard {
        self
    }
}

impl<T: HasSessionGuard> HasSessionGuard for Arc<T> {
    fn session_guard(&self) -> &SessionGuard {
        self.as_ref().session_guard()
    }
}

/// Value of the `admin_session` cookie, if the request carries one.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| Cookie::split_parse(raw.to_string()))
        .filter_map(Result::ok)
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Proof that the request carries a valid admin session.
///
/// ```ignore
/// async fn list(_admin: AdminSession, State(state): State<Arc<MyState>>) -> ... {}
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AdminSession;

impl<S> FromRequestParts<S> for AdminSession
where
    S: HasSessionGuard + Send + Sync,
{
    type Rejection = DetailingError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers);
        if state.session_guard().check(token.as_deref()) {
            Ok(AdminSession)
        } else {
            Err(AdminError::Unauthorized.into())
        }
    }
}

/// Who triggered a scheduled job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CronCaller {
    /// Presented the `CRON_SECRET` bearer token.
    Scheduler,
    /// Presented a valid admin session cookie.
    Admin,
}

impl<S> FromRequestParts<S> for CronCaller
where
    S: HasSessionGuard + Send + Sync,
{
    type Rejection = DetailingError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let guard = state.session_guard();
        if guard.authorize_cron_secret(bearer_token(&parts.headers)) {
            return Ok(CronCaller::Scheduler);
        }
        let token = session_token(&parts.headers);
        if guard.check(token.as_deref()) {
            return Ok(CronCaller::Admin);
        }
        Err(AdminError::Unauthorized.into())
    }
}
