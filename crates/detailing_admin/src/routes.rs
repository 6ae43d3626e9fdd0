// --- File: crates/detailing_admin/src/routes.rs ---

use crate::guard::SessionGuard;
use crate::handlers::{check_session_handler, login_handler, logout_handler};
use axum::{routing::get, Router};
use std::sync::Arc;

/// Creates a router containing the admin login/logout/check routes.
pub fn routes(guard: Arc<SessionGuard>) -> Router {
    Router::new()
        .route(
            "/admin/auth",
            get(check_session_handler)
                .post(login_handler)
                .delete(logout_handler),
        )
        .with_state(guard)
}
