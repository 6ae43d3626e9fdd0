// --- File: crates/detailing_admin/src/doc.rs ---

// Only compile this module if the 'openapi' feature is enabled
#![cfg(feature = "openapi")]

use crate::handlers::{AuthActionResponse, AuthStatusResponse, LoginRequest};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::check_session_handler,
        crate::handlers::login_handler,
        crate::handlers::logout_handler,
    ),
    components(schemas(LoginRequest, AuthStatusResponse, AuthActionResponse)),
    tags((name = "Admin", description = "Admin session (admin_session cookie)"))
)]
pub struct AdminApiDoc;
