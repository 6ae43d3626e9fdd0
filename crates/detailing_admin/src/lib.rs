// --- File: crates/detailing_admin/src/lib.rs ---

pub mod error;
pub mod extract;
pub mod guard;
pub mod handlers;
pub mod routes;
pub mod session;
#[cfg(feature = "openapi")]
pub mod doc;

pub use error::AdminError;
pub use extract::{bearer_token, session_token, AdminSession, CronCaller, HasSessionGuard};
pub use guard::{SessionGuard, SESSION_COOKIE};
pub use routes::routes;
pub use session::{InMemorySessionStore, SessionStore};
