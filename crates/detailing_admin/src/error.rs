// --- File: crates/detailing_admin/src/error.rs ---
use detailing_common::{DetailingError, HttpStatusCode};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AdminError {
    #[error("Password is required")]
    MissingPassword,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("ADMIN_PASSWORD is not configured")]
    NotConfigured,
}

impl From<AdminError> for DetailingError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::MissingPassword => DetailingError::ValidationError(err.to_string()),
            AdminError::InvalidPassword | AdminError::Unauthorized => {
                DetailingError::AuthError(err.to_string())
            }
            AdminError::NotConfigured => DetailingError::ConfigError(err.to_string()),
        }
    }
}

impl HttpStatusCode for AdminError {
    fn status_code(&self) -> u16 {
        match self {
            AdminError::MissingPassword => 400,
            AdminError::InvalidPassword | AdminError::Unauthorized => 401,
            AdminError::NotConfigured => 500,
        }
    }
}
