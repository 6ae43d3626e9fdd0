// --- File: crates/detailing_admin/src/guard.rs ---
use crate::error::AdminError;
use crate::session::{InMemorySessionStore, SessionStore};
use chrono::{DateTime, Duration, Utc};
use constant_time_eq::constant_time_eq;
use cookie::{Cookie, SameSite};
use detailing_config::AppConfig;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{info, warn};

pub const SESSION_COOKIE: &str = "admin_session";
const TOKEN_BYTES: usize = 32;

/// Issues, checks and revokes admin sessions, and authorizes cron callers.
pub struct SessionGuard {
    store: Arc<dyn SessionStore>,
    password: Option<String>,
    cron_secret: Option<String>,
    ttl: Duration,
    dev_bypass: bool,
    secure_cookie: bool,
}

impl SessionGuard {
    pub fn new(store: Arc<dyn SessionStore>, password: Option<String>) -> Self {
        Self {
            store,
            password: password.filter(|p| !p.is_empty()),
            cron_secret: None,
            ttl: Duration::hours(24),
            dev_bypass: false,
            secure_cookie: true,
        }
    }

    /// Builds the guard with an in-memory store sized from configuration.
    ///
    /// The dev bypass is only ever enabled in development mode.
    pub fn from_config(config: &AppConfig) -> Self {
        let store = Arc::new(InMemorySessionStore::new(config.admin.max_sessions));
        let dev_bypass = config.run_mode.is_development() && config.admin.dev_session_bypass;
        if dev_bypass {
            warn!("[Admin] Development mode: any non-empty admin_session cookie is accepted");
        }
        if config.admin.password().is_none() {
            warn!("[Admin] ADMIN_PASSWORD is not set; admin login is disabled");
        }

        Self::new(store, config.admin.password().map(str::to_string))
            .with_cron_secret(config.cron.secret().map(str::to_string))
            .with_ttl(Duration::hours(config.admin.session_ttl_hours))
            .with_dev_bypass(dev_bypass)
            .with_secure_cookie(!config.run_mode.is_development())
    }

    pub fn with_cron_secret(mut self, secret: Option<String>) -> Self {
        self.cron_secret = secret.filter(|s| !s.is_empty());
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_dev_bypass(mut self, enabled: bool) -> Self {
        self.dev_bypass = enabled;
        self
    }

    pub fn with_secure_cookie(mut self, secure: bool) -> Self {
        self.secure_cookie = secure;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Verifies the password and returns a fresh session token.
    pub fn authenticate(&self, password: &str) -> Result<String, AdminError> {
        self.authenticate_at(password, Utc::now())
    }

    pub fn authenticate_at(&self, password: &str, now: DateTime<Utc>) -> Result<String, AdminError> {
        let expected = self.password.as_deref().ok_or(AdminError::NotConfigured)?;
        if password.is_empty() {
            return Err(AdminError::MissingPassword);
        }
        if !constant_time_eq(password.as_bytes(), expected.as_bytes()) {
            warn!("[Admin] Login rejected: wrong password");
            return Err(AdminError::InvalidPassword);
        }

        let token = generate_token();
        self.store.insert(hash_token(&token), now, now + self.ttl);
        info!("[Admin] Session issued ({} active)", self.store.len());
        Ok(token)
    }

    /// True when `token` names a live session.
    pub fn check(&self, token: Option<&str>) -> bool {
        self.check_at(token, Utc::now())
    }

    pub fn check_at(&self, token: Option<&str>, now: DateTime<Utc>) -> bool {
        let token = match token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => t,
            None => return false,
        };
        if self.store.is_valid(&hash_token(token), now) {
            return true;
        }
        if self.dev_bypass {
            warn!("[Admin] Dev session bypass accepted an unknown admin_session cookie");
            return true;
        }
        false
    }

    pub fn logout(&self, token: Option<&str>) {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            if self.store.remove(&hash_token(token)) {
                info!("[Admin] Session revoked");
            }
        }
    }

    /// Checks an `Authorization: Bearer` value against `CRON_SECRET`.
    pub fn authorize_cron_secret(&self, provided: Option<&str>) -> bool {
        match (self.cron_secret.as_deref(), provided) {
            (Some(expected), Some(provided)) => {
                constant_time_eq(provided.as_bytes(), expected.as_bytes())
            }
            _ => false,
        }
    }

    /// The `admin_session` cookie carrying a freshly issued token.
    pub fn session_cookie(&self, token: &str) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookie)
            .max_age(cookie::time::Duration::seconds(self.ttl.num_seconds()))
            .build()
    }

    /// An expired, empty `admin_session` cookie that makes the browser drop it.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookie)
            .max_age(cookie::time::Duration::seconds(0))
            .build()
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn guard() -> SessionGuard {
        SessionGuard::new(
            Arc::new(InMemorySessionStore::new(100)),
            Some("hunter2".to_string()),
        )
        .with_cron_secret(Some("cron-secret".to_string()))
    }

    #[test]
    fn test_login_issues_64_hex_char_token() {
        let guard = guard();
        let token = guard.authenticate("hunter2").unwrap();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(guard.check(Some(&token)));
    }

    #[test]
    fn test_tokens_are_unique() {
        let guard = guard();
        let a = guard.authenticate("hunter2").unwrap();
        let b = guard.authenticate("hunter2").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_or_missing_password() {
        let guard = guard();
        assert_eq!(guard.authenticate("nope"), Err(AdminError::InvalidPassword));
        assert_eq!(guard.authenticate(""), Err(AdminError::MissingPassword));
    }

    #[test]
    fn test_unconfigured_password() {
        let guard = SessionGuard::new(Arc::new(InMemorySessionStore::new(10)), None);
        assert_eq!(guard.authenticate("anything"), Err(AdminError::NotConfigured));
    }

    #[test]
    fn test_session_expires_after_ttl() {
        let guard = guard();
        let t0 = Utc.with_ymd_and_hms(2025, 5, 5, 9, 0, 0).unwrap();
        let token = guard.authenticate_at("hunter2", t0).unwrap();
        assert!(guard.check_at(Some(&token), t0 + Duration::hours(23)));
        assert!(!guard.check_at(Some(&token), t0 + Duration::hours(24)));
    }

    #[test]
    fn test_unknown_token_rejected_without_bypass() {
        let guard = guard();
        assert!(!guard.check(None));
        assert!(!guard.check(Some("")));
        assert!(!guard.check(Some("made-up")));
    }

    #[test]
    fn test_dev_bypass_accepts_any_non_empty_token() {
        let guard = guard().with_dev_bypass(true);
        assert!(guard.check(Some("made-up")));
        assert!(!guard.check(Some("  ")));
        assert!(!guard.check(None));
    }

    #[test]
    fn test_logout_revokes() {
        let guard = guard();
        let token = guard.authenticate("hunter2").unwrap();
        guard.logout(Some(&token));
        assert!(!guard.check(Some(&token)));
    }

    #[test]
    fn test_cron_secret() {
        let guard = guard();
        assert!(guard.authorize_cron_secret(Some("cron-secret")));
        assert!(!guard.authorize_cron_secret(Some("cron-secre")));
        assert!(!guard.authorize_cron_secret(None));

        let no_secret = SessionGuard::new(Arc::new(InMemorySessionStore::new(1)), None);
        assert!(!no_secret.authorize_cron_secret(Some("")));
    }

    #[test]
    fn test_cookie_attributes() {
        let guard = guard();
        let cookie = guard.session_cookie("abc").to_string();
        assert!(cookie.starts_with("admin_session=abc"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(cookie.contains("Secure"));

        let removal = guard.removal_cookie().to_string();
        assert!(removal.contains("Max-Age=0"));
    }
}
