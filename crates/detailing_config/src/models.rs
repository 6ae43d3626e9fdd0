// --- File: crates/detailing_config/src/models.rs ---

use serde::{Deserialize, Serialize};

/// Placeholder for values that are injected from the environment at load time.
/// `square.access_token` resolves from `SQUARE_ACCESS_TOKEN`, `admin.password`
/// from `ADMIN_PASSWORD` and so on (path joined with `_`, upper-cased).
pub const SECRET_FROM_ENV: &str = "secret_from_env";

fn secret_marker() -> String {
    SECRET_FROM_ENV.to_string()
}

/// Returns the secret value, or `None` while it is empty or still the marker.
pub fn secret_value(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == SECRET_FROM_ENV {
        None
    } else {
        Some(trimmed)
    }
}

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub log_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_dir: None,
        }
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Development,
    #[default]
    Production,
}

impl RunMode {
    /// Maps a `RUN_ENV` / `NODE_ENV` value to a mode. Anything that is not
    /// recognisably a development value counts as production.
    pub fn from_env_value(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "debug" | "local" => RunMode::Development,
            _ => RunMode::Production,
        }
    }

    pub fn is_development(self) -> bool {
        self == RunMode::Development
    }
}

// --- Square Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SquareEnvironment {
    #[default]
    Sandbox,
    Production,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SquareConfig {
    pub environment: SquareEnvironment,
    /// Overrides the environment's base URL (used by tests against a mock server).
    pub base_url: Option<String>,
    /// Value of the `Square-Version` header.
    pub api_version: String,
    pub timeout_secs: u64,
    // Secrets loaded from env: SQUARE_ACCESS_TOKEN, SQUARE_LOCATION_ID
    pub access_token: String,
    pub location_id: String,
}

impl SquareConfig {
    pub fn base_url(&self) -> String {
        if let Some(url) = self.base_url.as_deref().filter(|u| !u.is_empty()) {
            return url.trim_end_matches('/').to_string();
        }
        match self.environment {
            SquareEnvironment::Sandbox => "https://connect.squareupsandbox.com".to_string(),
            SquareEnvironment::Production => "https://connect.squareup.com".to_string(),
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        secret_value(&self.access_token)
    }

    pub fn location_id(&self) -> Option<&str> {
        secret_value(&self.location_id)
    }
}

impl Default for SquareConfig {
    fn default() -> Self {
        Self {
            environment: SquareEnvironment::Sandbox,
            base_url: None,
            api_version: "2024-10-17".to_string(),
            timeout_secs: 30,
            access_token: secret_marker(),
            location_id: secret_marker(),
        }
    }
}

// --- Admin Session Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AdminConfig {
    // Secret loaded from env: ADMIN_PASSWORD
    pub password: String,
    pub session_ttl_hours: i64,
    pub max_sessions: usize,
    /// Accept any non-empty session cookie in development mode.
    pub dev_session_bypass: bool,
}

impl AdminConfig {
    pub fn password(&self) -> Option<&str> {
        secret_value(&self.password)
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            password: secret_marker(),
            session_ttl_hours: 24,
            max_sessions: 100,
            dev_session_bypass: true,
        }
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CronConfig {
    // Secret loaded from env: CRON_SECRET
    pub secret: String,
}

impl CronConfig {
    pub fn secret(&self) -> Option<&str> {
        secret_value(&self.secret)
    }
}

impl Default for CronConfig {
    fn default() -> Self {
        Self {
            secret: secret_marker(),
        }
    }
}

// --- Business Hours ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct BusinessConfig {
    /// IANA zone used to bucket bookings into calendar days.
    pub time_zone: String,
    pub daily_hours: u32,
    pub working_days: Vec<String>,
    /// Duration assumed for a booking whose segment carries none.
    pub default_duration_minutes: i64,
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            time_zone: "America/New_York".to_string(),
            daily_hours: 9,
            working_days: ["Mon", "Tue", "Wed", "Thu", "Fri"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
            default_duration_minutes: 240,
        }
    }
}

// --- No-show fee collection ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct NoShowConfig {
    pub fee_percent: u32,
    /// A booking becomes chargeable this many hours after its start.
    pub min_age_hours: i64,
    /// Bookings older than this are no longer scanned.
    pub lookback_days: i64,
}

impl Default for NoShowConfig {
    fn default() -> Self {
        Self {
            fee_percent: 30,
            min_age_hours: 48,
            lookback_days: 7,
        }
    }
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub run_mode: RunMode,
    pub square: SquareConfig,
    pub admin: AdminConfig,
    pub cron: CronConfig,
    pub business: BusinessConfig,
    pub no_show: NoShowConfig,
}
