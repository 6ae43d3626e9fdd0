use config::{Config, Environment, File};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::env;
use thiserror::Error;
use tracing::warn;
pub mod models;
pub use models::*;

/// Prefix for structured overrides, e.g. `DETAILING__SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "DETAILING";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("configuration is not serializable: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Name of the active environment, from `RUN_ENV` or (for compatibility with
/// the web frontend's deployment) `NODE_ENV`.
pub fn run_env() -> Option<String> {
    env::var("RUN_ENV")
        .or_else(|_| env::var("NODE_ENV"))
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Loads the configuration.
///
/// Layering, later wins: built-in defaults, `config/default.*`,
/// `config/{run_env}.*`, `DETAILING__*` variables. Afterwards every
/// `secret_from_env` marker is replaced from the environment.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = run_env();
    let env_file = format!("config/{}", run_env.as_deref().unwrap_or("production"));

    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&env_file).required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut app_config: AppConfig = builder.build()?.try_deserialize()?;
    if let Some(value) = run_env {
        app_config.run_mode = RunMode::from_env_value(&value);
    }
    apply_env_overrides_from_marker(app_config, |key| env::var(key).ok())
}

/// Recursively replaces all "secret_from_env" string values using `lookup`.
///
/// The key is the JSON path joined with `_` and upper-cased, so
/// `square.access_token` becomes `SQUARE_ACCESS_TOKEN`.
fn inject_env_secrets<F>(value: &mut Value, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    fn walk<F>(path: Vec<String>, obj: &mut Value, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    let mut new_path = path.clone();
                    new_path.push(k.to_string());
                    walk(new_path, v, lookup);
                }
            }
            Value::String(s) if s == SECRET_FROM_ENV => {
                let env_key = path.join("_").to_uppercase();
                match lookup(&env_key) {
                    Some(env_val) => *obj = Value::String(env_val),
                    None => warn!("env var {} not found for secret_from_env", env_key),
                }
            }
            _ => {}
        }
    }

    walk(vec![], value, lookup);
}

/// Applies environment overrides based on "secret_from_env" markers in the serialized config.
pub fn apply_env_overrides_from_marker<F>(
    config: AppConfig,
    lookup: F,
) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut json = serde_json::to_value(&config)?;
    inject_env_secrets(&mut json, &lookup);
    Ok(serde_json::from_value(json)?)
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Loads the dotenv file into the process environment, once.
///
/// `DOTENV_OVERRIDE` names an alternative file; the default is `.env`.
/// Returns the path that was (attempted to be) loaded.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path = env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}
