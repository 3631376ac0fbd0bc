use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use messagely_core::HashConfig;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

pub struct Config {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub hash: HashConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("MESSAGELY_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("MESSAGELY_JWT_SECRET is unset or still a placeholder");
        }

        let defaults = HashConfig::default();
        let hash = HashConfig {
            memory_kib: parse_or(&get, "MESSAGELY_HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or(&get, "MESSAGELY_HASH_ITERATIONS", defaults.iterations)?,
            parallelism: parse_or(&get, "MESSAGELY_HASH_PARALLELISM", defaults.parallelism)?,
        };

        Ok(Self {
            db_path: get("MESSAGELY_DB_PATH").unwrap_or_else(|| "messagely.db".into()).into(),
            host: get("MESSAGELY_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&get, "MESSAGELY_PORT", 3000)?,
            jwt_secret,
            hash,
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw.parse().with_context(|| format!("{} has invalid value '{}'", key, raw)),
        None => Ok(default),
    }
}
