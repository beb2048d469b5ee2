use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Memory,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => bail!("unknown VERSE_DB_BACKEND '{}' (expected sqlite or memory)", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backend: Backend,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("VERSE_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("VERSE_JWT_SECRET is unset or still a placeholder; set it in .env");
        }

        let port = get("VERSE_PORT")
            .unwrap_or_else(|| "5000".into())
            .parse::<u16>()
            .context("VERSE_PORT must be a port number")?;
        let token_ttl_days = get("VERSE_TOKEN_TTL_DAYS")
            .unwrap_or_else(|| "7".into())
            .parse::<i64>()
            .context("VERSE_TOKEN_TTL_DAYS must be a whole number of days")?;
        if token_ttl_days <= 0 {
            bail!("VERSE_TOKEN_TTL_DAYS must be positive");
        }

        Ok(Self {
            host: get("VERSE_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            backend: get("VERSE_DB_BACKEND")
                .unwrap_or_else(|| "sqlite".into())
                .parse::<Backend>()?,
            db_path: get("VERSE_DB_PATH").unwrap_or_else(|| "verse.db".into()).into(),
            jwt_secret,
            token_ttl_days,
        })
    }
}
