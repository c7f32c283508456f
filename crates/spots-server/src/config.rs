use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me",
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub request_timeout: Duration,
    /// Load the seed files into the store before serving.
    pub populate: bool,
    pub seed_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = var("SPOTS_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("SPOTS_JWT_SECRET is unset or still a placeholder");
        }

        let port = get("SPOTS_PORT", "8080")
            .parse()
            .context("SPOTS_PORT must be a port number")?;
        let token_ttl = get("SPOTS_TOKEN_TTL_SECS", "3600")
            .parse()
            .context("SPOTS_TOKEN_TTL_SECS must be a number of seconds")?;
        let request_timeout = get("SPOTS_REQUEST_TIMEOUT_SECS", "10")
            .parse()
            .context("SPOTS_REQUEST_TIMEOUT_SECS must be a number of seconds")?;
        let populate = get("SPOTS_DB_POPULATE", "false")
            .parse()
            .context("SPOTS_DB_POPULATE must be true or false")?;

        Ok(Self {
            host: get("SPOTS_HOST", "0.0.0.0"),
            port,
            db_path: get("SPOTS_DB_PATH", "scenic-spots.db").into(),
            jwt_secret,
            token_ttl: Duration::from_secs(token_ttl),
            request_timeout: Duration::from_secs(request_timeout),
            populate,
            seed_dir: get("SPOTS_SEED_DIR", "./seed").into(),
        })
    }
}
