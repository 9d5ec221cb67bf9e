use crate::client::{DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::error::ConfigError;
use std::env;
use std::net::SocketAddr;

const DEFAULT_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

/// Process configuration, read once at startup.
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub addr: SocketAddr,
    pub base_url: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("addr", &self.addr)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Config {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv_outcome(dotenvy::dotenv())?;
        Self::from_lookup(|key: &str| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_key = non_blank("API_KEY").ok_or(ConfigError::MissingApiKey)?;
        let model = non_blank("FINDICT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_base = non_blank("FINDICT_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let addr = non_blank("FINDICT_ADDR")
            .unwrap_or_else(|| DEFAULT_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|err: std::net::AddrParseError| ConfigError::Invalid {
                key: "FINDICT_ADDR",
                reason: err.to_string(),
            })?;
        let base_url = non_blank("FINDICT_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_key: api_key.trim().to_string(),
            model,
            api_base,
            addr,
            base_url,
        })
    }
}

/// A missing `.env` is fine; an unreadable or malformed one is not.
fn dotenv_outcome<T>(result: Result<T, dotenvy::Error>) -> Result<(), ConfigError> {
    match result {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(ConfigError::Invalid {
            key: ".env",
            reason: err.to_string(),
        }),
    }
}
