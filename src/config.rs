use std::net::SocketAddr;
use std::path::PathBuf;

use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: &str = "5420";
const DEFAULT_STATIC_DIR: &str = "./static";

/// Process-wide settings, read once at start-up.
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    /// Backend base URL without a trailing slash.
    pub backend_url: String,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let host = var("HOST", DEFAULT_HOST);
        let port = var("PORT", DEFAULT_PORT);
        let port: u16 = port.parse().map_err(|_| ConfigError::Port(port))?;
        let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

        let backend_url = var("SPEACHES_URL", DEFAULT_BACKEND_URL);
        Url::parse(&backend_url).map_err(|e| ConfigError::BackendUrl(backend_url.clone(), e))?;

        Ok(Self {
            addr,
            backend_url: backend_url.trim_end_matches('/').to_string(),
            static_dir: var("STATIC_DIR", DEFAULT_STATIC_DIR).into(),
        })
    }
}
