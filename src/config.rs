use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store_url: String,
    pub session_file: PathBuf,
    pub refresh_placeholder_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_url: "http://localhost:3001".into(),
            session_file: PathBuf::from(".patchsentryx/session.json"),
            refresh_placeholder_ms: 600,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            store_url: std::env::var("STORE_URL").unwrap_or(defaults.store_url),
            session_file: std::env::var("SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.session_file),
            refresh_placeholder_ms: std::env::var("REFRESH_PLACEHOLDER_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(defaults.refresh_placeholder_ms),
        })
    }

    pub fn refresh_placeholder(&self) -> Duration {
        Duration::from_millis(self.refresh_placeholder_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MockStoreConfig {
    pub host: String,
    pub port: u16,
    pub db_path: Option<PathBuf>,
}

impl MockStoreConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: std::env::var("MOCK_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("MOCK_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(3001),
            db_path: std::env::var("MOCK_DB")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
