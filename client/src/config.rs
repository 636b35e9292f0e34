//! Client configuration
//!
//! Read once from the environment; the CLI may override individual fields.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use dotask_core::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_DATA_DIR: &str = ".dotask";
pub const DEFAULT_REFRESH_SECS: u64 = 30;

/// How requests identify the signed-in user. A deployment uses exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthScheme {
    /// `Authorization: <type> <token>`
    #[default]
    Bearer,
    /// `X-User-ID: <user id>`
    UserId,
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer => f.write_str("bearer"),
            Self::UserId => f.write_str("user-id"),
        }
    }
}

impl FromStr for AuthScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bearer" | "token" => Ok(Self::Bearer),
            "user-id" | "user_id" | "userid" | "x-user-id" => Ok(Self::UserId),
            other => Err(Error::InvalidInput(format!("unknown auth scheme: {}", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server origin, without the `/api` prefix
    pub base_url: String,
    pub auth_scheme: AuthScheme,
    /// Directory holding the persisted session
    pub data_dir: PathBuf,
    /// Period of the dashboard refresh loop
    pub refresh_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            auth_scheme: AuthScheme::default(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl ClientConfig {
    /// Build from `DOTASK_*` environment variables, falling back to defaults.
    ///
    /// An unparseable value is an error rather than a silent default.
    pub fn from_env() -> dotask_core::Result<Self> {
        let mut config = Self::default();

        if let Some(url) = env_value("DOTASK_API_URL") {
            config.base_url = url;
        }
        if let Some(scheme) = env_value("DOTASK_AUTH_SCHEME") {
            config.auth_scheme = scheme.parse()?;
        }
        if let Some(dir) = env_value("DOTASK_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(secs) = env_value("DOTASK_REFRESH_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                Error::InvalidInput(format!("DOTASK_REFRESH_SECS is not a number: {}", secs))
            })?;
            config.refresh_interval = Duration::from_secs(secs.max(1));
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_auth_scheme(mut self, auth_scheme: AuthScheme) -> Self {
        self.auth_scheme = auth_scheme;
        self
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Location of the session file
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }
}
