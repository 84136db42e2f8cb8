use serde::{Deserialize, Serialize};
use std::{
    fmt,
    net::{IpAddr, SocketAddr},
    time::Duration,
};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_SEARCH_TIMEOUT_MS: u64 = 10_000;
pub const ENV_SPOTIFY_CLIENT_ID: &str = "SPOTIFY_CLIENT_ID";
pub const ENV_SPOTIFY_CLIENT_SECRET: &str = "SPOTIFY_CLIENT_SECRET";
pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(v))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(**redacted**)")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: ApiKey,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// IP literals bind as given; hostnames such as `localhost` go through
    /// the system resolver and the first address wins.
    pub async fn resolve_addr(&self) -> Result<SocketAddr, ConfigError> {
        let host = self.host.trim();
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }
        let invalid = || ConfigError::InvalidBindAddress(format!("{host}:{}", self.port));
        if host.is_empty() {
            return Err(invalid());
        }
        tokio::net::lookup_host((host, self.port))
            .await
            .map_err(|_| invalid())?
            .next()
            .ok_or_else(invalid)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchTimeout {
    pub millis: u64,
}

impl SearchTimeout {
    pub fn new(millis: u64) -> Result<Self, ConfigError> {
        if millis == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(Self { millis })
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.millis)
    }
}

impl Default for SearchTimeout {
    fn default() -> Self {
        Self {
            millis: DEFAULT_SEARCH_TIMEOUT_MS,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// `None` means recommendations always come from the static catalog.
    pub spotify: Option<SpotifyCredentials>,
    pub server: ServerConfig,
    pub search_timeout: SearchTimeout,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("api key must not be empty")]
    EmptyApiKey,
    #[error("search timeout must be > 0 ms")]
    ZeroTimeout,
    #[error("invalid port: {0}")]
    InvalidPort(String),
    #[error("invalid bind address: {0}")]
    InvalidBindAddress(String),
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// CLI value if given, else the environment. Blank values count as unset.
pub fn resolve_optional_string(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Option<String> {
    cli_value
        .or_else(|| env.var(env_key))
        .filter(|v| !v.trim().is_empty())
}

pub fn resolve_string_with_default(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    default: &str,
) -> String {
    resolve_optional_string(cli_value, env_key, env).unwrap_or_else(|| default.to_owned())
}

pub fn resolve_port(cli_value: Option<u16>, env: &impl Env) -> Result<u16, ConfigError> {
    if let Some(port) = cli_value {
        return Ok(port);
    }
    match resolve_optional_string(None, ENV_PORT, env) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidPort(raw)),
        None => Ok(DEFAULT_PORT),
    }
}

/// Both halves are required; with either one missing search is disabled.
pub fn resolve_spotify_credentials(
    cli_client_id: Option<String>,
    cli_client_secret: Option<String>,
    env: &impl Env,
) -> Result<Option<SpotifyCredentials>, ConfigError> {
    let client_id = resolve_optional_string(cli_client_id, ENV_SPOTIFY_CLIENT_ID, env);
    let client_secret = resolve_optional_string(cli_client_secret, ENV_SPOTIFY_CLIENT_SECRET, env);
    match (client_id, client_secret) {
        (Some(client_id), Some(secret)) => Ok(Some(SpotifyCredentials {
            client_id,
            client_secret: ApiKey::new(secret)?,
        })),
        _ => Ok(None),
    }
}
