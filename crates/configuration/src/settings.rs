use serde::Deserialize;
use std::time::Duration;

/// The root configuration structure for the application.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pg: PgConfig,
}

/// Connection parameters for the PostgreSQL server, read from the `[pg]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PgConfig {
    pub host: String,
    /// Integer-like strings (e.g. from environment variables) are coerced
    /// by the `config` crate during deserialization.
    pub port: u16,
    pub database: String,
    /// Presence of a user gates `password` and `ssl`; see [`PgConfig::credentials`].
    pub user: Option<String>,
    pub password: Option<String>,
    /// Accepts `true`/`false`, `1`/`0`, `on`/`off`, `yes`/`no`.
    pub ssl: bool,
    pub pool: PoolSettings,
}

/// Credentials used to authenticate against the server.
///
/// Only produced when a user is configured, in which case the password and
/// the TLS flag are always set, falling back to an empty password and no TLS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
    pub ssl: bool,
}

/// Sizing and timeout parameters for the connection pool, read from `[pg.pool]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Upper bound of physical connections. Must be at least 1.
    pub max_connections: u32,
    /// Connections the pool tries to keep open.
    pub min_connections: u32,
    /// Idle connections are closed after this many milliseconds.
    pub idle_timeout_ms: u64,
    /// Leasing a connection fails if none becomes available within this many milliseconds.
    pub connect_timeout_ms: u64,
}

impl PgConfig {
    /// Returns the credentials block, or `None` when no user is configured.
    pub fn credentials(&self) -> Option<Credentials> {
        let user = self.user.as_ref().filter(|u| !u.is_empty())?;
        Some(Credentials {
            user: user.clone(),
            password: self.password.clone().unwrap_or_default(),
            ssl: self.ssl,
        })
    }
}

impl PoolSettings {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

// --- Default Implementations ---
// These allow a user to omit any key (or the whole `[pg]` table) and still
// get a working local setup.

impl Default for PgConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "db".to_string(),
            user: None,
            password: None,
            ssl: false,
            pool: PoolSettings::default(),
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 20,
            min_connections: 1,
            idle_timeout_ms: 1_000,
            connect_timeout_ms: 1_000,
        }
    }
}
