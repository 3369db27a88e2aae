use crate::error::DbError;
use crate::query::{self, ResultSet, SqlArg};
use configuration::{PgConfig, PoolSettings};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use std::sync::{PoisonError, RwLock};

/// Translates the `[pg]` configuration into driver connect options.
///
/// Credentials are only applied when a user is configured; TLS is required
/// when the `ssl` flag is set alongside a user and disabled otherwise.
pub fn connect_options(config: &PgConfig) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.database);

    match config.credentials() {
        Some(creds) => {
            let ssl_mode = if creds.ssl {
                PgSslMode::Require
            } else {
                PgSslMode::Disable
            };
            options
                .username(&creds.user)
                .password(&creds.password)
                .ssl_mode(ssl_mode)
        }
        None => options.ssl_mode(PgSslMode::Disable),
    }
}

/// Pool sizing and timeouts. The connect timeout bounds how long a caller
/// waits to lease a connection.
pub fn pool_options(settings: &PoolSettings) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .idle_timeout(settings.idle_timeout())
        .acquire_timeout(settings.connect_timeout())
}

/// Owns the connection pool handle for the host application.
///
/// The host keeps one `PoolManager` and passes it (or the pools it hands
/// out) by reference; there is no module-level singleton.
#[derive(Debug, Default)]
pub struct PoolManager {
    pool: RwLock<Option<PgPool>>,
}

impl PoolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the connection pool from `config` and stores it.
    ///
    /// The pool is created lazily: reachability is not checked here, failures
    /// surface on the first query. Calling this again replaces the stored
    /// handle; callers that already hold a clone of the previous pool keep
    /// using it until they drop it.
    ///
    /// Must be called from within a Tokio runtime, since the pool spawns its
    /// idle-reaping task on creation.
    pub fn connect(&self, config: &PgConfig) -> PgPool {
        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "Connect DB (pg://{}:{})",
            config.host,
            config.port
        );

        let pool = pool_options(&config.pool).connect_lazy_with(connect_options(config));

        let previous = self
            .pool
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(pool.clone());
        if previous.is_some() {
            tracing::warn!("Replacing existing connection pool.");
        }

        pool
    }

    /// Returns the current pool, or `None` if `connect` has not run yet.
    pub fn current(&self) -> Option<PgPool> {
        self.pool
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Runs a single statement on the current pool.
    pub async fn query(&self, sql: &str, args: Vec<SqlArg>) -> Result<ResultSet, DbError> {
        let pool = self.current().ok_or(DbError::NotConnected)?;
        Ok(query::query(&pool, sql, args).await?)
    }
}
