use crate::error::ConfigError;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{Config, Credentials, PgConfig, PoolSettings};

/// Prefix of environment variables that override file settings,
/// e.g. `PGMETA_PG__HOST` or `PGMETA_PG__POOL__MAX_CONNECTIONS`.
pub const ENV_PREFIX: &str = "PGMETA";

/// Loads the application configuration from the file at `path` and the environment.
///
/// The file is optional (any extension understood by the `config` crate, usually
/// `config.toml`); every missing key falls back to its default. Environment
/// variables take precedence over the file.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(environment());

    build(builder)
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

/// Deserializes the merged sources into our strongly-typed `Config` and validates it.
fn build(builder: ConfigBuilder<DefaultState>) -> Result<Config, ConfigError> {
    let config = builder.build()?.try_deserialize::<Config>()?;
    validate(&config.pg.pool)?;

    tracing::debug!(
        host = %config.pg.host,
        port = config.pg.port,
        database = %config.pg.database,
        "configuration loaded"
    );
    Ok(config)
}

fn validate(pool: &PoolSettings) -> Result<(), ConfigError> {
    if pool.max_connections == 0 {
        return Err(ConfigError::EmptyPool);
    }
    if pool.min_connections > pool.max_connections {
        return Err(ConfigError::PoolBounds {
            min: pool.min_connections,
            max: pool.max_connections,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Result<Config, ConfigError> {
        build(config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn with_env(toml: &str, vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        build(
            config::Config::builder()
                .add_source(File::from_str(toml, FileFormat::Toml))
                .add_source(environment().source(Some(env))),
        )
    }

    #[test]
    fn empty_sources_yield_defaults() {
        let config = from_toml("").unwrap();
        assert_eq!(config.pg.host, "localhost");
        assert_eq!(config.pg.port, 5432);
        assert_eq!(config.pg.database, "db");
        assert_eq!(config.pg.pool, PoolSettings::default());
    }

    #[test]
    fn reads_pg_table() {
        let config = from_toml(
            r#"
            [pg]
            host = "db.internal"
            port = 6432
            database = "testdb"
            user = "app"
            password = "secret"
            ssl = true

            [pg.pool]
            max_connections = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.pg.host, "db.internal");
        assert_eq!(config.pg.port, 6432);
        assert_eq!(config.pg.database, "testdb");
        assert_eq!(config.pg.pool.max_connections, 4);
        assert_eq!(config.pg.pool.min_connections, 1);

        let creds = config.pg.credentials().unwrap();
        assert_eq!(creds.user, "app");
        assert_eq!(creds.password, "secret");
        assert!(creds.ssl);
    }

    #[test]
    fn coerces_integer_like_port_and_boolean_like_ssl() {
        let config = from_toml(
            r#"
            [pg]
            port = "5433"
            user = "app"
            ssl = "on"
            "#,
        )
        .unwrap();

        assert_eq!(config.pg.port, 5433);
        assert!(config.pg.ssl);
    }

    #[test]
    fn environment_overrides_file() {
        let config = with_env(
            r#"
            [pg]
            host = "from-file"
            "#,
            &[
                ("PGMETA_PG__HOST", "from-env"),
                ("PGMETA_PG__PORT", "15432"),
                ("PGMETA_PG__POOL__CONNECT_TIMEOUT_MS", "250"),
            ],
        )
        .unwrap();

        assert_eq!(config.pg.host, "from-env");
        assert_eq!(config.pg.port, 15432);
        assert_eq!(config.pg.pool.connect_timeout_ms, 250);
    }

    #[test]
    fn malformed_port_is_a_load_error() {
        let err = from_toml("[pg]\nport = \"not-a-port\"").unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)), "got {err:?}");
    }

    #[test]
    fn rejects_empty_pool() {
        let err = from_toml("[pg.pool]\nmax_connections = 0").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyPool), "got {err:?}");
    }

    #[test]
    fn rejects_min_above_max() {
        let err = from_toml("[pg.pool]\nmax_connections = 2\nmin_connections = 3").unwrap_err();
        assert!(
            matches!(err, ConfigError::PoolBounds { min: 3, max: 2 }),
            "got {err:?}"
        );
        assert_eq!(
            err.to_string(),
            "pg.pool.min_connections (3) exceeds max_connections (2)"
        );
    }
}
