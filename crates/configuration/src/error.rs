use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// A source could not be read, or a value had the wrong shape (e.g. a non-numeric port).
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("pg.pool.max_connections must be at least 1")]
    EmptyPool,

    #[error("pg.pool.min_connections ({min}) exceeds max_connections ({max})")]
    PoolBounds { min: u32, max: u32 },
}
