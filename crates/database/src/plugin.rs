use crate::connection::PoolManager;
use crate::error::DbError;
use crate::metainfo::MetaInfoStore;
use crate::query::{ResultSet, SqlArg};
use configuration::PgConfig;
use sqlx::PgPool;

/// The lifecycle hooks this crate registers with the host application.
///
/// The host calls [`PgPlugin::connect_hook`] once during startup and asks
/// [`PgPlugin::metainfo`] for the metainfo store whenever it needs one.
#[derive(Debug)]
pub struct PgPlugin {
    config: PgConfig,
    pools: PoolManager,
}

impl PgPlugin {
    pub fn new(config: PgConfig) -> Self {
        Self {
            config,
            pools: PoolManager::new(),
        }
    }

    pub fn config(&self) -> &PgConfig {
        &self.config
    }

    /// Creates the connection pool from the loaded configuration.
    pub fn connect_hook(&self) {
        self.pools.connect(&self.config);
    }

    /// Provides the metainfo store, or `None` while no pool exists.
    ///
    /// `None` tells the host that metainfo is not currently available; it is
    /// not an error.
    pub fn metainfo(&self) -> Option<MetaInfoStore> {
        self.pools.current().map(MetaInfoStore::new)
    }

    pub fn pool(&self) -> Option<PgPool> {
        self.pools.current()
    }

    pub async fn query(&self, sql: &str, args: Vec<SqlArg>) -> Result<ResultSet, DbError> {
        self.pools.query(sql, args).await
    }
}
