//! Shared helpers for the integration tests.
//!
//! These tests need a running PostgreSQL server and only run when
//! `TEST_PG_HOST` is set. The remaining parameters have defaults:
//! - TEST_PG_PORT: 5432
//! - TEST_PG_DATABASE: testdb
//! - TEST_PG_USER: postgres
//! - TEST_PG_PASSWORD: postgres
//!
//! Without `TEST_PG_HOST` each test prints a note and returns early. With it
//! set, an unreachable server fails the test.
//!
//! The tests drop and recreate the `metainfo` table; use a scratch database.

#![allow(dead_code)]

use configuration::{PgConfig, PoolSettings};
use database::{PgPlugin, PgPool, PoolManager};
use tokio::sync::{Mutex, MutexGuard};

/// Tests touching the shared `metainfo` table take this lock first.
static METAINFO_LOCK: Mutex<()> = Mutex::const_new(());

pub async fn lock_metainfo() -> MutexGuard<'static, ()> {
    METAINFO_LOCK.lock().await
}

/// Whether `host` names a server to test against.
pub fn database_requested(host: Option<&str>) -> bool {
    host.is_some_and(|h| !h.trim().is_empty())
}

fn test_host() -> Option<String> {
    std::env::var("TEST_PG_HOST")
        .ok()
        .filter(|h| database_requested(Some(h)))
}

pub fn test_config() -> PgConfig {
    PgConfig {
        host: test_host().unwrap_or_else(|| "localhost".to_string()),
        port: std::env::var("TEST_PG_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5432),
        database: std::env::var("TEST_PG_DATABASE").unwrap_or_else(|_| "testdb".to_string()),
        user: Some(std::env::var("TEST_PG_USER").unwrap_or_else(|_| "postgres".to_string())),
        password: Some(
            std::env::var("TEST_PG_PASSWORD").unwrap_or_else(|_| "postgres".to_string()),
        ),
        ssl: false,
        pool: PoolSettings::default(),
    }
}

/// Returns false (after a note) when no test server was requested.
fn should_run() -> bool {
    if test_host().is_none() {
        eprintln!("Skipping test: set TEST_PG_HOST to run the database tests");
        return false;
    }
    true
}

/// Panics unless the requested server answers a trivial query.
async fn expect_available(pool: &PgPool) {
    if let Err(e) = database::query(pool, "SELECT 1", vec![]).await {
        panic!("TEST_PG_HOST is set but the database is not reachable: {e}");
    }
}

/// Connects a fresh pool with the given settings, or `None` if no server was requested.
pub async fn connect_with(settings: PoolSettings) -> Option<PgPool> {
    if !should_run() {
        return None;
    }
    let mut config = test_config();
    config.pool = settings;

    let pool = PoolManager::new().connect(&config);
    expect_available(&pool).await;
    Some(pool)
}

pub async fn connect() -> Option<PgPool> {
    connect_with(PoolSettings::default()).await
}

/// A connected plugin, or `None` if no server was requested.
pub async fn connected_plugin() -> Option<PgPlugin> {
    if !should_run() {
        return None;
    }
    let plugin = PgPlugin::new(test_config());
    plugin.connect_hook();
    let pool = plugin.pool().expect("connect hook stores the pool");
    expect_available(&pool).await;
    Some(plugin)
}

pub async fn drop_metainfo_table(pool: &PgPool) {
    database::query(pool, "DROP TABLE IF EXISTS metainfo", vec![])
        .await
        .expect("failed to drop metainfo table");
}
