//! # pgmeta Database Crate
//!
//! A thin, pooled access layer to PostgreSQL plus a tiny key-value
//! "metainfo" store used for schema/version bookkeeping.
//!
//! ## Architectural Principles
//!
//! - **Explicit Pool Ownership:** The pool lives in a `PoolManager` owned by the
//!   host, never in a global. Reconnecting swaps the handle; holders of the old
//!   handle finish their work on it.
//! - **One Lease Per Statement:** Every query leases one connection, runs one
//!   statement and releases the lease on every exit path. Failures are logged
//!   once and returned unchanged; nothing is retried.
//! - **Lazy Bootstrap:** The `metainfo` table is created on first use with
//!   `CREATE TABLE IF NOT EXISTS`, so concurrent creators do not conflict.
//!
//! ## Public API
//!
//! - `PoolManager`: `connect` builds the pool from `PgConfig`, `current` returns it.
//! - `query`: runs one positional-parameter statement and returns a `ResultSet`.
//! - `MetaInfoStore` / `MetaInfo`: get/set of the JSON value stored under `versions`.
//! - `PgPlugin`: the connect and metainfo-provider hooks handed to the host.
//! - `DbError`: the error type returned by the higher-level operations.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod metainfo;
pub mod plugin;
pub mod query;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{PoolManager, connect_options, pool_options};
pub use error::DbError;
pub use metainfo::{META_KEY, META_TABLE, MetaInfo, MetaInfoStore};
pub use plugin::PgPlugin;
pub use query::{ResultSet, SqlArg, query};
pub use sqlx::PgPool;
