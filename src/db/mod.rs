//! Database layer
//!
//! Credential storage for the authentication API. SQLite is the default
//! backend, MySQL is available for shared deployments; the driver is picked
//! from configuration and hidden behind [`DatabasePool`].

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};

use anyhow::{anyhow, Result};
use sqlx::{MySqlPool, SqlitePool};

/// Borrow the SQLite pool, failing if the driver is something else
pub(crate) fn sqlite(pool: &DynDatabasePool) -> Result<&SqlitePool> {
    pool.as_sqlite()
        .ok_or_else(|| anyhow!("Database driver mismatch: expected sqlite"))
}

/// Borrow the MySQL pool, failing if the driver is something else
pub(crate) fn mysql(pool: &DynDatabasePool) -> Result<&MySqlPool> {
    pool.as_mysql()
        .ok_or_else(|| anyhow!("Database driver mismatch: expected mysql"))
}
