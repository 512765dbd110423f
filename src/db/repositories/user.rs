//! User repository
//!
//! Database operations for users and their home location.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::{mysql, sqlite, DynDatabasePool};
use crate::models::{HomeLocation, User};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by username (exact, case-sensitive match)
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Overwrite the home location. Returns `None` if the user does not exist.
    async fn update_home_location(
        &self,
        id: i64,
        location: HomeLocation,
    ) -> Result<Option<User>>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a shared repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_user_sqlite(sqlite(&self.pool)?, user).await,
            DatabaseDriver::Mysql => create_user_mysql(mysql(&self.pool)?, user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_user_by_id_sqlite(sqlite(&self.pool)?, id).await,
            DatabaseDriver::Mysql => get_user_by_id_mysql(mysql(&self.pool)?, id).await,
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_username_sqlite(sqlite(&self.pool)?, username).await
            }
            DatabaseDriver::Mysql => get_user_by_username_mysql(mysql(&self.pool)?, username).await,
        }
    }

    async fn update_home_location(
        &self,
        id: i64,
        location: HomeLocation,
    ) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let pool = sqlite(&self.pool)?;
                update_home_location_sqlite(pool, id, location).await?;
                get_user_by_id_sqlite(pool, id).await
            }
            DatabaseDriver::Mysql => {
                let pool = mysql(&self.pool)?;
                update_home_location_mysql(pool, id, location).await?;
                get_user_by_id_mysql(pool, id).await
            }
        }
    }
}

/// Both columns must be present; a half-written pair reads as absent.
fn home_location_from_columns(lat: Option<f64>, lng: Option<f64>) -> Option<HomeLocation> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Some(HomeLocation::new(lat, lng)),
        _ => None,
    }
}

const SELECT_USER: &str = r#"
    SELECT id, username, password_hash, home_lat, home_lng, created_at, updated_at
    FROM users
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, home_lat, home_lng, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(user.home_location.map(|l| l.lat))
    .bind(user.home_location.map(|l| l.lng))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_rowid(),
        username: user.username.clone(),
        password_hash: user.password_hash.clone(),
        home_location: user.home_location,
        created_at: now,
        updated_at: now,
    })
}

async fn get_user_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_USER))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by ID")?;

    row.as_ref().map(row_to_user_sqlite).transpose()
}

async fn get_user_by_username_sqlite(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("{} WHERE username = ?", SELECT_USER))
        .bind(username)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by username")?;

    row.as_ref().map(row_to_user_sqlite).transpose()
}

async fn update_home_location_sqlite(
    pool: &SqlitePool,
    id: i64,
    location: HomeLocation,
) -> Result<()> {
    sqlx::query("UPDATE users SET home_lat = ?, home_lng = ?, updated_at = ? WHERE id = ?")
        .bind(location.lat)
        .bind(location.lng)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update home location")?;
    Ok(())
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        home_location: home_location_from_columns(
            row.try_get("home_lat")?,
            row.try_get("home_lng")?,
        ),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, home_lat, home_lng, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(user.home_location.map(|l| l.lat))
    .bind(user.home_location.map(|l| l.lng))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_id() as i64,
        username: user.username.clone(),
        password_hash: user.password_hash.clone(),
        home_location: user.home_location,
        created_at: now,
        updated_at: now,
    })
}

async fn get_user_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_USER))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by ID")?;

    row.as_ref().map(row_to_user_mysql).transpose()
}

async fn get_user_by_username_mysql(pool: &MySqlPool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("{} WHERE username = ?", SELECT_USER))
        .bind(username)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by username")?;

    row.as_ref().map(row_to_user_mysql).transpose()
}

async fn update_home_location_mysql(
    pool: &MySqlPool,
    id: i64,
    location: HomeLocation,
) -> Result<()> {
    sqlx::query("UPDATE users SET home_lat = ?, home_lng = ?, updated_at = ? WHERE id = ?")
        .bind(location.lat)
        .bind(location.lng)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update home location")?;
    Ok(())
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        home_location: home_location_from_columns(
            row.try_get("home_lat")?,
            row.try_get("home_lng")?,
        ),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
