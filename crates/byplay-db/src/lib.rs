//! Database layer for the byplay job queue.
//!
//! Provides the schema installer and a thin pool-construction helper.

pub mod error;
pub mod migrations;
pub mod schema;

pub use error::{DbError, DbResult};

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create a new database connection pool.
pub async fn create_pool(database_url: &str) -> DbResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    Ok(pool)
}
