//! Schema installer: creates/drops the `byplay` table and its supporting
//! index, tracked via the `byplay_migrations` metadata table.
//!
//! Both `install` and `uninstall` are idempotent: calling either when there
//! is nothing left to do is a no-op that still succeeds.

use crate::error::DbResult;
use crate::migrations::MIGRATIONS;
use sqlx::PgPool;
use tracing::info;

const CREATE_MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS byplay_migrations (
        name TEXT PRIMARY KEY,
        applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

async fn is_applied(tx: &mut sqlx::PgConnection, name: &str) -> sqlx::Result<bool> {
    let row: Option<(String,)> = sqlx::query_as("SELECT name FROM byplay_migrations WHERE name = $1")
        .bind(name)
        .fetch_optional(&mut *tx)
        .await?;
    Ok(row.is_some())
}

async fn migrations_table_exists(tx: &mut sqlx::PgConnection) -> sqlx::Result<bool> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_name = 'byplay_migrations')",
    )
    .fetch_one(&mut *tx)
    .await?;
    Ok(exists)
}

/// Apply any migration in [`MIGRATIONS`] not yet recorded in
/// `byplay_migrations`, creating that table first if needed.
pub async fn install(pool: &PgPool) -> DbResult<()> {
    let mut tx = pool.begin().await?;
    sqlx::raw_sql(CREATE_MIGRATIONS_TABLE).execute(&mut *tx).await?;

    for migration in MIGRATIONS {
        if is_applied(&mut tx, migration.name).await? {
            continue;
        }
        sqlx::raw_sql(migration.up).execute(&mut *tx).await?;
        sqlx::query("INSERT INTO byplay_migrations (name) VALUES ($1)")
            .bind(migration.name)
            .execute(&mut *tx)
            .await?;
        info!(migration = migration.name, "applied byplay migration");
    }

    tx.commit().await?;
    Ok(())
}

/// Roll back every applied migration in reverse order, then drop
/// `byplay_migrations` itself.
pub async fn uninstall(pool: &PgPool) -> DbResult<()> {
    let mut tx = pool.begin().await?;

    if !migrations_table_exists(&mut tx).await? {
        tx.commit().await?;
        return Ok(());
    }

    for migration in MIGRATIONS.iter().rev() {
        if !is_applied(&mut tx, migration.name).await? {
            continue;
        }
        sqlx::raw_sql(migration.down).execute(&mut *tx).await?;
        sqlx::query("DELETE FROM byplay_migrations WHERE name = $1")
            .bind(migration.name)
            .execute(&mut *tx)
            .await?;
        info!(migration = migration.name, "reverted byplay migration");
    }

    sqlx::raw_sql("DROP TABLE IF EXISTS byplay_migrations")
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_database_url() -> Option<String> {
        std::env::var("TEST_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .ok()
    }

    fn init_test_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    #[tokio::test]
    async fn install_and_uninstall_are_idempotent() {
        init_test_tracing();
        let Some(url) = test_database_url() else {
            eprintln!("skipping: no TEST_DATABASE_URL/DATABASE_URL set");
            return;
        };
        let pool = PgPool::connect(&url).await.expect("connect");

        install(&pool).await.expect("first install");
        install(&pool).await.expect("second install is a no-op");

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM byplay")
            .fetch_one(&pool)
            .await
            .expect("byplay table exists after install");
        assert_eq!(count.0, 0);

        uninstall(&pool).await.expect("first uninstall");
        uninstall(&pool).await.expect("second uninstall is a no-op");

        let table_gone: (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_name = 'byplay')",
        )
        .fetch_one(&pool)
        .await
        .expect("query information_schema");
        assert!(!table_gone.0);
    }
}
