//! The fixed, ordered list of migrations that install/uninstall manage.

/// One reversible schema change.
pub struct Migration {
    /// Stable name recorded in `byplay_migrations`; never reuse or reorder
    /// once shipped, since `install` keys on it.
    pub name: &'static str,
    pub up: &'static str,
    pub down: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[Migration {
    name: "0001_create_byplay",
    up: r#"
        CREATE TABLE byplay (
            id BIGSERIAL PRIMARY KEY,
            job TEXT NOT NULL,
            args TEXT NOT NULL,
            state SMALLINT NOT NULL CHECK (state IN (0, 1, 2)),
            queue TEXT NOT NULL
        );
        CREATE INDEX byplay_state_queue_id_idx ON byplay (state, queue, id);
    "#,
    down: r#"
        DROP INDEX IF EXISTS byplay_state_queue_id_idx;
        DROP TABLE IF EXISTS byplay;
    "#,
}];
