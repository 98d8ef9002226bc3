//! Embedded schema, applied idempotently at startup

use sqlx::PgPool;

/// Schema statements in dependency order
const SCHEMA: &[(&str, &str)] = &[
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            handle TEXT NOT NULL UNIQUE,
            first_name TEXT,
            last_name TEXT,
            photo_path TEXT,
            bio TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "user_shortcuts",
        r#"
        CREATE TABLE IF NOT EXISTS user_shortcuts (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            url TEXT NOT NULL,
            icon TEXT,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (user_id, url)
        )
        "#,
    ),
    (
        "songs",
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT,
            genre TEXT,
            status TEXT NOT NULL DEFAULT 'idea',
            visibility TEXT NOT NULL DEFAULT 'private',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "lyrics",
        r#"
        CREATE TABLE IF NOT EXISTS lyrics (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            song_id BIGINT REFERENCES songs(id) ON DELETE CASCADE,
            title TEXT,
            content TEXT NOT NULL,
            section_type TEXT NOT NULL DEFAULT 'idea',
            section_order INTEGER,
            mood TEXT,
            notes TEXT,
            status TEXT NOT NULL DEFAULT 'draft',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "song_collaborators",
        r#"
        CREATE TABLE IF NOT EXISTS song_collaborators (
            song_id BIGINT NOT NULL REFERENCES songs(id) ON DELETE CASCADE,
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            role TEXT NOT NULL DEFAULT 'editor',
            invited_by BIGINT REFERENCES users(id) ON DELETE SET NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (song_id, user_id)
        )
        "#,
    ),
    (
        "user_gallery",
        r#"
        CREATE TABLE IF NOT EXISTS user_gallery (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
            gallery_url TEXT NOT NULL UNIQUE,
            gallery_name TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "gallery_artworks",
        r#"
        CREATE TABLE IF NOT EXISTS gallery_artworks (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT,
            image_path TEXT NOT NULL,
            is_published BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "user_blog",
        r#"
        CREATE TABLE IF NOT EXISTS user_blog (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
            blog_url TEXT NOT NULL UNIQUE,
            blog_name TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "blog_posts",
        r#"
        CREATE TABLE IF NOT EXISTS blog_posts (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            content TEXT,
            is_published BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "test_runs",
        r#"
        CREATE TABLE IF NOT EXISTS test_runs (
            id BIGSERIAL PRIMARY KEY,
            platform TEXT NOT NULL CHECK (platform IN ('web', 'android')),
            environment TEXT NOT NULL DEFAULT 'local',
            branch TEXT,
            commit_hash TEXT,
            started_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            ended_at TIMESTAMPTZ,
            total_tests INTEGER NOT NULL DEFAULT 0,
            passed_tests INTEGER NOT NULL DEFAULT 0,
            failed_tests INTEGER NOT NULL DEFAULT 0,
            skipped_tests INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'running',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "test_suites",
        r#"
        CREATE TABLE IF NOT EXISTS test_suites (
            id BIGSERIAL PRIMARY KEY,
            test_run_id BIGINT NOT NULL REFERENCES test_runs(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            file_path TEXT,
            category TEXT,
            started_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            ended_at TIMESTAMPTZ,
            duration_ms BIGINT,
            total_tests INTEGER NOT NULL DEFAULT 0,
            passed_tests INTEGER NOT NULL DEFAULT 0,
            failed_tests INTEGER NOT NULL DEFAULT 0,
            skipped_tests INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'running'
        )
        "#,
    ),
    (
        "test_cases",
        r#"
        CREATE TABLE IF NOT EXISTS test_cases (
            id BIGSERIAL PRIMARY KEY,
            test_suite_id BIGINT NOT NULL REFERENCES test_suites(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            duration_ms BIGINT,
            started_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            ended_at TIMESTAMPTZ,
            error_message TEXT,
            error_stack TEXT
        )
        "#,
    ),
    (
        "breakroom_blocks",
        r#"
        CREATE TABLE IF NOT EXISTS breakroom_blocks (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            block_type TEXT NOT NULL,
            content_id BIGINT,
            x INTEGER NOT NULL DEFAULT 0 CHECK (x >= 0),
            y INTEGER NOT NULL DEFAULT 0 CHECK (y >= 0),
            w INTEGER NOT NULL DEFAULT 2 CHECK (w >= 1),
            h INTEGER NOT NULL DEFAULT 2 CHECK (h >= 1),
            title TEXT,
            settings JSONB,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "breakroom_block_positions",
        r#"
        CREATE TABLE IF NOT EXISTS breakroom_block_positions (
            block_id BIGINT NOT NULL REFERENCES breakroom_blocks(id) ON DELETE CASCADE,
            col_count INTEGER NOT NULL CHECK (col_count >= 1),
            x INTEGER NOT NULL CHECK (x >= 0),
            y INTEGER NOT NULL CHECK (y >= 0),
            w INTEGER NOT NULL CHECK (w >= 1),
            h INTEGER NOT NULL CHECK (h >= 1),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (block_id, col_count)
        )
        "#,
    ),
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_lyrics_song ON lyrics(song_id)",
    "CREATE INDEX IF NOT EXISTS idx_lyrics_user ON lyrics(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_song_collaborators_user ON song_collaborators(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_gallery_artworks_user ON gallery_artworks(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_test_suites_run ON test_suites(test_run_id)",
    "CREATE INDEX IF NOT EXISTS idx_test_cases_suite ON test_cases(test_suite_id)",
    "CREATE INDEX IF NOT EXISTS idx_breakroom_blocks_user ON breakroom_blocks(user_id)",
];

/// Table names in creation order.
pub fn tables() -> impl Iterator<Item = &'static str> {
    SCHEMA.iter().map(|(name, _)| *name)
}

/// Apply the embedded schema.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running migrations...");

    for (table, ddl) in SCHEMA {
        sqlx::query(ddl).execute(pool).await?;
        tracing::debug!(table, "table ready");
    }

    for ddl in INDEXES {
        sqlx::query(ddl).execute(pool).await?;
    }

    tracing::info!(tables = SCHEMA.len(), "Migrations complete");
    Ok(())
}

/// Run an additional SQL file's contents (may hold several statements).
pub async fn run_script(pool: &PgPool, sql: &str) -> Result<(), sqlx::Error> {
    use sqlx::Executor;

    pool.execute(sql).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referenced_tables_created_first() {
        let order: Vec<&str> = tables().collect();
        let pos = |name: &str| order.iter().position(|t| *t == name).unwrap();

        for (table, ddl) in SCHEMA {
            for referenced in order.iter().filter(|t| ddl.contains(&format!("REFERENCES {}(", t))) {
                assert!(
                    pos(referenced) < pos(table),
                    "{} references {} before it is created",
                    table,
                    referenced
                );
            }
        }
    }

    #[test]
    fn every_statement_is_idempotent() {
        assert!(SCHEMA.iter().all(|(_, ddl)| ddl.contains("IF NOT EXISTS")));
        assert!(INDEXES.iter().all(|ddl| ddl.contains("IF NOT EXISTS")));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn migrations_run_twice() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::connect(&url, crate::db::PoolSettings::default())
            .await
            .expect("pool");
        run(&pool).await.expect("first run");
        run(&pool).await.expect("second run");
    }
}
