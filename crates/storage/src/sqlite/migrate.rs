use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Applies schema versions that are not yet recorded in `schema_migrations`.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: profiles and session summaries.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS profiles (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    avatar TEXT NOT NULL,
                    grammar_level INTEGER NOT NULL CHECK (grammar_level >= 1),
                    memory_level INTEGER NOT NULL CHECK (memory_level >= 1),
                    math_level INTEGER NOT NULL CHECK (math_level >= 1),
                    spelling_level INTEGER NOT NULL CHECK (spelling_level >= 1),
                    total_correct INTEGER NOT NULL CHECK (total_correct >= 0),
                    total_answered INTEGER NOT NULL CHECK (total_answered >= total_correct),
                    total_wins INTEGER NOT NULL CHECK (total_wins >= 0),
                    gold_trophies INTEGER NOT NULL CHECK (gold_trophies >= 0),
                    silver_trophies INTEGER NOT NULL CHECK (silver_trophies >= 0),
                    bronze_trophies INTEGER NOT NULL CHECK (bronze_trophies >= 0),
                    is_active INTEGER NOT NULL CHECK (is_active IN (0, 1)),
                    created_at TEXT NOT NULL,
                    last_played_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS session_summaries (
                    id INTEGER PRIMARY KEY,
                    session_id TEXT NOT NULL UNIQUE,
                    profile_id TEXT,
                    subject TEXT NOT NULL,
                    start_level INTEGER NOT NULL CHECK (start_level >= 1),
                    end_level INTEGER NOT NULL CHECK (end_level >= 1),
                    total_questions INTEGER NOT NULL CHECK (total_questions >= 0),
                    correct_count INTEGER NOT NULL CHECK (correct_count BETWEEN 0 AND total_questions),
                    started_at TEXT NOT NULL,
                    ended_at TEXT NOT NULL,
                    FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_session_summaries_profile_ended
                    ON session_summaries (profile_id, ended_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
