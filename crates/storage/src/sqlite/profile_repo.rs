use quiz_core::model::{PersistedProfile, PlayerProfile, ProfileId, SubjectLevels, Trophies};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{conn, profile_id_from_str, ser, u32_from_i64},
};
use crate::repository::{ProfileRepository, StorageError};

const PROFILE_COLUMNS: &str = r"
    id, name, avatar,
    grammar_level, memory_level, math_level, spelling_level,
    total_correct, total_answered, total_wins,
    gold_trophies, silver_trophies, bronze_trophies,
    is_active, created_at, last_played_at
";

fn level(row: &sqlx::sqlite::SqliteRow, field: &'static str) -> Result<u32, StorageError> {
    u32_from_i64(field, row.try_get::<i64, _>(field).map_err(ser)?)
}

fn map_profile_row(row: &sqlx::sqlite::SqliteRow) -> Result<PlayerProfile, StorageError> {
    let id = profile_id_from_str(&row.try_get::<String, _>("id").map_err(ser)?)?;
    let levels = SubjectLevels {
        grammar: level(row, "grammar_level")?,
        memory: level(row, "memory_level")?,
        math: level(row, "math_level")?,
        spelling: level(row, "spelling_level")?,
    };
    let trophies = Trophies {
        gold: level(row, "gold_trophies")?,
        silver: level(row, "silver_trophies")?,
        bronze: level(row, "bronze_trophies")?,
    };

    PlayerProfile::from_persisted(PersistedProfile {
        id,
        name: row.try_get("name").map_err(ser)?,
        avatar: row.try_get("avatar").map_err(ser)?,
        levels,
        total_correct: level(row, "total_correct")?,
        total_answered: level(row, "total_answered")?,
        total_wins: level(row, "total_wins")?,
        trophies,
        is_active: row.try_get::<i64, _>("is_active").map_err(ser)? != 0,
        created_at: row.try_get("created_at").map_err(ser)?,
        last_played_at: row.try_get("last_played_at").map_err(ser)?,
    })
    .map_err(ser)
}

#[async_trait::async_trait]
impl ProfileRepository for SqliteRepository {
    async fn upsert_profile(&self, profile: &PlayerProfile) -> Result<(), StorageError> {
        let levels = profile.levels();
        let trophies = profile.trophies();

        sqlx::query(
            r"
                INSERT INTO profiles (
                    id, name, avatar,
                    grammar_level, memory_level, math_level, spelling_level,
                    total_correct, total_answered, total_wins,
                    gold_trophies, silver_trophies, bronze_trophies,
                    is_active, created_at, last_played_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    avatar = excluded.avatar,
                    grammar_level = excluded.grammar_level,
                    memory_level = excluded.memory_level,
                    math_level = excluded.math_level,
                    spelling_level = excluded.spelling_level,
                    total_correct = excluded.total_correct,
                    total_answered = excluded.total_answered,
                    total_wins = excluded.total_wins,
                    gold_trophies = excluded.gold_trophies,
                    silver_trophies = excluded.silver_trophies,
                    bronze_trophies = excluded.bronze_trophies,
                    is_active = excluded.is_active,
                    last_played_at = excluded.last_played_at
            ",
        )
        .bind(profile.id().to_string())
        .bind(profile.name())
        .bind(profile.avatar())
        .bind(i64::from(levels.grammar))
        .bind(i64::from(levels.memory))
        .bind(i64::from(levels.math))
        .bind(i64::from(levels.spelling))
        .bind(i64::from(profile.total_correct()))
        .bind(i64::from(profile.total_answered()))
        .bind(i64::from(profile.total_wins()))
        .bind(i64::from(trophies.gold))
        .bind(i64::from(trophies.silver))
        .bind(i64::from(trophies.bronze))
        .bind(i64::from(profile.is_active()))
        .bind(profile.created_at())
        .bind(profile.last_played_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_profile(&self, id: ProfileId) -> Result<Option<PlayerProfile>, StorageError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_profile_row).transpose()
    }

    async fn list_profiles(&self) -> Result<Vec<PlayerProfile>, StorageError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY created_at ASC, rowid ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_profile_row).collect()
    }

    async fn delete_profile(&self, id: ProfileId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM profiles WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
