use quiz_core::model::SessionSummary;
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{conn, profile_id_from_str, ser, session_id_from_str, subject_from_str, u32_from_i64},
};
use crate::repository::{SessionSummaryRepository, SessionSummaryRow, StorageError, SummaryFilter};

fn map_summary_row(row: &sqlx::sqlite::SqliteRow) -> Result<SessionSummary, StorageError> {
    let session_id = session_id_from_str(&row.try_get::<String, _>("session_id").map_err(ser)?)?;
    let profile_id = row
        .try_get::<Option<String>, _>("profile_id")
        .map_err(ser)?
        .as_deref()
        .map(profile_id_from_str)
        .transpose()?;
    let subject = subject_from_str(&row.try_get::<String, _>("subject").map_err(ser)?)?;
    let start_level = u32_from_i64(
        "start_level",
        row.try_get::<i64, _>("start_level").map_err(ser)?,
    )?;
    let end_level = u32_from_i64("end_level", row.try_get::<i64, _>("end_level").map_err(ser)?)?;
    let total_questions = u32_from_i64(
        "total_questions",
        row.try_get::<i64, _>("total_questions").map_err(ser)?,
    )?;
    let correct_count = u32_from_i64(
        "correct_count",
        row.try_get::<i64, _>("correct_count").map_err(ser)?,
    )?;
    let started_at = row.try_get("started_at").map_err(ser)?;
    let ended_at = row.try_get("ended_at").map_err(ser)?;

    SessionSummary::from_persisted(
        session_id,
        profile_id,
        subject,
        start_level,
        end_level,
        total_questions,
        correct_count,
        started_at,
        ended_at,
    )
    .map_err(ser)
}

fn map_summary_row_with_id(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<SessionSummaryRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let summary = map_summary_row(row)?;
    Ok(SessionSummaryRow::new(id, summary))
}

fn insert_error(e: sqlx::Error) -> StorageError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => StorageError::Conflict,
        Some(db) if db.is_foreign_key_violation() => StorageError::NotFound,
        _ => conn(e),
    }
}

#[async_trait::async_trait]
impl SessionSummaryRepository for SqliteRepository {
    async fn append_summary(&self, summary: &SessionSummary) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO session_summaries (
                    session_id, profile_id, subject, start_level, end_level,
                    total_questions, correct_count, started_at, ended_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(summary.session_id().to_string())
        .bind(summary.profile_id().map(|id| id.to_string()))
        .bind(summary.subject().key())
        .bind(i64::from(summary.start_level()))
        .bind(i64::from(summary.end_level()))
        .bind(i64::from(summary.total_questions()))
        .bind(i64::from(summary.correct_count()))
        .bind(summary.started_at())
        .bind(summary.ended_at())
        .execute(&self.pool)
        .await
        .map_err(insert_error)?;

        Ok(res.last_insert_rowid())
    }

    async fn get_summary(&self, id: i64) -> Result<SessionSummary, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    session_id, profile_id, subject, start_level, end_level,
                    total_questions, correct_count, started_at, ended_at
                FROM session_summaries
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_summary_row(&row)
    }

    async fn list_summaries(
        &self,
        filter: SummaryFilter,
        limit: u32,
    ) -> Result<Vec<SessionSummaryRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, session_id, profile_id, subject, start_level, end_level,
                    total_questions, correct_count, started_at, ended_at
                FROM session_summaries
                WHERE (?1 IS NULL OR profile_id = ?1)
                  AND (?2 IS NULL OR subject = ?2)
                ORDER BY ended_at DESC, id DESC
                LIMIT ?3
            ",
        )
        .bind(filter.profile_id.map(|id| id.to_string()))
        .bind(filter.subject.map(|s| s.key()))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_summary_row_with_id).collect()
    }
}
