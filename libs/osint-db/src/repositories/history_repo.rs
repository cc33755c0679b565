use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::models::history::SearchHistoryEntry;

/// Append-only log of paid searches. The presence of a row for a
/// `(user_id, number)` pair is what marks the number as already paid for.
#[derive(Debug, Clone)]
pub struct HistoryRepository {
    pool: SqlitePool,
}

impl HistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn was_searched(&self, user_id: i64, number: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM history WHERE user_id = ? AND number = ?")
                .bind(user_id)
                .bind(number)
                .fetch_one(&self.pool)
                .await
                .context("Failed to check search history")?;
        Ok(count > 0)
    }

    /// Appends an entry unless the pair is already logged. Returns `true`
    /// when a row was written.
    pub(crate) async fn insert_if_new(
        conn: &mut SqliteConnection,
        user_id: i64,
        number: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO history (user_id, number, searched_at)
            SELECT ?, ?, ?
            WHERE NOT EXISTS (SELECT 1 FROM history WHERE user_id = ? AND number = ?)
            "#,
        )
        .bind(user_id)
        .bind(number)
        .bind(Utc::now())
        .bind(user_id)
        .bind(number)
        .execute(&mut *conn)
        .await
        .context("Failed to append search history")?;

        let inserted = result.rows_affected() > 0;
        if inserted {
            tracing::info!("Added to history: user {}, number {}", user_id, number);
        }
        Ok(inserted)
    }

    pub async fn count_for_user(&self, user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM history WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count search history")?;
        Ok(count)
    }

    /// Newest entries first.
    pub async fn recent_for_user(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<SearchHistoryEntry>> {
        let rows = sqlx::query_as::<_, (i64, i64, String, chrono::DateTime<Utc>)>(
            "SELECT id, user_id, number, searched_at FROM history WHERE user_id = ? ORDER BY id DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch search history")?;

        Ok(rows
            .into_iter()
            .map(|(id, user_id, number, searched_at)| SearchHistoryEntry {
                id,
                user_id,
                number,
                searched_at,
            })
            .collect())
    }
}
