use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool, sqlite::SqliteRow};

use crate::models::user::{BalanceChange, UserAccount, UserPatch, UserStatus};

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &SqliteRow) -> UserAccount {
        let status = row
            .try_get::<String, _>("status")
            .ok()
            .and_then(|s| s.parse::<UserStatus>().ok())
            .unwrap_or_default();

        UserAccount {
            user_id: row.try_get::<i64, _>("user_id").unwrap_or_default(),
            name: row
                .try_get::<String, _>("name")
                .unwrap_or_else(|_| "Unknown".to_string()),
            username: row.try_get::<Option<String>, _>("username").ok().flatten(),
            credits: row.try_get::<i64, _>("credits").unwrap_or_default(),
            referrals: row.try_get::<i64, _>("referrals").unwrap_or_default(),
            status,
            first_time: row.try_get::<bool, _>("first_time").unwrap_or(false),
            verified: row.try_get::<bool, _>("verified").unwrap_or(false),
            referred_by: row.try_get::<Option<i64>, _>("referred_by").ok().flatten(),
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .unwrap_or_else(|_| Utc::now()),
        }
    }

    pub async fn get_by_id(&self, user_id: i64) -> Result<Option<UserAccount>> {
        let row = sqlx::query("SELECT * FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user by ID")?;
        Ok(row.map(|r| Self::row_to_user(&r)))
    }

    /// Inserts `account` unless a row with the same id exists.
    /// Returns `true` when the row was created.
    pub async fn create(&self, account: &UserAccount) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (user_id, name, username, credits, referrals, status, first_time, verified, referred_by, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO NOTHING
            "#,
        )
        .bind(account.user_id)
        .bind(&account.name)
        .bind(&account.username)
        .bind(account.credits)
        .bind(account.referrals)
        .bind(account.status.as_str())
        .bind(account.first_time)
        .bind(account.verified)
        .bind(account.referred_by)
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to create user")?;

        let created = result.rows_affected() > 0;
        if created {
            tracing::info!("Added new user: {}", account.user_id);
        }
        Ok(created)
    }

    /// Applies `patch` to one user. Returns `false` when no such user exists.
    pub async fn update(&self, user_id: i64, patch: &UserPatch) -> Result<bool> {
        if patch.is_empty() {
            return Ok(true);
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET ");
        {
            let mut fields = qb.separated(", ");
            if let Some(first_time) = patch.first_time {
                fields.push("first_time = ").push_bind_unseparated(first_time);
            }
            if let Some(verified) = patch.verified {
                fields.push("verified = ").push_bind_unseparated(verified);
            }
        }
        qb.push(" WHERE user_id = ").push_bind(user_id);

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to update user {}", user_id))?;

        tracing::debug!("Updated user {}: {:?}", user_id, patch);
        Ok(result.rows_affected() > 0)
    }

    /// Applies `change` atomically. Returns the updated account, or `None`
    /// when the user does not exist or the change would overdraw it.
    pub async fn apply_balance(
        &self,
        user_id: i64,
        change: &BalanceChange,
    ) -> Result<Option<UserAccount>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("Failed to acquire connection")?;
        Self::apply_balance_on(&mut *conn, user_id, change).await
    }

    /// Same as [`apply_balance`](Self::apply_balance) on a caller-held
    /// connection, so it can join a transaction.
    pub(crate) async fn apply_balance_on(
        conn: &mut SqliteConnection,
        user_id: i64,
        change: &BalanceChange,
    ) -> Result<Option<UserAccount>> {
        let row = sqlx::query(
            r#"
            UPDATE users SET
                credits = credits + ?,
                referrals = referrals + ?,
                status = CASE WHEN credits + ? >= ? THEN 'Premium' ELSE status END
            WHERE user_id = ? AND credits + ? >= 0
            RETURNING *
            "#,
        )
        .bind(change.credits)
        .bind(change.referrals)
        .bind(change.credits)
        .bind(change.premium_threshold)
        .bind(user_id)
        .bind(change.credits)
        .fetch_optional(&mut *conn)
        .await
        .with_context(|| format!("Failed to change balance of user {}", user_id))?;

        let account = row.map(|r| Self::row_to_user(&r));
        if let Some(account) = &account {
            tracing::debug!(
                "Balance of {} changed by {}: now {}",
                user_id,
                change.credits,
                account.credits
            );
        }
        Ok(account)
    }
}
