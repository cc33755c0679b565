use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

use crate::models::user::{BalanceChange, UserAccount};
use crate::repositories::{HistoryRepository, UserRepository};

pub async fn init_db(database_url: &str) -> Result<SqlitePool> {
    if !database_url.starts_with("sqlite:") {
        return Err(anyhow::anyhow!("DATABASE_URL must start with sqlite://"));
    }

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(10));

    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .connect_with(options)
        .await
        .context("Failed to connect to SQLite")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    Ok(pool)
}

/// Private in-memory database with the schema applied. A single connection
/// that never expires, since each SQLite memory connection is its own
/// database.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .context("Failed to open in-memory SQLite")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    Ok(pool)
}

/// Result of [`Database::charge_search`].
#[derive(Debug, Clone, PartialEq)]
pub enum ChargeOutcome {
    /// Paid; carries the account as committed.
    Charged(UserAccount),
    /// The number was already in the user's history. Nothing was written.
    AlreadyPaid,
    /// Unknown user or the balance cannot cover it. Nothing was written.
    Refused,
}

/// Storage handle passed to every service that needs persistence.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    pub users: UserRepository,
    pub history: HistoryRepository,
}

impl Database {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            history: HistoryRepository::new(pool.clone()),
            pool,
        }
    }

    pub async fn in_memory() -> Result<Self> {
        Ok(Self::new(connect_in_memory().await?))
    }

    /// Commits a search charge: the history row and the balance change
    /// land together or not at all. Both statements are conditional, so two
    /// concurrent charges can neither pay twice for one number nor spend the
    /// same credits twice.
    pub async fn charge_search(
        &self,
        user_id: i64,
        change: &BalanceChange,
        number: &str,
    ) -> Result<ChargeOutcome> {
        let mut tx = self.pool.begin().await.context("Failed to open transaction")?;

        if !HistoryRepository::insert_if_new(&mut *tx, user_id, number).await? {
            return Ok(ChargeOutcome::AlreadyPaid);
        }

        let Some(account) = UserRepository::apply_balance_on(&mut *tx, user_id, change).await?
        else {
            return Ok(ChargeOutcome::Refused);
        };

        tx.commit().await.context("Failed to commit search charge")?;

        tracing::info!(
            "Charged user {} for {}, balance now {}",
            user_id,
            number,
            account.credits
        );
        Ok(ChargeOutcome::Charged(account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cost(credits: i64) -> BalanceChange {
        BalanceChange {
            credits: -credits,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn charge_updates_balance_and_history_together() {
        let db = Database::in_memory().await.unwrap();
        db.users.create(&UserAccount::new(1, "Ann", None)).await.unwrap();

        let outcome = db.charge_search(1, &cost(2), "9876543210").await.unwrap();

        assert!(matches!(outcome, ChargeOutcome::Charged(ref a) if a.credits == 2));
        assert_eq!(db.users.get_by_id(1).await.unwrap().unwrap().credits, 2);
        assert!(db.history.was_searched(1, "9876543210").await.unwrap());
    }

    #[tokio::test]
    async fn number_is_never_paid_twice() {
        let db = Database::in_memory().await.unwrap();
        db.users.create(&UserAccount::new(1, "Ann", None)).await.unwrap();

        db.charge_search(1, &cost(2), "9876543210").await.unwrap();
        let again = db.charge_search(1, &cost(2), "9876543210").await.unwrap();

        assert_eq!(again, ChargeOutcome::AlreadyPaid);
        assert_eq!(db.users.get_by_id(1).await.unwrap().unwrap().credits, 2);
        assert_eq!(db.history.count_for_user(1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn refused_charge_leaves_no_history() {
        let db = Database::in_memory().await.unwrap();
        db.users.create(&UserAccount::new(1, "Ann", None)).await.unwrap();

        assert_eq!(
            db.charge_search(1, &cost(6), "9876543210").await.unwrap(),
            ChargeOutcome::Refused
        );
        assert_eq!(
            db.charge_search(2, &cost(2), "9876543210").await.unwrap(),
            ChargeOutcome::Refused
        );

        assert_eq!(db.users.get_by_id(1).await.unwrap().unwrap().credits, 4);
        assert!(!db.history.was_searched(1, "9876543210").await.unwrap());
        assert!(!db.history.was_searched(2, "9876543210").await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_charges_cannot_share_credits() {
        let db = Database::in_memory().await.unwrap();
        db.users
            .create(&UserAccount {
                credits: 2,
                ..UserAccount::new(1, "Ann", None)
            })
            .await
            .unwrap();

        let price = cost(2);
        let (a, b) = tokio::join!(
            db.charge_search(1, &price, "1111111111"),
            db.charge_search(1, &price, "2222222222"),
        );
        let outcomes = [a.unwrap(), b.unwrap()];

        let charged = outcomes
            .iter()
            .filter(|o| matches!(o, ChargeOutcome::Charged(_)))
            .count();
        assert_eq!(charged, 1);
        assert!(outcomes.contains(&ChargeOutcome::Refused));
        assert_eq!(db.users.get_by_id(1).await.unwrap().unwrap().credits, 0);
        assert_eq!(db.history.count_for_user(1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rejects_non_sqlite_urls() {
        assert!(init_db("postgres://localhost/osint").await.is_err());
    }
}
