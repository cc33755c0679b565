use anyhow::Result;
use osint_db::{ChargeOutcome, Database};

use crate::models::phone::PhoneNumber;
use crate::services::ledger::{self, SEARCH_COST};

/// Answers "has this user already paid for this number?".
#[derive(Clone)]
pub struct HistoryService {
    db: Database,
}

impl HistoryService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn was_searched(&self, user_id: i64, number: &PhoneNumber) -> Result<bool> {
        self.db.history.was_searched(user_id, number.as_str()).await
    }

    /// Appends the history entry together with the search charge.
    pub async fn record(&self, user_id: i64, number: &PhoneNumber) -> Result<ChargeOutcome> {
        self.db
            .charge_search(user_id, &ledger::deduct(SEARCH_COST), number.as_str())
            .await
    }
}
