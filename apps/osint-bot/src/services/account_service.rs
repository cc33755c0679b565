use anyhow::{Context, Result};
use osint_db::models::history::SearchHistoryEntry;
use osint_db::models::user::{UserAccount, UserPatch};
use osint_db::Database;
use tracing::info;

use crate::errors::AccountError;
use crate::services::ledger;

const REFERRAL_PREFIX: &str = "ref_";
/// How many past numbers the profile lists.
const RECENT_SEARCHES: i64 = 3;

/// Result of handling a user's `/start`.
#[derive(Debug, Clone)]
pub struct Registration {
    pub account: UserAccount,
    pub created: bool,
    /// The referrer credited for bringing in this new user, if any.
    pub rewarded_referrer: Option<UserAccount>,
}

#[derive(Debug, Clone)]
pub struct Profile {
    pub account: UserAccount,
    pub searches: i64,
    /// Newest first.
    pub recent: Vec<SearchHistoryEntry>,
}

#[derive(Clone)]
pub struct AccountService {
    db: Database,
    admin_user_id: i64,
}

impl AccountService {
    pub fn new(db: Database, admin_user_id: i64) -> Self {
        Self { db, admin_user_id }
    }

    pub async fn get(&self, user_id: i64) -> Result<Option<UserAccount>> {
        self.db.users.get_by_id(user_id).await
    }

    /// Fetches the account, creating it on first contact. Referral rewards
    /// are only paid when the account is created here, so each referred user
    /// counts once.
    pub async fn register(
        &self,
        user_id: i64,
        name: &str,
        username: Option<&str>,
        start_param: Option<&str>,
    ) -> Result<Registration> {
        if let Some(account) = self.get(user_id).await? {
            return Ok(Registration {
                account,
                created: false,
                rewarded_referrer: None,
            });
        }

        let referrer = match start_param
            .and_then(parse_referral_code)
            .filter(|id| *id != user_id)
        {
            Some(id) => self.get(id).await?,
            None => None,
        };

        let account = UserAccount {
            referred_by: referrer.as_ref().map(|r| r.user_id),
            ..UserAccount::new(user_id, name, username)
        };

        if !self.db.users.create(&account).await? {
            // Lost a race with a concurrent /start from the same user.
            let account = self
                .get(user_id)
                .await?
                .context("User vanished right after creation")?;
            return Ok(Registration {
                account,
                created: false,
                rewarded_referrer: None,
            });
        }

        let rewarded_referrer = match referrer {
            Some(referrer) => {
                let rewarded = self
                    .db
                    .users
                    .apply_balance(referrer.user_id, &ledger::grant_referral())
                    .await?;
                if rewarded.is_some() {
                    info!(
                        "Referral reward given to {} from {}",
                        referrer.user_id, user_id
                    );
                }
                rewarded
            }
            None => None,
        };

        Ok(Registration {
            account,
            created: true,
            rewarded_referrer,
        })
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        user_id == self.admin_user_id
    }

    pub async fn mark_verified(&self, user_id: i64) -> Result<()> {
        let patch = UserPatch {
            verified: Some(true),
            ..Default::default()
        };
        self.db.users.update(user_id, &patch).await?;
        Ok(())
    }

    /// Clears the first-time flag. Returns whether it was still set.
    pub async fn consume_first_time(&self, account: &UserAccount) -> Result<bool> {
        if !account.first_time {
            return Ok(false);
        }
        let patch = UserPatch {
            first_time: Some(false),
            ..Default::default()
        };
        self.db.users.update(account.user_id, &patch).await?;
        Ok(true)
    }

    pub async fn profile(&self, user_id: i64) -> Result<Option<Profile>> {
        let Some(account) = self.get(user_id).await? else {
            return Ok(None);
        };
        let searches = self.db.history.count_for_user(user_id).await?;
        let recent = self
            .db
            .history
            .recent_for_user(user_id, RECENT_SEARCHES)
            .await?;
        Ok(Some(Profile {
            account,
            searches,
            recent,
        }))
    }

    /// Admin top-up. Authorization is checked before anything is read.
    pub async fn grant_credits(
        &self,
        caller_id: i64,
        target_id: i64,
        amount: i64,
    ) -> Result<UserAccount, AccountError> {
        if !self.is_admin(caller_id) {
            return Err(AccountError::Unauthorized(caller_id));
        }
        if amount <= 0 {
            return Err(AccountError::InvalidAmount(amount));
        }

        let granted = self
            .db
            .users
            .apply_balance(target_id, &ledger::grant_admin(amount))
            .await?
            .ok_or(AccountError::UserNotFound(target_id))?;

        info!(
            "Admin {} added {} credits to {}: total {}, status {}",
            caller_id, amount, target_id, granted.credits, granted.status
        );
        Ok(granted)
    }
}

pub fn parse_referral_code(param: &str) -> Option<i64> {
    param.trim().strip_prefix(REFERRAL_PREFIX)?.parse().ok()
}

pub fn referral_link(bot_username: &str, user_id: i64) -> String {
    format!(
        "https://t.me/{}?start={}{}",
        bot_username.trim_start_matches('@'),
        REFERRAL_PREFIX,
        user_id
    )
}
