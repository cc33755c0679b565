use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Credits every account starts with.
pub const STARTER_CREDITS: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UserStatus {
    #[default]
    Guest,
    Premium,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Guest => "Guest",
            UserStatus::Premium => "Premium",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Guest" => Ok(UserStatus::Guest),
            "Premium" => Ok(UserStatus::Premium),
            other => Err(anyhow::anyhow!("Unknown user status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub user_id: i64,
    pub name: String,
    pub username: Option<String>,
    pub credits: i64,
    pub referrals: i64,
    pub status: UserStatus,
    pub first_time: bool,
    pub verified: bool,
    pub referred_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    /// A freshly registered account as it is stored on first contact.
    pub fn new(user_id: i64, name: &str, username: Option<&str>) -> Self {
        Self {
            user_id,
            name: name.to_string(),
            username: username.map(str::to_string),
            credits: STARTER_CREDITS,
            referrals: 0,
            status: UserStatus::Guest,
            first_time: true,
            verified: false,
            referred_by: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_premium(&self) -> bool {
        self.status == UserStatus::Premium
    }
}

/// Account flags that may change after creation. Balances are never
/// patched; they move through [`BalanceChange`].
///
/// `None` leaves a column untouched; a patch with every field `None` is a
/// no-op.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub first_time: Option<bool>,
    pub verified: Option<bool>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        *self == UserPatch::default()
    }
}

/// A relative change to an account's balance, applied in one statement.
///
/// Storage refuses a change that would leave `credits` negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceChange {
    pub credits: i64,
    pub referrals: i64,
    /// Promote to Premium when the new balance reaches this value.
    pub premium_threshold: Option<i64>,
}
