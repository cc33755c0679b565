//! Credit rules. Each rule is expressed as a relative [`BalanceChange`] that
//! storage applies in a single statement, so concurrent updates compose.

use osint_db::models::user::{BalanceChange, UserAccount};

/// Price of looking up a number the user has not paid for before.
pub const SEARCH_COST: i64 = 2;
pub const REFERRAL_BONUS: i64 = 2;
/// Balance at or above which an admin grant promotes to Premium.
pub const PREMIUM_THRESHOLD: i64 = 10;

pub fn can_afford(account: &UserAccount, cost: i64) -> bool {
    account.credits >= cost
}

/// Storage refuses the change if the balance no longer covers `cost`.
pub fn deduct(cost: i64) -> BalanceChange {
    BalanceChange {
        credits: -cost,
        ..Default::default()
    }
}

pub fn grant_referral() -> BalanceChange {
    BalanceChange {
        credits: REFERRAL_BONUS,
        referrals: 1,
        premium_threshold: None,
    }
}

/// Premium is sticky: later deductions never demote.
pub fn grant_admin(amount: i64) -> BalanceChange {
    BalanceChange {
        credits: amount,
        referrals: 0,
        premium_threshold: Some(PREMIUM_THRESHOLD),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osint_db::models::user::UserStatus;
    use osint_db::Database;

    fn account(credits: i64) -> UserAccount {
        UserAccount {
            credits,
            ..UserAccount::new(1, "Test", None)
        }
    }

    async fn stored(credits: i64) -> Database {
        let db = Database::in_memory().await.unwrap();
        db.users.create(&account(credits)).await.unwrap();
        db
    }

    #[test]
    fn affordability_is_inclusive() {
        assert!(can_afford(&account(2), SEARCH_COST));
        assert!(!can_afford(&account(1), SEARCH_COST));
        assert!(!can_afford(&account(0), SEARCH_COST));
    }

    #[tokio::test]
    async fn deduct_never_goes_negative() {
        let db = stored(3).await;
        let after = db.users.apply_balance(1, &deduct(SEARCH_COST)).await.unwrap();
        assert_eq!(after.unwrap().credits, 1);

        assert!(db.users.apply_balance(1, &deduct(SEARCH_COST)).await.unwrap().is_none());
        assert_eq!(db.users.get_by_id(1).await.unwrap().unwrap().credits, 1);
    }

    #[tokio::test]
    async fn referral_adds_count_and_bonus() {
        let db = stored(4).await;
        let referrer = db.users.apply_balance(1, &grant_referral()).await.unwrap().unwrap();
        assert_eq!(referrer.credits, 6);
        assert_eq!(referrer.referrals, 1);
        assert_eq!(referrer.status, UserStatus::Guest);
    }

    #[tokio::test]
    async fn admin_grant_promotes_and_stays_premium() {
        let db = stored(8).await;
        let granted = db.users.apply_balance(1, &grant_admin(4)).await.unwrap().unwrap();
        assert_eq!(granted.credits, 12);
        assert_eq!(granted.status, UserStatus::Premium);

        db.users.apply_balance(1, &deduct(SEARCH_COST)).await.unwrap();
        let spent = db.users.apply_balance(1, &deduct(SEARCH_COST)).await.unwrap().unwrap();
        assert_eq!(spent.credits, 8);
        assert_eq!(spent.status, UserStatus::Premium);

        let topped = db.users.apply_balance(1, &grant_admin(1)).await.unwrap().unwrap();
        assert_eq!(topped.status, UserStatus::Premium);
    }

    #[tokio::test]
    async fn small_grant_keeps_guest() {
        let db = stored(4).await;
        let granted = db.users.apply_balance(1, &grant_admin(5)).await.unwrap().unwrap();
        assert_eq!(granted.credits, 9);
        assert_eq!(granted.status, UserStatus::Guest);
    }
}
