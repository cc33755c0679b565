use std::collections::HashSet;

use osint_db::models::user::UserAccount;
use osint_db::{ChargeOutcome, Database};
use tracing::{info, warn};

use crate::errors::SearchError;
use crate::lookup_client::LookupClient;
use crate::models::lookup::{LookupOutcome, LookupResult};
use crate::models::phone::PhoneNumber;
use crate::services::history_service::HistoryService;
use crate::services::ledger::{self, SEARCH_COST};
use crate::services::report::{AlternateLookup, SearchReport};

/// A validated request that passed the credit gate when it was issued.
#[derive(Debug, Clone)]
pub struct SearchTicket {
    user_id: i64,
    number: PhoneNumber,
}

impl SearchTicket {
    pub fn number(&self) -> &PhoneNumber {
        &self.number
    }
}

/// Drives a paid search end to end.
///
/// Charging policy: a number is paid for the first time this user looks it
/// up, before the upstream call, and the charge stands whatever upstream
/// answers. Numbers already in the user's history are looked up again for
/// free. Alternate numbers follow exactly the same rules.
#[derive(Clone)]
pub struct SearchService {
    db: Database,
    history: HistoryService,
    lookup: LookupClient,
}

impl SearchService {
    pub fn new(db: Database, lookup: LookupClient) -> Self {
        Self {
            history: HistoryService::new(db.clone()),
            db,
            lookup,
        }
    }

    /// Both phases back to back, for callers that need no placeholder
    /// between authorisation and dispatch.
    pub async fn search(&self, user_id: i64, input: &str) -> Result<SearchReport, SearchError> {
        let ticket = self.authorize(user_id, input).await?;
        self.execute(ticket).await
    }

    /// Validation and the credit gate. Nothing is written.
    pub async fn authorize(&self, user_id: i64, input: &str) -> Result<SearchTicket, SearchError> {
        let number = PhoneNumber::parse(input).ok_or(SearchError::InvalidNumber)?;
        self.gate(user_id, &number).await?;
        Ok(SearchTicket { user_id, number })
    }

    pub async fn execute(&self, ticket: SearchTicket) -> Result<SearchReport, SearchError> {
        let SearchTicket { user_id, number } = ticket;

        // The balance may have moved since the ticket was issued.
        let (mut account, mut already_paid) = self.gate(user_id, &number).await?;
        if !already_paid {
            match self.charge(user_id, &number).await? {
                Some(charged) => account = charged,
                // A concurrent search paid for it first.
                None => already_paid = true,
            }
        }

        let (results, timestamp) = match self.lookup.lookup(&number).await {
            LookupOutcome::Success { results, timestamp } => (results, timestamp),
            LookupOutcome::Empty => return Err(SearchError::NotFound),
            LookupOutcome::ApiFailure(reason) => return Err(SearchError::Upstream(reason)),
        };

        let alternates = self.expand_alternates(&mut account, &number, &results).await;

        Ok(SearchReport {
            number,
            results,
            alternates,
            credits_remaining: account.credits,
            timestamp,
            charged: !already_paid,
        })
    }

    async fn gate(
        &self,
        user_id: i64,
        number: &PhoneNumber,
    ) -> Result<(UserAccount, bool), SearchError> {
        let account = self
            .db
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(SearchError::UnknownUser(user_id))?;

        let already_paid = self.history.was_searched(user_id, number).await?;
        if !already_paid && !ledger::can_afford(&account, SEARCH_COST) {
            return Err(SearchError::InsufficientCredits {
                balance: account.credits,
                cost: SEARCH_COST,
            });
        }
        Ok((account, already_paid))
    }

    /// Pays for `number`. `None` means it turned out to be paid already.
    async fn charge(
        &self,
        user_id: i64,
        number: &PhoneNumber,
    ) -> Result<Option<UserAccount>, SearchError> {
        match self.history.record(user_id, number).await? {
            ChargeOutcome::Charged(account) => Ok(Some(account)),
            ChargeOutcome::AlreadyPaid => Ok(None),
            ChargeOutcome::Refused => match self.db.users.get_by_id(user_id).await? {
                Some(account) => Err(SearchError::InsufficientCredits {
                    balance: account.credits,
                    cost: SEARCH_COST,
                }),
                None => Err(SearchError::UnknownUser(user_id)),
            },
        }
    }

    /// One hop only: alternates listed inside the nested results are shown
    /// but never looked up. Failures here become notices; the primary
    /// results are already paid for and are always returned.
    async fn expand_alternates(
        &self,
        account: &mut UserAccount,
        primary: &PhoneNumber,
        results: &[LookupResult],
    ) -> Vec<AlternateLookup> {
        let mut expanded = HashSet::from([primary.clone()]);
        let mut lookups = Vec::new();

        for number in results.iter().filter_map(LookupResult::alternate_number) {
            if !expanded.insert(number.clone()) {
                continue;
            }
            match self.history.was_searched(account.user_id, &number).await {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    warn!("History check failed for alt {}: {:#}", number, e);
                    lookups.push(AlternateLookup::Failed {
                        number,
                        reason: "history unavailable".to_string(),
                    });
                    continue;
                }
            }
            if !ledger::can_afford(account, SEARCH_COST) {
                info!(
                    "Skipping alt {} for user {}: balance {}",
                    number, account.user_id, account.credits
                );
                lookups.push(AlternateLookup::Unaffordable { number });
                continue;
            }

            match self.history.record(account.user_id, &number).await {
                Ok(ChargeOutcome::Charged(charged)) => *account = charged,
                Ok(ChargeOutcome::AlreadyPaid) => continue,
                Ok(ChargeOutcome::Refused) => {
                    lookups.push(AlternateLookup::Unaffordable { number });
                    continue;
                }
                Err(e) => {
                    warn!(
                        "Failed to charge alt {} for user {}: {:#}",
                        number, account.user_id, e
                    );
                    lookups.push(AlternateLookup::Failed {
                        number,
                        reason: "could not record the charge".to_string(),
                    });
                    continue;
                }
            }

            let lookup = match self.lookup.lookup(&number).await {
                LookupOutcome::Success { results, timestamp } => AlternateLookup::Found {
                    number,
                    results,
                    timestamp,
                },
                LookupOutcome::Empty => AlternateLookup::Empty { number },
                LookupOutcome::ApiFailure(reason) => {
                    warn!("Alt search error for {}: {}", number, reason);
                    AlternateLookup::Failed { number, reason }
                }
            };
            lookups.push(lookup);
        }

        lookups
    }
}
