use std::sync::Arc;

use crate::bot::utils::prompts::PromptRegistry;
use crate::config::Config;
use crate::services::account_service::AccountService;
use crate::services::search_service::SearchService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Resolved at startup from config or `getMe`.
    pub bot_username: Arc<str>,
    pub accounts: AccountService,
    pub search: SearchService,
    pub prompts: PromptRegistry,
}

#[cfg(test)]
impl AppState {
    /// State over a fresh in-memory database, with lookups sent to
    /// `lookup_endpoint`.
    pub(crate) async fn for_tests(
        lookup_endpoint: String,
        required_channel_id: Option<i64>,
    ) -> (Self, osint_db::Database) {
        use crate::lookup_client::LookupClient;

        let config = Config::from_lookup(|key: &str| match key {
            "BOT_TOKEN" => Some("t".to_string()),
            "LOOKUP_API_KEY" => Some("key".to_string()),
            "ADMIN_USER_ID" => Some("1".to_string()),
            "LOOKUP_ENDPOINT" => Some(lookup_endpoint.clone()),
            "VERIFICATION_CHANNEL" => Some("@osint_channel".to_string()),
            "REQUIRED_CHANNEL_ID" => required_channel_id.map(|id| id.to_string()),
            _ => None,
        })
        .unwrap();

        let db = osint_db::Database::in_memory().await.unwrap();
        let lookup = LookupClient::new(
            config.lookup_endpoint.clone(),
            config.lookup_api_key.clone(),
            config.lookup_timeout(),
        )
        .unwrap();

        let state = AppState {
            accounts: AccountService::new(db.clone(), config.admin_user_id),
            search: SearchService::new(db.clone(), lookup),
            prompts: PromptRegistry::new(),
            bot_username: Arc::from("osint_test_bot"),
            config: Arc::new(config),
        };
        (state, db)
    }
}
