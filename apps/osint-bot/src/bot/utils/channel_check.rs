use osint_db::models::user::UserAccount;
use teloxide::prelude::*;
use teloxide::types::{ChatId, UserId};

use crate::bot::keyboards::join_channel_keyboard;
use crate::AppState;

/// Check if user is a member of the required channel. Without a configured
/// channel the gate is open.
pub async fn check_channel_membership(bot: &Bot, channel_id: Option<i64>, user_id: i64) -> bool {
    let Some(channel_id) = channel_id else {
        return true;
    };

    match bot
        .get_chat_member(ChatId(channel_id), UserId(user_id as u64))
        .await
    {
        Ok(member) => {
            let is_member = member.kind.is_present();
            if is_member {
                tracing::info!("User {} is a member of channel {}", user_id, channel_id);
            } else {
                tracing::debug!(
                    "User {} is NOT a member of channel {} (status: {:?})",
                    user_id,
                    channel_id,
                    member.kind
                );
            }
            is_member
        }
        Err(e) => {
            tracing::warn!(
                "Failed to check channel membership for user {}: {}",
                user_id,
                e
            );
            false
        }
    }
}

/// Lets verified users through; otherwise checks membership live, marking
/// the account verified on success or sending the join prompt on failure.
pub async fn ensure_verified(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    account: &UserAccount,
) -> bool {
    if account.verified {
        return true;
    }

    if check_channel_membership(bot, state.config.required_channel_id, account.user_id).await {
        if let Err(e) = state.accounts.mark_verified(account.user_id).await {
            tracing::error!("Failed to mark user {} verified: {:#}", account.user_id, e);
        }
        return true;
    }

    let channel = &state.config.verification_channel;
    let _ = bot
        .send_message(chat_id, format!("🚫 Join {} to continue!", channel))
        .reply_markup(join_channel_keyboard(channel, true))
        .await
        .map_err(|e| tracing::error!("Failed to send join prompt: {}", e));
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::test_support::{api_call, bot_for, chat_member, sent_message};
    use wiremock::MockServer;

    const CHANNEL: i64 = -1001234567890;
    const USER: i64 = 5;

    async fn setup(status: &str) -> (MockServer, Bot, AppState, osint_db::Database) {
        let server = MockServer::start().await;
        let (state, db) =
            AppState::for_tests(format!("{}/details", server.uri()), Some(CHANNEL)).await;
        state.accounts.register(USER, "Asha", None, None).await.unwrap();

        api_call("getChatMember")
            .respond_with(chat_member(USER, status))
            .expect(1)
            .mount(&server)
            .await;
        let bot = bot_for(&server);
        (server, bot, state, db)
    }

    #[tokio::test]
    async fn left_member_is_blocked_and_asked_to_join() {
        let (server, bot, state, db) = setup("left").await;
        api_call("sendMessage")
            .respond_with(sent_message(USER))
            .expect(1)
            .mount(&server)
            .await;

        let account = db.users.get_by_id(USER).await.unwrap().unwrap();
        assert!(!ensure_verified(&bot, &state, ChatId(USER), &account).await);

        assert!(!db.users.get_by_id(USER).await.unwrap().unwrap().verified);
        server.verify().await;
    }

    #[tokio::test]
    async fn present_member_is_let_through_and_marked_verified() {
        let (server, bot, state, db) = setup("member").await;
        api_call("sendMessage")
            .respond_with(sent_message(USER))
            .expect(0)
            .mount(&server)
            .await;

        let account = db.users.get_by_id(USER).await.unwrap().unwrap();
        assert!(ensure_verified(&bot, &state, ChatId(USER), &account).await);

        assert!(db.users.get_by_id(USER).await.unwrap().unwrap().verified);
        server.verify().await;
    }

    #[tokio::test]
    async fn verified_account_skips_the_api() {
        let server = MockServer::start().await;
        let (state, db) =
            AppState::for_tests(format!("{}/details", server.uri()), Some(CHANNEL)).await;
        state.accounts.register(USER, "Asha", None, None).await.unwrap();
        state.accounts.mark_verified(USER).await.unwrap();
        api_call("getChatMember")
            .respond_with(chat_member(USER, "left"))
            .expect(0)
            .mount(&server)
            .await;

        let account = db.users.get_by_id(USER).await.unwrap().unwrap();
        assert!(ensure_verified(&bot_for(&server), &state, ChatId(USER), &account).await);
        server.verify().await;
    }

    #[tokio::test]
    async fn gate_is_open_without_a_channel() {
        let server = MockServer::start().await;
        api_call("getChatMember")
            .respond_with(chat_member(USER, "left"))
            .expect(0)
            .mount(&server)
            .await;

        assert!(check_channel_membership(&bot_for(&server), None, USER).await);
        server.verify().await;
    }

    #[tokio::test]
    async fn api_errors_count_as_not_joined() {
        let server = MockServer::start().await;
        api_call("getChatMember")
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(!check_channel_membership(&bot_for(&server), Some(CHANNEL), USER).await);
    }
}
