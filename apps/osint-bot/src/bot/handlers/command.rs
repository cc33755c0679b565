use osint_db::models::user::{UserAccount, STARTER_CREDITS};
use teloxide::prelude::*;
use tracing::{error, info};

use super::search::handle_number_input;
use crate::bot::keyboards::{join_channel_keyboard, main_menu};
use crate::bot::utils::channel_check::check_channel_membership;
use crate::errors::AccountError;
use crate::utils::truncate_chars;
use crate::AppState;

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    state: AppState,
) -> Result<(), teloxide::RequestError> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let chat_id = msg.chat.id;
    let user_id = msg
        .from
        .as_ref()
        .map(|u| u.id.0 as i64)
        .unwrap_or(chat_id.0);

    let mut parts = text.split_whitespace();
    let command = parts
        .next()
        .filter(|word| word.starts_with('/'))
        .map(|word| word.split('@').next().unwrap_or(word));

    match command {
        Some("/start") => {
            state.prompts.cancel(chat_id.0).await;
            handle_start(&bot, &msg, &state, parts.next()).await;
        }
        Some("/addcredits") => {
            state.prompts.cancel(chat_id.0).await;
            let args: Vec<&str> = parts.collect();
            handle_add_credits(&bot, chat_id, user_id, &state, &args).await;
        }
        _ => {
            if let Some(pending) = state.prompts.take(chat_id.0).await {
                handle_number_input(&bot, &state, chat_id, user_id, text, pending).await;
            } else {
                bot.send_message(chat_id, "❓ Use /start to begin or select from menu.")
                    .await?;
            }
        }
    }

    Ok(())
}

async fn handle_start(bot: &Bot, msg: &Message, state: &AppState, start_param: Option<&str>) {
    let chat_id = msg.chat.id;
    let Some(from) = msg.from.as_ref() else {
        return;
    };
    let user_id = from.id.0 as i64;
    let name = from.full_name();

    let registration = match state
        .accounts
        .register(user_id, &name, from.username.as_deref(), start_param)
        .await
    {
        Ok(registration) => registration,
        Err(e) => {
            error!("Failed to register user {} on /start: {:#}", user_id, e);
            let _ = bot
                .send_message(
                    chat_id,
                    format!("❌ Unexpected error: {}", truncate_chars(&e.to_string(), 50)),
                )
                .await;
            return;
        }
    };

    if registration.created {
        info!("New user {} ({})", user_id, name);
    }

    if let Some(referrer) = &registration.rewarded_referrer {
        let _ = bot
            .send_message(
                ChatId(referrer.user_id),
                "🎉 New referral! +2 credits awarded! 📈",
            )
            .await
            .map_err(|e| error!("Failed to notify referrer {}: {}", referrer.user_id, e));
    }

    let account = registration.account;
    if !account.verified {
        if !check_channel_membership(bot, state.config.required_channel_id, user_id).await {
            let channel = &state.config.verification_channel;
            let _ = bot
                .send_message(
                    chat_id,
                    format!(
                        "🚫 Please join our channel {} first to access the bot!",
                        channel
                    ),
                )
                .reply_markup(join_channel_keyboard(channel, true))
                .await;
            return;
        }
        if let Err(e) = state.accounts.mark_verified(user_id).await {
            error!("Failed to mark user {} verified: {:#}", user_id, e);
        }
        let _ = bot
            .send_message(chat_id, "✅ Verified! Welcome aboard! 🚀")
            .await;
    }

    send_welcome(bot, state, chat_id, &account).await;
}

/// Starter-bonus notice (once per account), then the welcome card with the
/// main menu.
pub async fn send_welcome(bot: &Bot, state: &AppState, chat_id: ChatId, account: &UserAccount) {
    match state.accounts.consume_first_time(account).await {
        Ok(true) => {
            let _ = bot
                .send_message(
                    chat_id,
                    format!(
                        "🎁 Starter bonus: +{} credits added! Enjoy your searches! ✨",
                        STARTER_CREDITS
                    ),
                )
                .await;
        }
        Ok(false) => {}
        Err(e) => error!("Failed to clear first-time flag for {}: {:#}", account.user_id, e),
    }

    let text = format!(
        "🔍 Welcome to OSINT BOT 😊\n\n\
         🔎 You can search anything here...\n\n\
         👋 Hey there, {}!\n\n\
         🆔 User ID: {}\n\
         💰 Credits: {}\n\
         {}\n\n\
         💡 Explore the features below! 💡",
        account.name,
        account.user_id,
        account.credits,
        status_badge(account)
    );

    let _ = bot
        .send_message(chat_id, text)
        .reply_markup(main_menu(&state.config.support_bot_username))
        .await
        .map_err(|e| error!("Failed to send welcome: {}", e));
}

pub(crate) fn status_badge(account: &UserAccount) -> &'static str {
    if account.is_premium() {
        "👑 Premium"
    } else {
        "👤 Guest"
    }
}

async fn handle_add_credits(
    bot: &Bot,
    chat_id: ChatId,
    caller_id: i64,
    state: &AppState,
    args: &[&str],
) {
    if !state.accounts.is_admin(caller_id) {
        let _ = bot
            .send_message(chat_id, "🚫 Only the main admin can add credits!")
            .await;
        return;
    }

    let [target, amount] = args else {
        let _ = bot
            .send_message(chat_id, "❌ Format: /addcredits <user_id> <credits>")
            .await;
        return;
    };
    let (Ok(target_id), Ok(amount)) = (target.parse::<i64>(), amount.parse::<i64>()) else {
        let _ = bot.send_message(chat_id, "❌ Invalid numbers.").await;
        return;
    };

    let reply = match state
        .accounts
        .grant_credits(caller_id, target_id, amount)
        .await
    {
        Ok(account) => {
            let _ = bot
                .send_message(
                    ChatId(target_id),
                    format!(
                        "🎉 +{} credits added! New balance: {} | Status: {}",
                        amount, account.credits, account.status
                    ),
                )
                .await
                .map_err(|e| error!("Failed to notify {} about credits: {}", target_id, e));
            format!(
                "✅ Added {} credits to {}. Total: {} | Status: {}",
                amount, target_id, account.credits, account.status
            )
        }
        Err(AccountError::Unauthorized(_)) => "🚫 Only the main admin can add credits!".into(),
        Err(AccountError::InvalidAmount(_)) => "❌ Credits must be a positive number.".into(),
        Err(AccountError::UserNotFound(_)) => "❌ User not found.".into(),
        Err(AccountError::Storage(e)) => {
            error!("Add credits error: {:#}", e);
            format!("❌ Error: {}", truncate_chars(&e.to_string(), 50))
        }
    };

    let _ = bot.send_message(chat_id, reply).await;
}
