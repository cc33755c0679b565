use osint_db::models::user::UserAccount;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{error, info};

use super::command::{send_welcome, status_badge};
use super::search::prompt_for_number;
use super::show_menu;
use crate::bot::keyboards::{back_keyboard, purchase_keyboard, CreditPackage};
use crate::bot::utils::channel_check::{check_channel_membership, ensure_verified};
use crate::bot::utils::prompts::PendingNumber;
use crate::services::account_service::{referral_link, Profile};
use crate::services::report::RESULTS_MARKER;
use crate::AppState;

pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    state: AppState,
) -> Result<(), teloxide::RequestError> {
    info!("Received callback: {:?}", q.data);
    let callback_id = q.id.clone();
    let user_id = q.from.id.0 as i64;

    let (Some(data), Some(msg)) = (q.data.as_deref(), q.message.as_ref()) else {
        bot.answer_callback_query(callback_id).await?;
        return Ok(());
    };
    let chat_id = msg.chat().id;

    if data == "check_verify" {
        if !check_channel_membership(&bot, state.config.required_channel_id, user_id).await {
            bot.answer_callback_query(callback_id)
                .text("❌ Still not joined. Please join the channel!")
                .show_alert(true)
                .await?;
            return Ok(());
        }
        bot.answer_callback_query(callback_id).await?;
        if let Err(e) = state.accounts.mark_verified(user_id).await {
            error!("Failed to mark user {} verified: {:#}", user_id, e);
        }
        let _ = bot
            .edit_message_text(chat_id, msg.id(), "✅ Membership verified! Starting bot...")
            .await;
        if let Some(account) = load_account(&bot, &state, chat_id, user_id).await {
            send_welcome(&bot, &state, chat_id, &account).await;
        }
        return Ok(());
    }

    bot.answer_callback_query(callback_id).await?;

    let shows_results = msg
        .regular_message()
        .and_then(|m| m.text())
        .is_some_and(|text| text.contains(RESULTS_MARKER));
    if !shows_results {
        let _ = bot.delete_message(chat_id, msg.id()).await;
    }

    let Some(account) = load_account(&bot, &state, chat_id, user_id).await else {
        return Ok(());
    };
    if !ensure_verified(&bot, &state, chat_id, &account).await {
        return Ok(());
    }

    match data {
        "osint" => prompt_for_number(&bot, &state, chat_id, PendingNumber::first()).await,
        "profile" => match state.accounts.profile(user_id).await {
            Ok(Some(profile)) => {
                bot.send_message(chat_id, profile_text(&profile))
                    .reply_markup(back_keyboard())
                    .await?;
            }
            Ok(None) => {}
            Err(e) => {
                error!("Failed to load profile for {}: {:#}", user_id, e);
                show_menu(&bot, &state, chat_id).await;
            }
        },
        "referral" => {
            let text = format!(
                "📢 Share your unique referral link:\n\n\
                 🔗 {}\n\n\
                 👥 Invite friends & earn +2 credits per successful referral!\n\
                 📊 Track progress in Profile.",
                referral_link(&state.bot_username, user_id)
            );
            bot.send_message(chat_id, text)
                .reply_markup(back_keyboard())
                .await?;
        }
        "purchase" => {
            bot.send_message(chat_id, "🛒 Choose a credit package:")
                .reply_markup(purchase_keyboard())
                .await?;
        }
        "back_main" => show_menu(&bot, &state, chat_id).await,
        buy if buy.starts_with("buy_") => match CreditPackage::from_callback(buy) {
            Some(package) => {
                let text = format!(
                    "💳 Selected Package:\n\
                     💰 {}₹ → {} Credits\n\n\
                     📝 Steps:\n\
                     1️⃣ Pay to @{}\n\
                     2️⃣ Send proof to @{}\n\
                     3️⃣ Credits will be added instantly!\n\n\
                     ⚠️ No redeem codes needed.",
                    package.price_inr,
                    package.credits,
                    state.config.payment_bot_username.trim_start_matches('@'),
                    state.config.support_bot_username.trim_start_matches('@'),
                );
                bot.send_message(chat_id, text)
                    .reply_markup(back_keyboard())
                    .await?;
            }
            None => show_menu(&bot, &state, chat_id).await,
        },
        other => info!("Unknown callback data: {}", other),
    }

    Ok(())
}

async fn load_account(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    user_id: i64,
) -> Option<UserAccount> {
    match state.accounts.get(user_id).await {
        Ok(Some(account)) => Some(account),
        Ok(None) => {
            let _ = bot
                .send_message(chat_id, "❌ User not found. Restart with /start.")
                .await;
            None
        }
        Err(e) => {
            error!("Failed to load user {}: {:#}", user_id, e);
            None
        }
    }
}

fn profile_text(profile: &Profile) -> String {
    let account = &profile.account;
    let username = account
        .username
        .as_deref()
        .map(|u| format!("@{}", u))
        .unwrap_or_else(|| "None".to_string());

    let mut text = format!(
        "😊 Welcome! Thanks for using OSINT BOT!\n\n\
         👤 User Profile\n\n\
         👤 Name: {}\n\
         🔰 Username: {}\n\
         🆔 User ID: {}\n\n\
         💰 Credits: {}\n\
         🎁 Total Referrals: {}\n\
         🔎 Numbers Searched: {}\n",
        account.name,
        username,
        account.user_id,
        account.credits,
        account.referrals,
        profile.searches,
    );
    for entry in &profile.recent {
        text.push_str(&format!(
            "   • {} ({})\n",
            entry.number,
            entry.searched_at.format("%Y-%m-%d")
        ));
    }
    text.push('\n');
    text.push_str(status_badge(account));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use osint_db::models::history::SearchHistoryEntry;
    use osint_db::models::user::UserStatus;

    #[test]
    fn profile_shows_handle_badge_and_recent_numbers() {
        let mut profile = Profile {
            account: UserAccount::new(42, "Asha", Some("asha")),
            searches: 3,
            recent: vec![SearchHistoryEntry {
                id: 3,
                user_id: 42,
                number: "9876543210".to_string(),
                searched_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            }],
        };
        let text = profile_text(&profile);
        assert!(text.contains("🔰 Username: @asha"));
        assert!(text.contains("🔎 Numbers Searched: 3"));
        assert!(text.contains("• 9876543210 (2024-05-01)"));
        assert!(text.ends_with("👤 Guest"));

        profile.account.username = None;
        profile.account.status = UserStatus::Premium;
        profile.recent.clear();
        let text = profile_text(&profile);
        assert!(text.contains("🔰 Username: None"));
        assert!(text.ends_with("👑 Premium"));
    }
}
