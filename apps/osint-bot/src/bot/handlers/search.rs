use teloxide::prelude::*;
use teloxide::types::ForceReply;
use tracing::{error, info, warn};

use super::show_menu;
use crate::bot::keyboards::main_menu;
use crate::bot::utils::prompts::PendingNumber;
use crate::errors::SearchError;
use crate::services::search_service::SearchTicket;
use crate::utils::{split_message, truncate_chars, TELEGRAM_MESSAGE_LIMIT};
use crate::AppState;

const NUMBER_PROMPT: &str = "📱 Enter a 10-digit phone number to search:";

pub async fn prompt_for_number(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    pending: PendingNumber,
) {
    state.prompts.expect_number(chat_id.0, pending).await;
    if let Err(e) = bot
        .send_message(chat_id, NUMBER_PROMPT)
        .reply_markup(ForceReply::new())
        .await
    {
        error!("Failed to send number prompt: {}", e);
        state.prompts.cancel(chat_id.0).await;
    }
}

/// Answer to a number prompt. Invalid input re-prompts until the attempt
/// budget runs out.
pub async fn handle_number_input(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    user_id: i64,
    input: &str,
    pending: PendingNumber,
) {
    match state.search.authorize(user_id, input).await {
        Ok(ticket) => run_search(bot, state, chat_id, user_id, ticket).await,
        Err(SearchError::InvalidNumber) => {
            let _ = bot
                .send_message(
                    chat_id,
                    "❌ Invalid! Use exactly 10 digits (e.g., 9876543210).",
                )
                .await;
            match pending.next() {
                Some(next) => prompt_for_number(bot, state, chat_id, next).await,
                None => {
                    info!("User {} ran out of number attempts", user_id);
                    show_menu(bot, state, chat_id).await;
                }
            }
        }
        Err(e) => report_failure(bot, state, chat_id, user_id, e).await,
    }
}

async fn run_search(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    user_id: i64,
    ticket: SearchTicket,
) {
    info!("User {} searching {}", user_id, ticket.number());

    let placeholder = bot
        .send_message(chat_id, "🔍 Searching... Please wait ⏳")
        .await
        .map_err(|e| error!("Failed to send search placeholder: {}", e))
        .ok();

    let outcome = state.search.execute(ticket).await;

    if let Some(placeholder) = placeholder {
        let _ = bot.delete_message(chat_id, placeholder.id).await;
    }

    let report = match outcome {
        Ok(report) => report,
        Err(e) => return report_failure(bot, state, chat_id, user_id, e).await,
    };

    info!(
        "Search completed for user {}, number {}, {} results (charged: {})",
        user_id,
        report.number,
        report.results.len(),
        report.charged
    );

    let chunks = split_message(&report.render(), TELEGRAM_MESSAGE_LIMIT);
    let count = chunks.len();
    for (idx, chunk) in chunks.into_iter().enumerate() {
        let mut request = bot.send_message(chat_id, chunk);
        if idx + 1 == count {
            request = request.reply_markup(main_menu(&state.config.support_bot_username));
        }
        if let Err(e) = request.await {
            error!("Failed to deliver search results to {}: {}", chat_id, e);
            break;
        }
    }
}

async fn report_failure(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    user_id: i64,
    err: SearchError,
) {
    let text = match &err {
        SearchError::UnknownUser(_) => {
            let _ = bot
                .send_message(chat_id, "❌ User not found. Restart with /start.")
                .await;
            return;
        }
        SearchError::InvalidNumber => {
            "❌ Invalid! Use exactly 10 digits (e.g., 9876543210).".to_string()
        }
        SearchError::InsufficientCredits { cost, .. } => format!(
            "❌ Low credits! Need {} for search. Buy more via Purchase.",
            cost
        ),
        SearchError::NotFound => "❌ No results found for this number.".to_string(),
        SearchError::Upstream(reason) => {
            warn!("Lookup failed for user {}: {}", user_id, reason);
            "❌ Search failed. Try another number.".to_string()
        }
        SearchError::Storage(e) => {
            error!("Unexpected error in search for user {}: {:#}", user_id, e);
            format!("❌ Unexpected error: {}", truncate_chars(&e.to_string(), 50))
        }
    };

    let _ = bot.send_message(chat_id, text).await;
    show_menu(bot, state, chat_id).await;
}
