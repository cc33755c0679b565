use teloxide::prelude::*;
use tracing::error;

use crate::bot::keyboards::main_menu;
use crate::AppState;

pub mod callback;
pub mod command;
pub mod search;

pub(crate) async fn show_menu(bot: &Bot, state: &AppState, chat_id: ChatId) {
    let _ = bot
        .send_message(chat_id, "💡 Choose an option:")
        .reply_markup(main_menu(&state.config.support_bot_username))
        .await
        .map_err(|e| error!("Failed to send menu: {}", e));
}
