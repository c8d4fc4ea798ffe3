use crate::bot::greetings::{command_handler, Command};
use crate::config::Settings;
use crate::fetchers::FetchClient;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{BotCommandScope, ChatId, Recipient};
use teloxide::utils::command::BotCommands;
use tracing::{error, info};

/// Run the Telegram dispatcher until Ctrl-C.
///
/// `fetchers` is registered as a dependency so every handler shares the
/// same HTTP client.
pub async fn run_bot(settings: Arc<Settings>, fetchers: Arc<FetchClient>) {
    let bot = Bot::new(settings.telegram_token.clone());
    register_commands(&bot, settings.home_chat_id).await;

    info!("Bot is running...");

    Dispatcher::builder(bot, command_handler())
        .dependencies(dptree::deps![settings, fetchers])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

/// Publishes the command list to the home chat only.
async fn register_commands(bot: &Bot, home_chat_id: i64) {
    let scope = BotCommandScope::Chat {
        chat_id: Recipient::Id(ChatId(home_chat_id)),
    };

    match bot.set_my_commands(Command::bot_commands()).scope(scope).await {
        Ok(_) => info!("Commands registered for chat {}", home_chat_id),
        Err(e) => error!("Failed to register commands for chat {}: {}", home_chat_id, e),
    }
}
