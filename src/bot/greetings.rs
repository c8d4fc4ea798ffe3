//! Greetings commands.

use super::context::{transform_context, whisper, CommandContext, Responder};
use crate::config::Settings;
use anyhow::Result;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use teloxide::utils::command::BotCommands;
use tracing::{error, info};

/// Commands registered in the home chat
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Echo a message back to the caller
    #[command(description = "Says hello to the user. message: The message to send back")]
    Say {
        /// The message to send back
        message: String,
    },
}

/// Sends `message` back to whoever invoked the command.
///
/// # Errors
///
/// Returns an error if the reply cannot be delivered.
pub async fn say<R: Responder>(ctx: &CommandContext<R>, message: &str) -> Result<()> {
    ctx.send_success(message).await
}

/// Whether a message was sent from the chat the commands are registered in.
#[must_use]
pub fn in_home_chat(chat_id: ChatId, settings: &Settings) -> bool {
    chat_id.0 == settings.home_chat_id
}

/// Dispatcher branch for the greetings commands, limited to the home chat.
#[must_use]
pub fn command_handler() -> UpdateHandler<teloxide::RequestError> {
    Update::filter_message()
        .filter(|msg: Message, settings: Arc<Settings>| in_home_chat(msg.chat.id, &settings))
        .filter_command::<Command>()
        .endpoint(handle_command)
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    settings: Arc<Settings>,
) -> Result<(), teloxide::RequestError> {
    match cmd {
        Command::Say { message } => {
            let Some(ctx) = transform_context(bot, &msg) else {
                info!("Ignoring /say without a sender in chat {}", msg.chat.id);
                return respond(());
            };
            let ctx = whisper(ctx, &settings.moderators());

            if let Err(e) = say(&ctx, &message).await {
                error!("Command error: {}", e);
            }
        }
    }
    respond(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::context::{MockResponder, Visibility};
    use std::collections::HashSet;

    fn settings(home_chat_id: i64) -> Settings {
        Settings {
            telegram_token: "dummy".to_string(),
            home_chat_id,
            moderators_str: Some("7".to_string()),
            chatgpt_api_key: None,
            chatgpt_api_endpoint: None,
        }
    }

    #[tokio::test]
    async fn test_say_whispers_to_regular_users() -> Result<()> {
        let mut responder = MockResponder::new();
        responder
            .expect_send_success()
            .withf(|text, visibility| text == "hi" && *visibility == Visibility::Private)
            .times(1)
            .returning(|_, _| Ok(()));

        let settings = settings(-100);
        let ctx = whisper(CommandContext::new(42, -100, responder), &settings.moderators());
        say(&ctx, "hi").await
    }

    #[tokio::test]
    async fn test_say_replies_publicly_to_moderators() -> Result<()> {
        let mut responder = MockResponder::new();
        responder
            .expect_send_success()
            .withf(|text, visibility| text == "hi" && *visibility == Visibility::Public)
            .times(1)
            .returning(|_, _| Ok(()));

        let settings = settings(-100);
        let ctx = whisper(CommandContext::new(7, -100, responder), &settings.moderators());
        say(&ctx, "hi").await
    }

    #[tokio::test]
    async fn test_say_propagates_delivery_errors() {
        let mut responder = MockResponder::new();
        responder
            .expect_send_success()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("chat not found")));

        let ctx = whisper(CommandContext::new(42, -100, responder), &HashSet::new());
        let err = say(&ctx, "hi").await.err();
        assert!(err.is_some_and(|e| e.to_string().contains("chat not found")));
    }

    #[test]
    fn test_command_only_enabled_in_home_chat() {
        let settings = settings(-100);
        assert!(in_home_chat(ChatId(-100), &settings));
        assert!(!in_home_chat(ChatId(-200), &settings));
    }

    #[test]
    fn test_say_parses_whole_message() {
        let parsed = Command::parse("/say hello there", "cosmo_bot");
        assert!(matches!(parsed, Ok(Command::Say { ref message }) if message == "hello there"));
    }

    #[test]
    fn test_say_is_described_with_its_argument() {
        let help = Command::descriptions().to_string();
        assert!(help.contains("/say"));
        assert!(help.contains("Says hello to the user"));
        assert!(help.contains("The message to send back"));
    }
}
