//! Command invocation context and reply visibility.
//!
//! A raw Telegram message becomes a [`CommandContext`] through
//! [`transform_context`]; [`whisper`] then decides who gets to see the reply.
//! `whisper` only accepts a `CommandContext`, so it always runs second.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode, UserId};

/// Who sees a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Everyone in the chat the command was sent from.
    Public,
    /// Only the user who invoked the command.
    Private,
}

/// Delivers replies to the chat platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Responder: Send + Sync {
    /// Send a success-styled reply.
    async fn send_success(&self, text: &str, visibility: Visibility) -> Result<()>;
}

/// Context handed to command handlers.
pub struct CommandContext<R> {
    author_id: i64,
    chat_id: i64,
    visibility: Visibility,
    responder: R,
}

impl<R: Responder> CommandContext<R> {
    pub(crate) fn new(author_id: i64, chat_id: i64, responder: R) -> Self {
        Self {
            author_id,
            chat_id,
            visibility: Visibility::Public,
            responder,
        }
    }

    /// Telegram ID of the invoking user
    #[must_use]
    pub fn author_id(&self) -> i64 {
        self.author_id
    }

    /// Chat the command was sent from
    #[must_use]
    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }

    /// Visibility replies sent through this context will use
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Reply with a success message.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform refuses the message.
    pub async fn send_success(&self, text: &str) -> Result<()> {
        self.responder.send_success(text, self.visibility).await
    }
}

/// Sends replies through the Telegram Bot API.
///
/// Public replies go to the originating chat, private ones are sent to the
/// user as a direct message.
///
/// Telegram only lets a bot message users who have opened a conversation
/// with it first. For anyone else a private reply fails with `403 Forbidden`;
/// the error names the user and is not retried in the chat, so a private
/// reply never becomes visible to the whole chat.
pub struct TelegramResponder {
    bot: Bot,
    chat_id: ChatId,
    user_id: UserId,
}

/// Formats a success reply as Telegram HTML, echoing `text` literally.
#[must_use]
pub fn render_success(text: &str) -> String {
    format!("✅ {}", html_escape::encode_text(text))
}

#[async_trait]
impl Responder for TelegramResponder {
    async fn send_success(&self, text: &str, visibility: Visibility) -> Result<()> {
        let target = match visibility {
            Visibility::Public => self.chat_id,
            Visibility::Private => ChatId::from(self.user_id),
        };

        let sent = self
            .bot
            .send_message(target, render_success(text))
            .parse_mode(ParseMode::Html)
            .await;

        match visibility {
            Visibility::Public => {
                sent?;
            }
            Visibility::Private => {
                sent.with_context(|| {
                    format!(
                        "Private reply to user {} failed; the user has not started a conversation with the bot or has blocked it",
                        self.user_id.0
                    )
                })?;
            }
        }
        Ok(())
    }
}

/// Turns an incoming message into a command context with public replies.
///
/// Returns `None` for messages without a sender (e.g. channel posts).
#[must_use]
pub fn transform_context(
    bot: Bot,
    msg: &Message,
) -> Option<CommandContext<TelegramResponder>> {
    let user = msg.from.as_ref()?;
    let responder = TelegramResponder {
        bot,
        chat_id: msg.chat.id,
        user_id: user.id,
    };
    Some(CommandContext::new(user.id.0.cast_signed(), msg.chat.id.0, responder))
}

/// Makes replies private unless the author is a moderator.
#[must_use]
pub fn whisper<R: Responder>(
    mut ctx: CommandContext<R>,
    moderators: &HashSet<i64>,
) -> CommandContext<R> {
    ctx.visibility = if moderators.contains(&ctx.author_id) {
        Visibility::Public
    } else {
        Visibility::Private
    };
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_whisper_hides_replies_from_regular_users() {
        let ctx = CommandContext::new(42, -100, MockResponder::new());
        assert_eq!(ctx.visibility(), Visibility::Public);

        let ctx = whisper(ctx, &HashSet::from([7]));
        assert_eq!(ctx.visibility(), Visibility::Private);
        assert_eq!(ctx.author_id(), 42);
        assert_eq!(ctx.chat_id(), -100);
    }

    #[test]
    fn test_whisper_keeps_moderator_replies_public() {
        let ctx = CommandContext::new(7, -100, MockResponder::new());
        let ctx = whisper(ctx, &HashSet::from([7, 8]));
        assert_eq!(ctx.visibility(), Visibility::Public);
    }

    #[test]
    fn test_render_success_escapes_html() {
        assert_eq!(render_success("hi"), "✅ hi");
        assert_eq!(render_success("<b>a & b</b>"), "✅ &lt;b&gt;a &amp; b&lt;/b&gt;");
    }

    #[tokio::test]
    async fn test_private_reply_failure_names_the_user() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"chat_id": 42})))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "ok": false,
                "error_code": 403,
                "description": "Forbidden: bot can't initiate conversation with a user"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let responder = TelegramResponder {
            bot: Bot::new("123:test").set_api_url(reqwest::Url::parse(&server.uri())?),
            chat_id: ChatId(-100),
            user_id: UserId(42),
        };
        let err = responder.send_success("hi", Visibility::Private).await.err();
        let message = err.map(|e| format!("{e:#}")).unwrap_or_default();
        assert!(message.contains("Private reply to user 42 failed"));
        assert!(message.contains("has not started a conversation"));
        Ok(())
    }
}
