//! Telegram comms channel: long-polls the Bot API and maps updates onto
//! conversation events.
//!
//! Text messages become commands or free text, documents become
//! `Event::Document` carrying the Telegram file id, and inline-keyboard
//! presses become `Event::Choice` with the button's callback data. Any other
//! message (photo, sticker, voice) becomes `Event::Unsupported`. Prompts are
//! rendered as inline keyboards with one button per row.

use std::env;
use std::sync::Arc;

use teloxide::payloads::{SendDocumentSetters, SendMessageSetters};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::state::CommsState;
use crate::error::AppError;
use crate::subsystems::auth;
use crate::subsystems::conversation::{Button, Event, Reply};
use crate::subsystems::runtime::{Component, ComponentFuture};

// ── TelegramChannel ──────────────────────────────────────────────────────────

pub struct TelegramChannel {
    channel_id: String,
    state: Arc<CommsState>,
}

impl TelegramChannel {
    pub fn new(channel_id: impl Into<String>, state: Arc<CommsState>) -> Self {
        Self { channel_id: channel_id.into(), state }
    }
}

impl Component for TelegramChannel {
    fn id(&self) -> &str {
        &self.channel_id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(run_telegram(self.channel_id, self.state, shutdown))
    }
}

// ── Mapping ──────────────────────────────────────────────────────────────────

fn text_event(text: &str) -> Event {
    Event::parse_command(text).unwrap_or_else(|| Event::Text(text.to_string()))
}

/// A document wins over its caption; a message with neither is unsupported.
fn message_event(document: Option<(String, Option<String>)>, text: Option<&str>) -> Event {
    match (document, text) {
        (Some((reference, name)), _) => Event::Document { reference, name },
        (None, Some(text)) => text_event(text),
        (None, None) => Event::Unsupported,
    }
}

fn keyboard(choices: &[Button]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        choices
            .iter()
            .map(|c| vec![InlineKeyboardButton::callback(c.label.clone(), c.token.clone())]),
    )
}

async fn send_replies(bot: &Bot, chat_id: ChatId, replies: Vec<Reply>) {
    for reply in replies {
        let sent = match reply {
            Reply::Prompt { text, choices } if !choices.is_empty() => bot
                .send_message(chat_id, text)
                .reply_markup(keyboard(&choices))
                .await
                .map(|_| ()),
            Reply::Prompt { text, .. } | Reply::Message { text } | Reply::Hint { text } => {
                bot.send_message(chat_id, text).await.map(|_| ())
            }
            Reply::Document { reference, caption } => bot
                .send_document(chat_id, InputFile::file_id(reference))
                .caption(caption)
                .await
                .map(|_| ()),
        };
        if let Err(e) = sent {
            warn!(%chat_id, "failed to send telegram reply: {e}");
        }
    }
}

async fn dispatch(
    bot: &Bot,
    state: &CommsState,
    channel_id: &str,
    chat_id: ChatId,
    user: auth::UserId,
    event: Event,
) {
    match state.handle(channel_id, user, event).await {
        Ok(replies) => send_replies(bot, chat_id, replies).await,
        Err(e) => {
            warn!("engine error: {e}");
            let _ = bot.send_message(chat_id, "Internal error processing message.").await;
        }
    }
}

// ── run_telegram ─────────────────────────────────────────────────────────────

async fn run_telegram(
    channel_id: String,
    state: Arc<CommsState>,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let token = match env::var("TELEGRAM_BOT_TOKEN") {
        Ok(t) => t,
        Err(_) => {
            warn!(%channel_id, "TELEGRAM_BOT_TOKEN not set, telegram channel exiting");
            return Ok(());
        }
    };

    info!(%channel_id, "telegram channel starting");

    let bot = Bot::new(token);

    let message_state = state.clone();
    let message_channel = channel_id.clone();
    let on_message = move |bot: Bot, msg: Message| {
        let state = message_state.clone();
        let channel_id = message_channel.clone();
        async move {
            let Some(from) = msg.from.as_ref() else {
                return respond(());
            };
            let document = msg.document().map(|doc| (doc.file.id.to_string(), doc.file_name.clone()));
            let event = message_event(document, msg.text());
            debug!(%channel_id, user = from.id.0, event = event.kind(), "telegram message");

            let user = auth::UserId::new(from.id.0.to_string());
            dispatch(&bot, &state, &channel_id, msg.chat.id, user, event).await;
            respond(())
        }
    };

    let callback_state = state.clone();
    let callback_channel = channel_id.clone();
    let on_callback = move |bot: Bot, q: CallbackQuery| {
        let state = callback_state.clone();
        let channel_id = callback_channel.clone();
        async move {
            if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
                warn!("failed to answer callback query: {e}");
            }
            let Some(token) = q.data.clone() else {
                return respond(());
            };
            let chat_id = q
                .message
                .as_ref()
                .map(|m| m.chat().id)
                .unwrap_or_else(|| ChatId::from(q.from.id));
            debug!(%channel_id, user = q.from.id.0, %token, "telegram choice");

            let user = auth::UserId::new(q.from.id.0.to_string());
            dispatch(&bot, &state, &channel_id, chat_id, user, Event::Choice(token)).await;
            respond(())
        }
    };

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback));

    let mut dispatcher = Dispatcher::builder(bot, handler).build();

    tokio::select! {
        biased;

        _ = shutdown.cancelled() => {
            info!(%channel_id, "shutdown signal received, closing telegram channel");
        }
        _ = dispatcher.dispatch() => {
            warn!(%channel_id, "telegram dispatcher exited unexpectedly");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use teloxide::types::InlineKeyboardButtonKind;

    use super::*;
    use crate::subsystems::conversation::render;
    use crate::subsystems::conversation::Prompt;
    use crate::subsystems::papers::Level;

    #[test]
    fn commands_and_text_map_to_events() {
        assert_eq!(text_event("/start@pyq_bot"), Event::Start);
        assert_eq!(text_event("/admin"), Event::Admin);
        assert_eq!(text_event("Mathematics I"), Event::Text("Mathematics I".into()));
    }

    #[test]
    fn documents_text_and_other_messages_map_to_events() {
        assert_eq!(
            message_event(Some(("file-1".into(), Some("paper.pdf".into()))), Some("caption")),
            Event::Document { reference: "file-1".into(), name: Some("paper.pdf".into()) }
        );
        assert_eq!(message_event(None, Some("/cancel")), Event::Cancel);
        assert_eq!(message_event(None, None), Event::Unsupported);
    }

    #[test]
    fn long_labels_fit_in_callback_data() {
        let subject = "Advanced Topics in Distributed Systems and Fault Tolerant Computing (Elective)";
        let reply = render::prompt(&Prompt::BrowseSubjects {
            level: Level::Degree,
            subjects: vec![subject.into(), "x".repeat(200)],
        });
        let Reply::Prompt { choices, .. } = reply else { panic!("expected a prompt") };
        let markup = keyboard(&choices);

        assert_eq!(markup.inline_keyboard[0][0].text, subject);
        for row in &markup.inline_keyboard {
            match &row[0].kind {
                InlineKeyboardButtonKind::CallbackData(data) => assert!(data.len() <= 64, "{data}"),
                other => panic!("unexpected button kind {other:?}"),
            }
        }
    }

    #[test]
    fn keyboard_has_one_button_per_row() {
        let choices = vec![
            Button { label: "Foundation".into(), token: "foundation".into() },
            Button { label: "Diploma".into(), token: "diploma".into() },
        ];
        let markup = keyboard(&choices);
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert!(markup.inline_keyboard.iter().all(|row| row.len() == 1));
        assert_eq!(markup.inline_keyboard[1][0].text, "Diploma");
    }
}
