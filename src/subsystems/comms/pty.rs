//! Console comms channel: one local user driving the bot from stdin.
//!
//! Prompts are printed with numbered choices. An input line is one of
//!
//! - `/start`, `/admin`, `/cancel`
//! - `/doc <reference> [display name]` to attach a document
//! - a number, or the exact label, of a listed choice
//! - anything else, sent as free text
//!
//! Runs until the `shutdown` token is cancelled (Ctrl-C) or stdin closes.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::state::{CommsEvent, CommsState};
use crate::error::AppError;
use crate::subsystems::auth::UserId;
use crate::subsystems::conversation::{Button, Event, Reply};
use crate::subsystems::runtime::{Component, ComponentFuture};

// ── PtyChannel ───────────────────────────────────────────────────────────────

pub struct PtyChannel {
    channel_id: String,
    user: UserId,
    state: Arc<CommsState>,
}

impl PtyChannel {
    pub fn new(channel_id: impl Into<String>, user: impl Into<String>, state: Arc<CommsState>) -> Self {
        Self { channel_id: channel_id.into(), user: UserId::new(user), state }
    }
}

impl Component for PtyChannel {
    fn id(&self) -> &str {
        &self.channel_id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(run_pty(self.channel_id, self.user, self.state, shutdown))
    }
}

// ── Input parsing ────────────────────────────────────────────────────────────

/// One console line, interpreted against the choices currently on screen.
#[derive(Debug, PartialEq, Eq)]
pub enum Line {
    Empty,
    Event(Event),
    /// Malformed console syntax; the text is a usage message.
    Invalid(&'static str),
}

pub fn parse_line(line: &str, choices: &[Button]) -> Line {
    let line = line.trim();
    if line.is_empty() {
        return Line::Empty;
    }

    if let Some(event) = Event::parse_command(line) {
        return Line::Event(event);
    }

    if let Some(rest) = line.strip_prefix("/doc") {
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            return Line::Event(Event::Text(line.to_string()));
        }
        let rest = rest.trim();
        let (reference, name) = match rest.split_once(char::is_whitespace) {
            Some((reference, name)) => (reference, Some(name.trim().to_string())),
            None => (rest, None),
        };
        if reference.is_empty() {
            return Line::Invalid("usage: /doc <reference> [display name]");
        }
        return Line::Event(Event::Document { reference: reference.to_string(), name });
    }

    // With no menu on screen a number is an answer (e.g. a year), not a pick.
    if let Ok(n) = line.parse::<usize>() {
        if let Some(button) = n.checked_sub(1).and_then(|i| choices.get(i)) {
            return Line::Event(Event::Choice(button.token.clone()));
        }
    }

    if let Some(button) = choices.iter().find(|b| b.label.eq_ignore_ascii_case(line)) {
        return Line::Event(Event::Choice(button.token.clone()));
    }

    Line::Event(Event::Text(line.to_string()))
}

// ── Output ───────────────────────────────────────────────────────────────────

pub fn render_reply(reply: &Reply) -> String {
    match reply {
        Reply::Prompt { text, choices } => {
            let mut out = text.clone();
            for (i, choice) in choices.iter().enumerate() {
                out.push_str(&format!("\n  {}) {}", i + 1, choice.label));
            }
            out
        }
        Reply::Message { text } | Reply::Hint { text } => text.clone(),
        Reply::Document { reference, caption } => format!("[document {reference}]\n{caption}"),
    }
}

/// Choices that stay on screen after `replies`.
///
/// A new prompt replaces them, a terminal message clears them, and a hint
/// leaves the previous menu valid.
fn choices_after(replies: &[Reply], current: Vec<Button>) -> Vec<Button> {
    replies.iter().fold(current, |choices, reply| match reply {
        Reply::Prompt { choices, .. } => choices.clone(),
        Reply::Message { .. } | Reply::Document { .. } => Vec::new(),
        Reply::Hint { .. } => choices,
    })
}

// ── run_pty ──────────────────────────────────────────────────────────────────

async fn run_pty(
    channel_id: String,
    user: UserId,
    state: Arc<CommsState>,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    info!(%channel_id, %user, "pty channel started");
    println!("─────────────────────────────────");
    println!(" PYQ console  (Ctrl-C to quit)");
    println!(" /start to browse, /admin to manage");
    println!("─────────────────────────────────");

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    let mut choices: Vec<Button> = Vec::new();

    loop {
        print!("> ");
        use std::io::Write as _;
        let _ = std::io::stdout().flush();

        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                println!();
                info!("pty channel shutting down");
                break;
            }

            line = lines.next_line() => {
                let input = match line {
                    Err(e) => {
                        warn!("pty read error: {e}");
                        break;
                    }
                    Ok(None) => {
                        info!("pty stdin closed");
                        break;
                    }
                    Ok(Some(input)) => input,
                };

                let event = match parse_line(&input, &choices) {
                    Line::Empty => continue,
                    Line::Invalid(usage) => {
                        println!("{usage}");
                        continue;
                    }
                    Line::Event(event) => event,
                };
                debug!(event = event.kind(), "pty received line");

                let replies = state.handle(&channel_id, user.clone(), event).await?;
                for reply in &replies {
                    println!("{}\n", render_reply(reply));
                }
                choices = choices_after(&replies, choices);
            }
        }
    }

    state.report_event(CommsEvent::ChannelShutdown { channel_id });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subsystems::conversation::event::{BACK, CANCEL, pick_token};

    fn menu() -> Vec<Button> {
        vec![
            Button { label: "Mathematics I".into(), token: pick_token(0) },
            Button { label: "« Back".into(), token: BACK.into() },
        ]
    }

    #[test]
    fn commands_are_recognised() {
        assert_eq!(parse_line("/start", &[]), Line::Event(Event::Start));
        assert_eq!(parse_line("  /CANCEL ", &menu()), Line::Event(Event::Cancel));
        assert_eq!(parse_line("", &menu()), Line::Empty);
    }

    #[test]
    fn numbers_pick_listed_choices() {
        assert_eq!(parse_line("2", &menu()), Line::Event(Event::Choice(BACK.into())));
        assert_eq!(parse_line("3", &menu()), Line::Event(Event::Text("3".into())));
        assert_eq!(parse_line("0", &menu()), Line::Event(Event::Text("0".into())));
    }

    #[test]
    fn numbers_without_a_menu_are_text() {
        assert_eq!(parse_line("2024", &[]), Line::Event(Event::Text("2024".into())));
    }

    #[test]
    fn labels_pick_choices_case_insensitively() {
        assert_eq!(
            parse_line("mathematics i", &menu()),
            Line::Event(Event::Choice(pick_token(0)))
        );
    }

    #[test]
    fn doc_attaches_a_document() {
        assert_eq!(
            parse_line("/doc abc123 Maths 2024.pdf", &[]),
            Line::Event(Event::Document {
                reference: "abc123".into(),
                name: Some("Maths 2024.pdf".into()),
            })
        );
        assert_eq!(
            parse_line("/doc abc123", &[]),
            Line::Event(Event::Document { reference: "abc123".into(), name: None })
        );
        assert!(matches!(parse_line("/doc", &[]), Line::Invalid(_)));
        assert_eq!(parse_line("/docs", &[]), Line::Event(Event::Text("/docs".into())));
    }

    #[test]
    fn prompts_render_numbered_choices() {
        let reply = Reply::Prompt { text: "Pick:".into(), choices: menu() };
        assert_eq!(render_reply(&reply), "Pick:\n  1) Mathematics I\n  2) « Back");
    }

    #[test]
    fn hints_keep_the_menu_and_messages_clear_it() {
        let hint = Reply::Hint { text: "no".into() };
        assert_eq!(choices_after(&[hint], menu()), menu());

        let done = Reply::Message { text: "bye".into() };
        assert!(choices_after(&[done], menu()).is_empty());

        let cancel_only = vec![Button { label: "« Cancel".into(), token: CANCEL.into() }];
        let prompt = Reply::Prompt { text: "Admin".into(), choices: cancel_only.clone() };
        assert_eq!(choices_after(&[prompt], menu()), cancel_only);
    }
}
