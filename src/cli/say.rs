//! TUI-less "say" command

use std::error::Error;

use ratatui::crossterm::terminal;
use tracing::info;

use crate::core::controller::{ConversationController, SubmitOutcome};
use crate::core::sanitize::sanitize;
use crate::ui::markdown::{render_markdown, to_plain_lines};
use crate::ui::markdown_wrap::wrap_lines;
use crate::ui::theme::Theme;

/// Printable form of a reply: rendered markdown flattened to plain lines,
/// or the sanitized text as-is.
pub fn format_reply(text: &str, markdown: bool, width: Option<usize>) -> Vec<String> {
    let clean = sanitize(text);
    if !markdown {
        return clean.as_str().lines().map(str::to_string).collect();
    }
    let lines = render_markdown(&clean, &Theme::default(), false);
    let lines = match width {
        Some(width) if width > 0 => wrap_lines(&lines, width),
        _ => lines,
    };
    to_plain_lines(&lines)
}

pub async fn run_say(
    mut controller: ConversationController,
    prompt: Vec<String>,
    markdown: bool,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        return Err("Usage: palaver say <prompt>".into());
    }

    match controller.submit(&prompt).await {
        SubmitOutcome::Completed => {
            let reply = controller
                .history()
                .last()
                .map(|message| message.text().to_string())
                .unwrap_or_default();
            let width = terminal::size().ok().map(|(w, _)| usize::from(w));
            for line in format_reply(&reply, markdown, width) {
                println!("{line}");
            }
            info!("say completed");
            Ok(())
        }
        SubmitOutcome::Failed(err) => {
            Err(format!("❌ {}\n   ({err})", err.user_message()).into())
        }
        SubmitOutcome::Ignored | SubmitOutcome::Busy => {
            Err("Nothing was sent".into())
        }
    }
}
