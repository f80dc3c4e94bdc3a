//! Display mirror of the conversation and its per-message render cache.

use ratatui::layout::Alignment;
use ratatui::text::{Line, Span};

use crate::core::message::Message;
use crate::core::preferences::ThemeKind;
use crate::core::sanitize::sanitize;
use crate::ui::markdown::{render_markdown, render_plain};
use crate::ui::markdown_wrap::wrap_lines;
use crate::ui::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub markdown: bool,
    pub syntax_highlighting: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            markdown: true,
            syntax_highlighting: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheKey {
    width: u16,
    theme: ThemeKind,
    options: RenderOptions,
}

struct Entry {
    message: Message,
    rendered: Option<(CacheKey, Vec<Line<'static>>)>,
}

/// Messages in append order. Only ever grows.
#[derive(Default)]
pub struct Transcript {
    entries: Vec<Entry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.entries.push(Entry {
            message,
            rendered: None,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().map(|entry| &entry.message)
    }

    pub fn invalidate(&mut self) {
        for entry in &mut self.entries {
            entry.rendered = None;
        }
    }

    /// Number of cached renders that match the given settings.
    pub fn cached_count(&self, width: u16, theme: &Theme, options: RenderOptions) -> usize {
        let key = CacheKey {
            width,
            theme: theme.kind,
            options,
        };
        self.entries
            .iter()
            .filter(|entry| matches!(&entry.rendered, Some((k, _)) if *k == key))
            .count()
    }

    /// Every message rendered and wrapped to `width`, separated by blank lines.
    pub fn lines(&mut self, width: u16, theme: &Theme, options: RenderOptions) -> Vec<Line<'static>> {
        let key = CacheKey {
            width,
            theme: theme.kind,
            options,
        };
        let mut out = Vec::new();
        for (index, entry) in self.entries.iter_mut().enumerate() {
            if index > 0 {
                out.push(Line::default());
            }
            let fresh = !matches!(&entry.rendered, Some((k, _)) if *k == key);
            if fresh {
                let lines = render_message(&entry.message, theme, options, width);
                entry.rendered = Some((key, lines));
            }
            if let Some((_, lines)) = &entry.rendered {
                out.extend(lines.iter().cloned());
            }
        }
        out
    }
}

pub fn label_text(message: &Message) -> String {
    format!(
        "{} - {}",
        message.role().display_label(),
        message.time_label()
    )
}

/// Body plus label line for one message.
///
/// User text is shown verbatim and right-aligned; assistant text is rendered
/// as markdown. Both are sanitized first.
pub fn render_message(
    message: &Message,
    theme: &Theme,
    options: RenderOptions,
    width: u16,
) -> Vec<Line<'static>> {
    let clean = sanitize(message.text());
    let (body, alignment) = if message.is_user() {
        (render_plain(&clean, theme.user_text_style), Alignment::Right)
    } else if options.markdown {
        (
            render_markdown(&clean, theme, options.syntax_highlighting),
            Alignment::Left,
        )
    } else {
        (render_plain(&clean, theme.assistant_text_style), Alignment::Left)
    };

    let mut lines: Vec<Line<'static>> = body
        .into_iter()
        .map(|line| line.alignment(alignment))
        .collect();
    lines.push(Line::from(Span::styled(label_text(message), theme.label_style)).alignment(alignment));

    wrap_lines(&lines, usize::from(width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn at(role_user: bool, text: &str) -> Message {
        let timestamp = Local.with_ymd_and_hms(2024, 5, 1, 9, 5, 7).unwrap();
        let role = if role_user {
            crate::core::message::Role::User
        } else {
            crate::core::message::Role::Assistant
        };
        Message::with_timestamp(role, text, timestamp)
    }

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        crate::ui::markdown::to_plain_lines(lines)
    }

    #[test]
    fn labels_name_the_sender_and_time() {
        assert_eq!(label_text(&at(true, "hi")), "You - 09:05:07");
        assert_eq!(label_text(&at(false, "hi")), "AI Assistant - 09:05:07");
    }

    #[test]
    fn user_text_is_right_aligned_and_not_parsed() {
        let lines = render_message(&at(true, "**raw**"), &Theme::light(), RenderOptions::default(), 80);
        assert_eq!(plain(&lines), vec!["**raw**", "You - 09:05:07"]);
        assert!(lines.iter().all(|l| l.alignment == Some(Alignment::Right)));
    }

    #[test]
    fn assistant_text_is_rendered_markdown() {
        let lines = render_message(
            &at(false, "**bold** move"),
            &Theme::light(),
            RenderOptions::default(),
            80,
        );
        assert_eq!(plain(&lines), vec!["bold move", "AI Assistant - 09:05:07"]);
    }

    #[test]
    fn markdown_can_be_turned_off() {
        let options = RenderOptions {
            markdown: false,
            syntax_highlighting: false,
        };
        let lines = render_message(&at(false, "**bold**"), &Theme::light(), options, 80);
        assert_eq!(plain(&lines)[0], "**bold**");
    }

    #[test]
    fn user_control_sequences_are_stripped() {
        let lines = render_message(
            &at(true, "hi\u{1b}[2Jthere"),
            &Theme::dark(),
            RenderOptions::default(),
            80,
        );
        assert_eq!(plain(&lines)[0], "hi[2Jthere");
    }

    #[test]
    fn user_script_fragments_are_stripped() {
        let lines = render_message(
            &at(true, "look <script>steal(document.cookie)</script>here"),
            &Theme::light(),
            RenderOptions::default(),
            80,
        );
        let text = plain(&lines).join("\n");
        assert!(!text.to_ascii_lowercase().contains("<script"));
        assert!(!text.contains("steal(document.cookie)"));
        assert_eq!(plain(&lines)[0], "look here");
    }

    #[test]
    fn messages_are_wrapped_to_width() {
        let lines = render_message(
            &at(false, "one two three four five six"),
            &Theme::light(),
            RenderOptions::default(),
            10,
        );
        assert!(lines.iter().all(|l| l.width() <= 10));
        assert!(lines.len() > 2);
    }

    #[test]
    fn cache_is_reused_until_theme_changes() {
        let mut transcript = Transcript::new();
        transcript.push(at(true, "hello"));
        transcript.push(at(false, "world"));
        let light = Theme::light();
        let options = RenderOptions::default();

        let first = transcript.lines(40, &light, options);
        assert_eq!(transcript.cached_count(40, &light, options), 2);
        assert_eq!(plain(&first).len(), 5);

        let dark = Theme::dark();
        transcript.lines(40, &dark, options);
        assert_eq!(transcript.cached_count(40, &light, options), 0);
        assert_eq!(transcript.cached_count(40, &dark, options), 2);

        transcript.invalidate();
        assert_eq!(transcript.cached_count(40, &dark, options), 0);
    }
}
