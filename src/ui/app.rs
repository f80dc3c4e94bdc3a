//! Display state for the chat screen.
//!
//! Conversation state lives in the worker; everything here is a mirror fed
//! by [`ConversationEvent`]s plus purely visual settings.

use ratatui::text::Line;
use tui_textarea::TextArea;

use crate::core::controller::{ControllerState, ConversationEvent};
use crate::core::preferences::{Language, ThemeKind};
use crate::ui::theme::Theme;
use crate::ui::transcript::{RenderOptions, Transcript};

pub const APP_TITLE: &str = "Personal AI Assistant";
pub const BUSY_HINT: &str = "Still waiting for the previous reply";

pub struct AppSettings {
    pub model: String,
    pub theme: ThemeKind,
    pub language: Language,
    pub render: RenderOptions,
}

pub struct App {
    pub transcript: Transcript,
    pub textarea: TextArea<'static>,
    pub theme: Theme,
    pub language: Language,
    pub model: String,
    pub render: RenderOptions,
    pub state: ControllerState,
    pub error: Option<String>,
    pub hint: Option<String>,
    pending_submission: Option<String>,
    /// `None` follows the newest line; `Some(top)` pins the first visible line.
    scroll_top: Option<usize>,
    pub exit_requested: bool,
}

impl App {
    pub fn new(settings: AppSettings) -> Self {
        let theme = Theme::for_kind(settings.theme);
        let mut app = Self {
            transcript: Transcript::new(),
            textarea: TextArea::default(),
            theme,
            language: settings.language,
            model: settings.model,
            render: settings.render,
            state: ControllerState::Idle,
            error: None,
            hint: None,
            pending_submission: None,
            scroll_top: None,
            exit_requested: false,
        };
        app.style_textarea();
        app
    }

    fn style_textarea(&mut self) {
        self.textarea.set_style(self.theme.input_text_style);
        self.textarea.set_cursor_style(self.theme.input_cursor_style);
        self.textarea
            .set_cursor_line_style(ratatui::style::Style::default());
        self.textarea
            .set_placeholder_text("Type a message and press Enter");
        self.textarea.set_placeholder_style(self.theme.status_style);
    }

    pub fn title(&self) -> String {
        format!(
            "{APP_TITLE} • {} • {} theme • {}",
            self.model,
            self.theme.kind.display_name(),
            self.language.display_name()
        )
    }

    pub fn input_text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    pub fn set_input_text(&mut self, text: &str) {
        let lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        self.textarea = TextArea::new(lines);
        self.style_textarea();
        self.textarea.move_cursor(tui_textarea::CursorMove::Bottom);
        self.textarea.move_cursor(tui_textarea::CursorMove::End);
    }

    pub fn is_busy(&self) -> bool {
        !self.state.is_idle() || self.pending_submission.is_some()
    }

    /// Text to hand to the worker, or `None` when there is nothing to send or
    /// a turn is still in flight. A rejected submit keeps the input.
    pub fn take_submission(&mut self) -> Option<String> {
        let text = self.input_text();
        if text.trim().is_empty() {
            return None;
        }
        if self.is_busy() {
            self.hint = Some(BUSY_HINT.to_string());
            return None;
        }
        self.hint = None;
        self.pending_submission = Some(text.clone());
        Some(text)
    }

    pub fn apply_event(&mut self, event: ConversationEvent) {
        match event {
            ConversationEvent::StateChanged(state) => {
                self.state = state;
                if state.is_idle() {
                    self.hint = None;
                }
            }
            ConversationEvent::MessageAppended(message) => {
                self.transcript.push(message);
            }
            ConversationEvent::InputCleared => {
                if let Some(sent) = self.pending_submission.take() {
                    if self.input_text() == sent {
                        self.set_input_text("");
                    }
                }
            }
            ConversationEvent::ErrorChanged(error) => {
                self.error = error;
            }
        }
    }

    pub fn cycle_theme(&mut self) {
        self.theme = Theme::for_kind(self.theme.kind.next());
        self.transcript.invalidate();
        self.style_textarea();
    }

    pub fn cycle_language(&mut self) -> Language {
        self.language = self.language.next();
        self.language
    }

    pub fn transcript_lines(&mut self, width: u16) -> Vec<Line<'static>> {
        self.transcript.lines(width, &self.theme, self.render)
    }

    /// First visible line for a transcript of `total` lines in `height` rows.
    pub fn scroll_offset(&self, total: usize, height: usize) -> usize {
        let max_top = total.saturating_sub(height);
        self.scroll_top.map_or(max_top, |top| top.min(max_top))
    }

    pub fn scroll_up(&mut self, lines: usize, total: usize, height: usize) {
        let current = self.scroll_offset(total, height);
        self.scroll_top = Some(current.saturating_sub(lines));
    }

    pub fn scroll_down(&mut self, lines: usize, total: usize, height: usize) {
        let max_top = total.saturating_sub(height);
        let next = self.scroll_offset(total, height).saturating_add(lines);
        self.scroll_top = if next >= max_top { None } else { Some(next) };
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_top = None;
    }

    pub fn is_following(&self) -> bool {
        self.scroll_top.is_none()
    }
}
