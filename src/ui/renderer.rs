use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::core::controller::ControllerState;
use crate::ui::app::App;

const MIN_INPUT_ROWS: u16 = 1;
const MAX_INPUT_ROWS: u16 = 6;

pub struct ChatLayout {
    pub title: Rect,
    pub transcript: Rect,
    pub status: Rect,
    pub input: Rect,
}

pub fn input_rows(app: &App) -> u16 {
    let rows = u16::try_from(app.textarea.lines().len()).unwrap_or(MAX_INPUT_ROWS);
    rows.clamp(MIN_INPUT_ROWS, MAX_INPUT_ROWS)
}

pub fn layout(area: Rect, app: &App) -> ChatLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(input_rows(app) + 2),
        ])
        .split(area);
    ChatLayout {
        title: chunks[0],
        transcript: chunks[1],
        status: chunks[2],
        input: chunks[3],
    }
}

fn busy_label(state: ControllerState) -> Option<&'static str> {
    match state {
        ControllerState::Idle => None,
        ControllerState::AwaitingSession => Some("◐ Preparing conversation…"),
        ControllerState::AwaitingResponse => Some("● Waiting for reply…"),
    }
}

fn status_line(app: &App) -> Line<'static> {
    let mut spans = Vec::new();
    if let Some(error) = &app.error {
        spans.push(Span::styled(error.clone(), app.theme.error_style));
    } else if let Some(hint) = &app.hint {
        spans.push(Span::styled(hint.clone(), app.theme.status_style));
    }
    if let Some(label) = busy_label(app.state) {
        if !spans.is_empty() {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(label, app.theme.status_style));
    }
    Line::from(spans)
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let area = f.area();
    f.render_widget(Block::default().style(app.theme.base_style()), area);

    let chunks = layout(area, app);

    f.render_widget(
        Paragraph::new(Line::from(Span::styled(app.title(), app.theme.title_style))),
        chunks.title,
    );

    let lines = app.transcript_lines(chunks.transcript.width);
    let height = usize::from(chunks.transcript.height);
    let offset = app.scroll_offset(lines.len(), height);
    let visible: Vec<Line<'static>> = lines.into_iter().skip(offset).take(height).collect();
    f.render_widget(Paragraph::new(visible), chunks.transcript);

    f.render_widget(Paragraph::new(status_line(app)), chunks.status);

    let input_title = if app.state.is_idle() {
        "Message (Enter send • Ctrl+T theme • Ctrl+L language • Esc quit)"
    } else {
        "Message (waiting for reply • Esc quit)"
    };
    app.textarea.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.theme.input_border_style)
            .title(Span::styled(input_title, app.theme.input_title_style)),
    );
    f.render_widget(&app.textarea, chunks.input);
}
