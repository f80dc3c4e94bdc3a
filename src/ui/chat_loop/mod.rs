//! Interactive chat screen: terminal setup, input dispatch and redraws.

mod keybindings;
mod lifecycle;

use std::error::Error;
use std::time::Duration;

use ratatui::crossterm::event::{self, Event, KeyEvent};
use ratatui::layout::Rect;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tui_textarea::Input as TAInput;

use crate::core::controller::ConversationController;
use crate::core::worker::{self, ConversationCommand, ConversationHandle};
use crate::ui::app::{App, AppSettings};
use crate::ui::renderer;

use keybindings::{classify_key, classify_mouse, sanitize_pasted_text, KeyAction};
use lifecycle::{restore_terminal, setup_terminal, ChatTerminal};

pub enum UiEvent {
    Crossterm(Event),
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => continue,
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

/// Run the chat screen until the user quits.
pub async fn run_chat(
    controller: ConversationController,
    settings: AppSettings,
) -> Result<(), Box<dyn Error>> {
    let mut conversation = worker::spawn(controller);
    conversation.send(ConversationCommand::Prewarm);

    let mut app = App::new(settings);
    let mut terminal = setup_terminal()?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let reader = spawn_event_reader(event_tx);
    info!(model = %app.model, "chat started");

    let result = event_loop(&mut terminal, &mut app, &mut conversation, &mut event_rx).await;

    reader.abort();
    conversation.abort();
    restore_terminal(&mut terminal)?;
    info!(messages = app.transcript.len(), "chat ended");
    result
}

async fn event_loop(
    terminal: &mut ChatTerminal,
    app: &mut App,
    conversation: &mut ConversationHandle,
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
) -> Result<(), Box<dyn Error>> {
    let mut redraw = true;
    loop {
        if app.exit_requested {
            return Ok(());
        }
        if redraw {
            terminal.draw(|f| renderer::ui(f, app))?;
            redraw = false;
        }

        tokio::select! {
            Some(UiEvent::Crossterm(ev)) = event_rx.recv() => {
                let size = terminal.size()?;
                let area = Rect::new(0, 0, size.width, size.height);
                redraw = handle_terminal_event(app, conversation, ev, area);
            }
            Some(ev) = conversation.next_event() => {
                app.apply_event(ev);
                while let Some(ev) = conversation.try_next_event() {
                    app.apply_event(ev);
                }
                redraw = true;
            }
            else => {
                warn!("event sources closed");
                return Ok(());
            }
        }
    }
}

fn handle_terminal_event(
    app: &mut App,
    conversation: &ConversationHandle,
    ev: Event,
    area: Rect,
) -> bool {
    match ev {
        Event::Key(key) => {
            let action = classify_key(&key);
            apply_action(app, conversation, action, Some(key), area);
            action != KeyAction::Ignore
        }
        Event::Mouse(mouse) => {
            let action = classify_mouse(&mouse);
            apply_action(app, conversation, action, None, area);
            action != KeyAction::Ignore
        }
        Event::Paste(text) => {
            let text = sanitize_pasted_text(&text);
            if !text.is_empty() {
                app.textarea.insert_str(text);
            }
            true
        }
        Event::Resize(..) => true,
        _ => false,
    }
}

fn apply_action(
    app: &mut App,
    conversation: &ConversationHandle,
    action: KeyAction,
    key: Option<KeyEvent>,
    area: Rect,
) {
    let layout = renderer::layout(area, app);
    let height = usize::from(layout.transcript.height);
    let page = height.saturating_sub(1).max(1);
    let width = layout.transcript.width;

    match action {
        KeyAction::Quit => app.exit_requested = true,
        KeyAction::Submit => {
            if let Some(text) = app.take_submission() {
                debug!(chars = text.chars().count(), "submitting message");
                if !conversation.send(ConversationCommand::Submit(text)) {
                    app.error = Some("The conversation has stopped, please restart".to_string());
                }
                app.scroll_to_bottom();
            }
        }
        KeyAction::InsertNewline => app.textarea.insert_newline(),
        KeyAction::CycleTheme => app.cycle_theme(),
        KeyAction::CycleLanguage => {
            let language = app.cycle_language();
            conversation.send(ConversationCommand::SetLanguage(language));
        }
        KeyAction::ScrollUp(lines) => {
            let total = app.transcript_lines(width).len();
            app.scroll_up(lines, total, height);
        }
        KeyAction::ScrollDown(lines) => {
            let total = app.transcript_lines(width).len();
            app.scroll_down(lines, total, height);
        }
        KeyAction::PageUp => {
            let total = app.transcript_lines(width).len();
            app.scroll_up(page, total, height);
        }
        KeyAction::PageDown => {
            let total = app.transcript_lines(width).len();
            app.scroll_down(page, total, height);
        }
        KeyAction::ScrollToBottom => app.scroll_to_bottom(),
        KeyAction::Edit => {
            if let Some(key) = key {
                app.textarea.input(TAInput::from(key));
                app.hint = None;
            }
        }
        KeyAction::Ignore => {}
    }
}
