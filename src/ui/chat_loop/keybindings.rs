//! Maps raw key and mouse events to chat screen actions.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};

pub const WHEEL_STEP: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Submit,
    InsertNewline,
    CycleTheme,
    CycleLanguage,
    ScrollUp(usize),
    ScrollDown(usize),
    PageUp,
    PageDown,
    ScrollToBottom,
    /// Forward to the text field.
    Edit,
    Ignore,
}

pub fn classify_key(key: &KeyEvent) -> KeyAction {
    if key.kind == KeyEventKind::Release {
        return KeyAction::Ignore;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);

    match key.code {
        KeyCode::Char('c') | KeyCode::Char('d') if ctrl => KeyAction::Quit,
        KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char('t') if ctrl => KeyAction::CycleTheme,
        KeyCode::Char('l') if ctrl => KeyAction::CycleLanguage,
        KeyCode::Enter if alt || shift => KeyAction::InsertNewline,
        KeyCode::Char('j') if ctrl => KeyAction::InsertNewline,
        KeyCode::Enter => KeyAction::Submit,
        KeyCode::Up => KeyAction::ScrollUp(1),
        KeyCode::Down => KeyAction::ScrollDown(1),
        KeyCode::PageUp => KeyAction::PageUp,
        KeyCode::PageDown => KeyAction::PageDown,
        KeyCode::End if ctrl => KeyAction::ScrollToBottom,
        _ => KeyAction::Edit,
    }
}

pub fn classify_mouse(event: &MouseEvent) -> KeyAction {
    match event.kind {
        MouseEventKind::ScrollUp => KeyAction::ScrollUp(WHEEL_STEP),
        MouseEventKind::ScrollDown => KeyAction::ScrollDown(WHEEL_STEP),
        _ => KeyAction::Ignore,
    }
}

/// Normalize pasted text before it reaches the text field.
pub(crate) fn sanitize_pasted_text(text: &str) -> String {
    let without_crlf = text.replace("\r\n", "\n");
    let without_cr = without_crlf.replace('\r', "\n");
    let expanded_tabs = without_cr.replace('\t', "    ");
    expanded_tabs
        .chars()
        .filter(|&c| c == '\n' || !c.is_control())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::{KeyEventState, MouseButton};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn global_shortcuts() {
        assert_eq!(classify_key(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)), KeyAction::Quit);
        assert_eq!(classify_key(&key(KeyCode::Esc, KeyModifiers::NONE)), KeyAction::Quit);
        assert_eq!(
            classify_key(&key(KeyCode::Char('t'), KeyModifiers::CONTROL)),
            KeyAction::CycleTheme
        );
        assert_eq!(
            classify_key(&key(KeyCode::Char('l'), KeyModifiers::CONTROL)),
            KeyAction::CycleLanguage
        );
    }

    #[test]
    fn enter_submits_and_modified_enter_breaks_lines() {
        assert_eq!(classify_key(&key(KeyCode::Enter, KeyModifiers::NONE)), KeyAction::Submit);
        assert_eq!(
            classify_key(&key(KeyCode::Enter, KeyModifiers::ALT)),
            KeyAction::InsertNewline
        );
    }

    #[test]
    fn plain_characters_are_edits() {
        assert_eq!(classify_key(&key(KeyCode::Char('t'), KeyModifiers::NONE)), KeyAction::Edit);
        assert_eq!(classify_key(&key(KeyCode::Backspace, KeyModifiers::NONE)), KeyAction::Edit);
    }

    #[test]
    fn releases_are_ignored() {
        let mut release = key(KeyCode::Enter, KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(classify_key(&release), KeyAction::Ignore);
    }

    #[test]
    fn wheel_scrolls_the_transcript() {
        let wheel = |kind| MouseEvent {
            kind,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(
            classify_mouse(&wheel(MouseEventKind::ScrollUp)),
            KeyAction::ScrollUp(WHEEL_STEP)
        );
        assert_eq!(
            classify_mouse(&wheel(MouseEventKind::Down(MouseButton::Left))),
            KeyAction::Ignore
        );
    }

    #[test]
    fn pasted_text_is_normalized() {
        assert_eq!(sanitize_pasted_text("a\r\nb\rc\td\u{1b}"), "a\nb\nc    d");
    }
}
