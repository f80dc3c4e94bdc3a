use ratatui::style::{Color, Modifier, Style};

use crate::core::preferences::ThemeKind;

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub kind: ThemeKind,
    // Overall background color to paint the full frame
    pub background_color: Color,

    // Transcript
    pub user_text_style: Style,
    pub assistant_text_style: Style,
    pub label_style: Style,

    // Chrome
    pub title_style: Style,
    pub status_style: Style,
    pub error_style: Style,
    pub input_border_style: Style,
    pub input_title_style: Style,

    // Input area
    pub input_text_style: Style,
    pub input_cursor_style: Style,

    // Markdown
    pub md_heading: [Style; 3],
    pub md_emphasis: Style,
    pub md_strong: Style,
    pub md_inline_code: Style,
    pub md_codeblock_text: Style,
    pub md_codeblock_bg: Option<Color>,
    pub md_link: Style,
    pub md_blockquote: Style,
    pub md_list_marker: Style,
    pub md_rule: Style,
}

impl Theme {
    /// Every kind maps to exactly one palette.
    pub fn for_kind(kind: ThemeKind) -> Self {
        match kind {
            ThemeKind::Light => Self::light(),
            ThemeKind::Dark => Self::dark(),
        }
    }

    pub fn light() -> Self {
        let text = Color::Rgb(0x1f, 0x23, 0x28);
        let muted = Color::Rgb(0x65, 0x6d, 0x76);
        let accent = Color::Rgb(0x09, 0x69, 0xda);
        Theme {
            kind: ThemeKind::Light,
            background_color: Color::Rgb(0xff, 0xff, 0xff),

            user_text_style: Style::default().fg(accent),
            assistant_text_style: Style::default().fg(text),
            label_style: Style::default().fg(muted).add_modifier(Modifier::ITALIC),

            title_style: Style::default().fg(text).add_modifier(Modifier::BOLD),
            status_style: Style::default().fg(muted),
            error_style: Style::default()
                .fg(Color::Rgb(0xcf, 0x22, 0x2e))
                .add_modifier(Modifier::BOLD),
            input_border_style: Style::default().fg(muted),
            input_title_style: Style::default().fg(muted),

            input_text_style: Style::default().fg(text),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),

            md_heading: [
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
                Style::default().fg(text).add_modifier(Modifier::BOLD),
                Style::default()
                    .fg(text)
                    .add_modifier(Modifier::BOLD | Modifier::ITALIC),
            ],
            md_emphasis: Style::default().add_modifier(Modifier::ITALIC),
            md_strong: Style::default().add_modifier(Modifier::BOLD),
            md_inline_code: Style::default()
                .fg(Color::Rgb(0x95, 0x38, 0x00))
                .bg(Color::Rgb(0xef, 0xf1, 0xf3)),
            md_codeblock_text: Style::default().fg(text),
            md_codeblock_bg: Some(Color::Rgb(0xf6, 0xf8, 0xfa)),
            md_link: Style::default()
                .fg(accent)
                .add_modifier(Modifier::UNDERLINED),
            md_blockquote: Style::default().fg(muted),
            md_list_marker: Style::default().fg(accent),
            md_rule: Style::default().fg(muted),
        }
    }

    pub fn dark() -> Self {
        let text = Color::Rgb(0xe6, 0xed, 0xf3);
        let muted = Color::Rgb(0x8b, 0x94, 0x9e);
        let accent = Color::Rgb(0x58, 0xa6, 0xff);
        Theme {
            kind: ThemeKind::Dark,
            background_color: Color::Rgb(0x0d, 0x11, 0x17),

            user_text_style: Style::default().fg(accent),
            assistant_text_style: Style::default().fg(text),
            label_style: Style::default().fg(muted).add_modifier(Modifier::ITALIC),

            title_style: Style::default().fg(text).add_modifier(Modifier::BOLD),
            status_style: Style::default().fg(muted),
            error_style: Style::default()
                .fg(Color::Rgb(0xff, 0x7b, 0x72))
                .add_modifier(Modifier::BOLD),
            input_border_style: Style::default().fg(muted),
            input_title_style: Style::default().fg(muted),

            input_text_style: Style::default().fg(text),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),

            md_heading: [
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
                Style::default().fg(text).add_modifier(Modifier::BOLD),
                Style::default()
                    .fg(text)
                    .add_modifier(Modifier::BOLD | Modifier::ITALIC),
            ],
            md_emphasis: Style::default().add_modifier(Modifier::ITALIC),
            md_strong: Style::default().add_modifier(Modifier::BOLD),
            md_inline_code: Style::default()
                .fg(Color::Rgb(0xff, 0xa6, 0x57))
                .bg(Color::Rgb(0x16, 0x1b, 0x22)),
            md_codeblock_text: Style::default().fg(text),
            md_codeblock_bg: Some(Color::Rgb(0x16, 0x1b, 0x22)),
            md_link: Style::default()
                .fg(accent)
                .add_modifier(Modifier::UNDERLINED),
            md_blockquote: Style::default().fg(muted),
            md_list_marker: Style::default().fg(accent),
            md_rule: Style::default().fg(muted),
        }
    }

    pub fn md_heading_style(&self, level: usize) -> Style {
        let index = level.saturating_sub(1).min(self.md_heading.len() - 1);
        self.md_heading[index]
    }

    pub fn md_codeblock_bg_color(&self) -> Option<Color> {
        self.md_codeblock_bg
    }

    pub fn md_codeblock_text_style(&self) -> Style {
        match self.md_codeblock_bg {
            Some(bg) => self.md_codeblock_text.bg(bg),
            None => self.md_codeblock_text,
        }
    }

    /// Base style painted under every widget.
    pub fn base_style(&self) -> Style {
        Style::default()
            .bg(self.background_color)
            .fg(self.assistant_text_style.fg.unwrap_or(Color::Reset))
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::for_kind(ThemeKind::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_distinct_palette() {
        for kind in ThemeKind::ALL {
            assert_eq!(Theme::for_kind(kind).kind, kind);
        }
        assert_ne!(
            Theme::for_kind(ThemeKind::Light).background_color,
            Theme::for_kind(ThemeKind::Dark).background_color
        );
    }

    #[test]
    fn heading_levels_clamp_to_available_styles() {
        let theme = Theme::dark();
        assert_eq!(theme.md_heading_style(1), theme.md_heading[0]);
        assert_eq!(theme.md_heading_style(6), theme.md_heading[2]);
        assert_eq!(theme.md_heading_style(0), theme.md_heading[0]);
    }
}
