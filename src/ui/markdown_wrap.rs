use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

enum Piece {
    Word(Vec<(String, Style)>, usize),
    Space(String, Style, usize),
}

/// Split spans into words and whitespace runs. A word keeps every styled
/// fragment it is made of, so `**bold**,` stays on one line.
fn pieces(line: &Line<'static>) -> Vec<Piece> {
    let mut out: Vec<Piece> = Vec::new();
    for span in &line.spans {
        let style = line.style.patch(span.style);
        let mut rest = span.content.as_ref();
        while let Some(first) = rest.chars().next() {
            let is_space = first.is_whitespace();
            let end = rest
                .char_indices()
                .find(|(_, c)| c.is_whitespace() != is_space)
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            let (chunk, tail) = rest.split_at(end);
            let width = UnicodeWidthStr::width(chunk);
            if is_space {
                out.push(Piece::Space(chunk.to_string(), style, width));
            } else if let Some(Piece::Word(parts, total)) = out.last_mut() {
                parts.push((chunk.to_string(), style));
                *total += width;
            } else {
                out.push(Piece::Word(vec![(chunk.to_string(), style)], width));
            }
            rest = tail;
        }
    }
    out
}

struct LineBuilder {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    width: usize,
    alignment: Option<ratatui::layout::Alignment>,
}

impl LineBuilder {
    fn flush(&mut self) {
        while self
            .current
            .last()
            .is_some_and(|span| span.content.trim().is_empty())
        {
            self.current.pop();
        }
        let mut line = Line::from(std::mem::take(&mut self.current));
        line.alignment = self.alignment;
        self.lines.push(line);
        self.width = 0;
    }

    fn push(&mut self, text: String, style: Style, width: usize) {
        self.current.push(Span::styled(text, style));
        self.width += width;
    }
}

/// Wrap one styled line at word boundaries to `max_width` display columns.
///
/// Indentation on the first line is kept; whitespace at wrap points is
/// dropped. Words wider than the whole line are broken by character.
pub(crate) fn wrap_line(line: &Line<'static>, max_width: usize) -> Vec<Line<'static>> {
    if max_width == 0 || line.width() <= max_width {
        return vec![line.clone()];
    }

    let mut builder = LineBuilder {
        lines: Vec::new(),
        current: Vec::new(),
        width: 0,
        alignment: line.alignment,
    };

    for piece in pieces(line) {
        match piece {
            Piece::Space(text, style, width) => {
                if builder.width == 0 && !builder.lines.is_empty() {
                    continue;
                }
                if builder.width + width <= max_width {
                    builder.push(text, style, width);
                } else {
                    builder.flush();
                }
            }
            Piece::Word(parts, width) => {
                if builder.width + width <= max_width {
                    for (text, style) in parts {
                        let w = UnicodeWidthStr::width(text.as_str());
                        builder.push(text, style, w);
                    }
                    continue;
                }
                if width <= max_width {
                    builder.flush();
                    for (text, style) in parts {
                        let w = UnicodeWidthStr::width(text.as_str());
                        builder.push(text, style, w);
                    }
                    continue;
                }
                for (text, style) in parts {
                    let mut chunk = String::new();
                    let mut chunk_width = 0;
                    for ch in text.chars() {
                        let cw = ch.width().unwrap_or(0);
                        if builder.width + chunk_width + cw > max_width {
                            if !chunk.is_empty() {
                                builder.push(std::mem::take(&mut chunk), style, chunk_width);
                                chunk_width = 0;
                            }
                            builder.flush();
                        }
                        chunk.push(ch);
                        chunk_width += cw;
                    }
                    if !chunk.is_empty() {
                        builder.push(chunk, style, chunk_width);
                    }
                }
            }
        }
    }

    if !builder.current.is_empty() || builder.lines.is_empty() {
        builder.flush();
    }
    builder.lines
}

pub(crate) fn wrap_lines(lines: &[Line<'static>], max_width: usize) -> Vec<Line<'static>> {
    lines
        .iter()
        .flat_map(|line| wrap_line(line, max_width))
        .collect()
}
