//! Markdown to styled terminal lines.
//!
//! Input is [`SanitizedText`] only, so nothing reaches the parser before the
//! sanitizer has seen it. Raw HTML that survives sanitization is shown as
//! literal text rather than interpreted.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use tracing::debug;
use unicode_width::UnicodeWidthStr;

use crate::core::sanitize::{is_script_url, strip_forbidden, SanitizedText};
use crate::ui::theme::Theme;
use crate::utils::syntax::highlight_code_block;

const QUOTE_BAR: &str = "│ ";
const RULE_WIDTH: usize = 24;

#[derive(Clone, Copy, Debug)]
enum ListKind {
    Unordered,
    Ordered(u64),
}

struct CodeBlock {
    lang: String,
    text: String,
}

pub struct MarkdownRenderer<'a> {
    theme: &'a Theme,
    syntax_highlighting: bool,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    style_stack: Vec<Style>,
    list_stack: Vec<ListKind>,
    indent_stack: Vec<usize>,
    pending_marker: Option<String>,
    quote_depth: usize,
    code_block: Option<CodeBlock>,
    links: Vec<(String, usize)>,
}

impl<'a> MarkdownRenderer<'a> {
    pub fn new(theme: &'a Theme, syntax_highlighting: bool) -> Self {
        Self {
            theme,
            syntax_highlighting,
            lines: Vec::new(),
            current: Vec::new(),
            style_stack: Vec::new(),
            list_stack: Vec::new(),
            indent_stack: Vec::new(),
            pending_marker: None,
            quote_depth: 0,
            code_block: None,
            links: Vec::new(),
        }
    }

    fn style(&self) -> Style {
        self.style_stack
            .last()
            .copied()
            .unwrap_or(self.theme.assistant_text_style)
    }

    fn push_style(&mut self, style: Style) {
        let merged = self.style().patch(style);
        self.style_stack.push(merged);
    }

    fn push_text(&mut self, text: &str, style: Style) {
        if !text.is_empty() {
            self.current.push(Span::styled(detab(text), style));
        }
    }

    fn prefix_spans(&mut self) -> Vec<Span<'static>> {
        let mut spans = Vec::new();
        if self.quote_depth > 0 {
            spans.push(Span::styled(
                QUOTE_BAR.repeat(self.quote_depth),
                self.theme.md_blockquote,
            ));
        }
        let indent: usize = self.indent_stack.iter().sum();
        match self.pending_marker.take() {
            Some(marker) => {
                let pad = indent.saturating_sub(marker.width());
                if pad > 0 {
                    spans.push(Span::raw(" ".repeat(pad)));
                }
                spans.push(Span::styled(marker, self.theme.md_list_marker));
            }
            None if indent > 0 => spans.push(Span::raw(" ".repeat(indent))),
            None => {}
        }
        spans
    }

    /// Close the line being built. Empty lines are only emitted when `force`.
    fn flush(&mut self, force: bool) {
        if self.current.is_empty() && self.pending_marker.is_none() && !force {
            return;
        }
        let mut spans = self.prefix_spans();
        spans.append(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    fn blank_line(&mut self) {
        if self.lines.last().is_some_and(|line| line.spans.is_empty()) || self.lines.is_empty() {
            return;
        }
        self.lines.push(Line::default());
    }

    fn finish_code_block(&mut self) {
        let Some(block) = self.code_block.take() else {
            return;
        };
        let code = block.text.strip_suffix('\n').unwrap_or(&block.text);
        let highlighted = if self.syntax_highlighting {
            highlight_code_block(&block.lang, code, self.theme)
        } else {
            None
        };
        let body = highlighted.unwrap_or_else(|| {
            let style = self.theme.md_codeblock_text_style();
            code.split('\n')
                .map(|line| Line::from(Span::styled(detab(line), style)))
                .collect()
        });
        for line in body {
            let mut spans = self.prefix_spans();
            spans.extend(line.spans);
            self.lines.push(Line::from(spans));
        }
        self.blank_line();
    }

    pub fn render(mut self, text: &SanitizedText) -> Vec<Line<'static>> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);

        for event in Parser::new_ext(text.as_str(), options) {
            match event {
                Event::Start(tag) => self.start(tag),
                Event::End(tag) => self.end(tag),
                Event::Text(content) => {
                    if let Some(block) = self.code_block.as_mut() {
                        block.text.push_str(&strip_forbidden(&content));
                    } else {
                        let style = self.style();
                        self.push_text(&content, style);
                    }
                }
                Event::Code(code) => {
                    let style = self.theme.md_inline_code;
                    self.push_text(&code, style);
                }
                Event::Html(raw) | Event::InlineHtml(raw) => {
                    if let Some(block) = self.code_block.as_mut() {
                        block.text.push_str(&strip_forbidden(&raw));
                        continue;
                    }
                    let style = self.style();
                    let mut parts = raw.split('\n').peekable();
                    while let Some(part) = parts.next() {
                        self.push_text(part, style);
                        if parts.peek().is_some_and(|next| !next.is_empty()) {
                            self.flush(false);
                        }
                    }
                }
                Event::SoftBreak => {
                    let style = self.style();
                    self.push_text(" ", style);
                }
                Event::HardBreak => self.flush(true),
                Event::Rule => {
                    self.flush(false);
                    self.current
                        .push(Span::styled("─".repeat(RULE_WIDTH), self.theme.md_rule));
                    self.flush(false);
                    self.blank_line();
                }
                Event::TaskListMarker(checked) => {
                    let marker = if checked { "[x] " } else { "[ ] " };
                    self.push_text(marker, self.theme.md_list_marker);
                }
                Event::FootnoteReference(name) => {
                    let style = self.theme.md_link;
                    self.push_text(&format!("[^{name}]"), style);
                }
                _ => {}
            }
        }
        self.flush(false);

        while self.lines.last().is_some_and(|line| line.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {}
            Tag::Heading { level, .. } => {
                self.flush(false);
                let style = self.theme.md_heading_style(level as usize);
                self.push_style(style);
            }
            Tag::BlockQuote(_) => {
                self.flush(false);
                self.quote_depth += 1;
                self.push_style(self.theme.md_blockquote);
            }
            Tag::List(start) => {
                self.flush(false);
                self.list_stack.push(match start {
                    Some(n) => ListKind::Ordered(n),
                    None => ListKind::Unordered,
                });
            }
            Tag::Item => {
                self.flush(false);
                let marker = match self.list_stack.last_mut() {
                    Some(ListKind::Ordered(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "- ".to_string(),
                };
                self.indent_stack.push(marker.width());
                self.pending_marker = Some(marker);
            }
            Tag::CodeBlock(kind) => {
                self.flush(false);
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => {
                        info.split_whitespace().next().unwrap_or_default().to_string()
                    }
                    CodeBlockKind::Indented => String::new(),
                };
                self.code_block = Some(CodeBlock {
                    lang,
                    text: String::new(),
                });
            }
            Tag::Emphasis => self.push_style(self.theme.md_emphasis),
            Tag::Strong => self.push_style(self.theme.md_strong),
            Tag::Strikethrough => self.push_style(
                Style::default().add_modifier(ratatui::style::Modifier::CROSSED_OUT),
            ),
            Tag::Link { dest_url, .. } | Tag::Image { dest_url, .. } => {
                self.push_style(self.theme.md_link);
                self.links.push((dest_url.to_string(), self.current.len()));
            }
            Tag::TableCell => {
                if !self.current.is_empty() {
                    self.push_text(" │ ", self.theme.md_rule);
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush(false);
                if self.list_stack.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Heading(_) => {
                self.flush(false);
                self.style_stack.pop();
                self.blank_line();
            }
            TagEnd::BlockQuote(_) => {
                self.flush(false);
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.style_stack.pop();
                self.blank_line();
            }
            TagEnd::List(_) => {
                self.flush(false);
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Item => {
                self.flush(false);
                self.indent_stack.pop();
                self.pending_marker = None;
            }
            TagEnd::CodeBlock => self.finish_code_block(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.style_stack.pop();
            }
            TagEnd::Link | TagEnd::Image => {
                self.style_stack.pop();
                if let Some((url, start)) = self.links.pop() {
                    let label: String = self.current[start.min(self.current.len())..]
                        .iter()
                        .map(|span| span.content.as_ref())
                        .collect();
                    if is_script_url(&url) {
                        debug!("dropping script link target");
                    } else if !url.is_empty() && label != url {
                        self.push_text(&format!(" ({url})"), self.theme.md_blockquote);
                    }
                }
            }
            TagEnd::HtmlBlock => {
                self.flush(false);
                self.blank_line();
            }
            TagEnd::TableHead | TagEnd::TableRow => self.flush(false),
            TagEnd::Table => self.blank_line(),
            _ => {}
        }
    }
}

/// Entity decoding happens inside the parser, so control characters are
/// filtered again on the way out.
fn detab(text: &str) -> String {
    strip_forbidden(text).replace('\t', "    ")
}

/// Render assistant text as markdown.
pub fn render_markdown(
    text: &SanitizedText,
    theme: &Theme,
    syntax_highlighting: bool,
) -> Vec<Line<'static>> {
    MarkdownRenderer::new(theme, syntax_highlighting).render(text)
}

/// Render text verbatim, one terminal line per source line.
pub fn render_plain(text: &SanitizedText, style: Style) -> Vec<Line<'static>> {
    text.as_str()
        .split('\n')
        .map(|line| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            Line::from(Span::styled(detab(line), style))
        })
        .collect()
}

/// Plain-text lines for non-interactive output.
pub fn to_plain_lines(lines: &[Line<'_>]) -> Vec<String> {
    lines
        .iter()
        .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sanitize::sanitize;

    fn render(markdown: &str) -> Vec<String> {
        let theme = Theme::light();
        to_plain_lines(&render_markdown(&sanitize(markdown), &theme, false))
    }

    #[test]
    fn headings_and_paragraphs_are_separated() {
        assert_eq!(
            render("# Title\n\nFirst paragraph\nstill first.\n\nSecond."),
            vec!["Title", "", "First paragraph still first.", "", "Second."]
        );
    }

    #[test]
    fn strong_text_is_styled_not_marked_up() {
        let theme = Theme::dark();
        let lines = render_markdown(&sanitize("say **hi**"), &theme, false);
        assert_eq!(to_plain_lines(&lines), vec!["say hi"]);
        let bold = &lines[0].spans[1];
        assert!(bold.style.add_modifier.contains(ratatui::style::Modifier::BOLD));
    }

    #[test]
    fn lists_get_markers_and_nested_indent() {
        assert_eq!(
            render("- one\n- two\n  - inner"),
            vec!["- one", "- two", "  - inner"]
        );
        assert_eq!(render("1. first\n2. second"), vec!["1. first", "2. second"]);
    }

    #[test]
    fn code_blocks_keep_lines_verbatim() {
        let theme = Theme::light();
        let lines = render_markdown(
            &sanitize("```rust\nfn main() {\n\tlet x = 1;\n}\n```"),
            &theme,
            false,
        );
        assert_eq!(
            to_plain_lines(&lines),
            vec!["fn main() {", "    let x = 1;", "}"]
        );
        assert_eq!(lines[0].spans[0].style, theme.md_codeblock_text_style());
    }

    #[test]
    fn highlighted_code_blocks_keep_text() {
        let theme = Theme::dark();
        let lines = render_markdown(&sanitize("```py\nprint('x')\n```"), &theme, true);
        assert_eq!(to_plain_lines(&lines), vec!["print('x')"]);
    }

    #[test]
    fn surviving_html_is_shown_literally() {
        assert_eq!(render("Use Vec<String> here"), vec!["Use Vec<String> here"]);
    }

    #[test]
    fn script_never_reaches_the_output() {
        let lines = render("Hi<script>alert('x')</script> there");
        assert_eq!(lines, vec!["Hi there"]);
    }

    #[test]
    fn links_show_their_target() {
        assert_eq!(
            render("see [docs](https://example.com/docs)"),
            vec!["see docs (https://example.com/docs)"]
        );
        assert_eq!(render("<https://example.com>"), vec!["https://example.com"]);
    }

    #[test]
    fn character_references_cannot_smuggle_escapes() {
        let lines = render("Hello &#27;[2J&#x1b;]52;c;ZXZpbA==&#7; done");
        assert_eq!(lines, vec!["Hello [2J]52;c;ZXZpbA== done"]);

        let lines = render("```\n&#27;[31mred\n```");
        assert_eq!(lines, vec!["[31mred"]);
    }

    #[test]
    fn script_link_targets_are_not_printed() {
        assert_eq!(render("[x](java&#9;script:go)"), vec!["x"]);
        let lines = render("[x](&#106;avascript:alert(1))");
        assert!(lines.iter().all(|line| !line.to_ascii_lowercase().contains("javascript")));
    }

    #[test]
    fn blockquotes_are_prefixed() {
        assert_eq!(render("> quoted\n\nafter"), vec!["│ quoted", "", "after"]);
    }

    #[test]
    fn plain_rendering_keeps_markup_characters() {
        let lines = render_plain(&sanitize("**not bold**\r\nline two"), Style::default());
        assert_eq!(to_plain_lines(&lines), vec!["**not bold**", "line two"]);
    }
}
