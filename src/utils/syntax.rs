use crate::ui::theme::Theme;
use ratatui::style::Color as TuiColor;
use ratatui::text::{Line, Span};
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, OnceLock};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

const CACHE_CAPACITY: usize = 64;

type CacheKey = (String, u64);

// Bounded FIFO cache of highlighted blocks.
struct SimpleCache {
    map: HashMap<CacheKey, Vec<Line<'static>>>,
    order: VecDeque<CacheKey>,
    cap: usize,
}

impl SimpleCache {
    fn new(cap: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            cap,
        }
    }

    fn get(&self, key: &CacheKey) -> Option<Vec<Line<'static>>> {
        self.map.get(key).cloned()
    }

    fn put(&mut self, key: CacheKey, value: Vec<Line<'static>>) {
        if !self.map.contains_key(&key) {
            self.order.push_back(key.clone());
        }
        self.map.insert(key, value);
        while self.map.len() > self.cap {
            let Some(old) = self.order.pop_front() else {
                break;
            };
            self.map.remove(&old);
        }
    }
}

static SYNTAX_CACHE: Mutex<Option<SimpleCache>> = Mutex::new(None);

fn with_cache<R>(f: impl FnOnce(&mut SimpleCache) -> R) -> R {
    let mut guard = SYNTAX_CACHE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    f(guard.get_or_insert_with(|| SimpleCache::new(CACHE_CAPACITY)))
}

fn hash_code(lang: &str, code: &str, theme_sig: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    lang.hash(&mut hasher);
    code.hash(&mut hasher);
    theme_sig.hash(&mut hasher);
    hasher.finish()
}

fn is_dark_background(c: &TuiColor) -> bool {
    match c {
        TuiColor::Rgb(r, g, b) => {
            let br = 0.2126 * (*r as f32) + 0.7152 * (*g as f32) + 0.0722 * (*b as f32);
            br < 128.0
        }
        TuiColor::White => false,
        _ => true,
    }
}

fn normalize_lang_hint(s: &str) -> String {
    let t = s.trim().to_ascii_lowercase();
    match t.as_str() {
        "py" | "python" => "python".into(),
        "bash" | "sh" | "zsh" | "shell" => "bash".into(),
        "js" | "javascript" | "jsx" => "javascript".into(),
        "ts" | "tsx" | "typescript" => "typescript".into(),
        "yaml" | "yml" => "yaml".into(),
        "rust" | "rs" => "rust".into(),
        "c" | "h" => "c".into(),
        "cpp" | "cc" | "cxx" | "hpp" | "hxx" => "cpp".into(),
        "kotlin" | "kt" => "kotlin".into(),
        other => other.into(),
    }
}

pub(crate) fn pick_syntect_theme_name(theme: &Theme) -> &'static str {
    if is_dark_background(&theme.background_color) {
        "base16-ocean.dark"
    } else {
        "InspiredGitHub"
    }
}

fn theme_signature(theme: &Theme, chosen: &str) -> String {
    format!(
        "{chosen}|{:?}|{:?}",
        theme.md_codeblock_bg_color(),
        theme.background_color
    )
}

/// Highlight a fenced block. `None` when no highlighter theme is available
/// or a line fails to highlight; callers fall back to plain styling.
pub fn highlight_code_block(
    lang_hint: &str,
    code: &str,
    theme: &Theme,
) -> Option<Vec<Line<'static>>> {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();
    let ps = SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines);
    let ts = THEME_SET.get_or_init(ThemeSet::load_defaults);

    let lang_norm = normalize_lang_hint(lang_hint);
    let theme_name = pick_syntect_theme_name(theme);
    let syn_theme = ts
        .themes
        .get(theme_name)
        .or_else(|| ts.themes.get("base16-ocean.light"))?;

    let key = (
        lang_norm.clone(),
        hash_code(&lang_norm, code, &theme_signature(theme, theme_name)),
    );
    if let Some(lines) = with_cache(|cache| cache.get(&key)) {
        return Some(lines);
    }

    let syntax = ps
        .find_syntax_by_token(&lang_norm)
        .unwrap_or_else(|| ps.find_syntax_plain_text());
    let mut highlighter = HighlightLines::new(syntax, syn_theme);
    let bg = theme.md_codeblock_bg_color();

    let mut out: Vec<Line<'static>> = Vec::new();
    for line in LinesWithEndings::from(code) {
        let ranges = highlighter.highlight_line(line, ps).ok()?;
        let spans: Vec<Span<'static>> = ranges
            .into_iter()
            .map(|(style, text)| {
                let frag = text.strip_suffix('\n').unwrap_or(text);
                let frag = frag.strip_suffix('\r').unwrap_or(frag);
                let fg = style.foreground;
                let mut st = ratatui::style::Style::default().fg(TuiColor::Rgb(fg.r, fg.g, fg.b));
                if let Some(bgcol) = bg {
                    st = st.bg(bgcol);
                }
                Span::styled(frag.to_string(), st)
            })
            .filter(|span| !span.content.is_empty())
            .collect();
        out.push(Line::from(spans));
    }

    with_cache(|cache| cache.put(key, out.clone()));
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    #[test]
    fn normalize_lang_hint_maps_common_aliases() {
        assert_eq!(normalize_lang_hint("py"), "python");
        assert_eq!(normalize_lang_hint("JS"), "javascript");
        assert_eq!(normalize_lang_hint("yml"), "yaml");
        assert_eq!(normalize_lang_hint("rs"), "rust");
        assert_eq!(normalize_lang_hint("elixir"), "elixir");
    }

    #[test]
    fn dark_background_heuristic_basic() {
        assert!(is_dark_background(&Color::Black));
        assert!(!is_dark_background(&Color::White));
        assert!(is_dark_background(&Color::Rgb(10, 10, 10)));
        assert!(!is_dark_background(&Color::Rgb(240, 240, 240)));
    }

    #[test]
    fn highlighter_theme_follows_background() {
        assert_eq!(pick_syntect_theme_name(&Theme::dark()), "base16-ocean.dark");
        assert_eq!(pick_syntect_theme_name(&Theme::light()), "InspiredGitHub");
    }

    #[test]
    fn highlighted_block_keeps_one_line_per_source_line() {
        let lines = highlight_code_block("rs", "fn main() {\n    let x = 1;\n}\n", &Theme::dark())
            .expect("highlighting");
        assert_eq!(lines.len(), 3);
        let first: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(first, "fn main() {");
    }
}
