//! Removes active content from untrusted text before anything interprets it.
//!
//! Operates on raw text only. The markdown renderer accepts nothing but
//! [`SanitizedText`], which this module is the only producer of, so parsing
//! can never happen ahead of sanitization.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Elements removed together with everything they enclose.
const ACTIVE_ELEMENTS: &str =
    "script|style|iframe|frameset|frame|object|embed|applet|noscript|template|svg|math";

/// Elements whose bare tags are removed wherever they appear.
const FORM_ELEMENTS: &str = "meta|link|base|form|input|button|textarea|select";

static ACTIVE_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)<\s*({ACTIVE_ELEMENTS})\b[^>]*>"))
        .expect("active element pattern is valid")
});

static ACTIVE_CLOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)<\s*/\s*({ACTIVE_ELEMENTS})\s*>"))
        .expect("active close pattern is valid")
});

static STRAY_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)<\s*/?\s*(?:{ACTIVE_ELEMENTS}|{FORM_ELEMENTS})\b[^>]*>"
    ))
    .expect("stray tag pattern is valid")
});

static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[A-Za-z][^<>]*>").expect("tag pattern is valid"));

static HANDLER_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)[\s/]+(?:on[a-z]+|srcdoc|formaction)\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]*)"#)
        .expect("handler attribute pattern is valid")
});

static SCRIPT_SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    let colon = entity_tolerant(":");
    Regex::new(&format!(
        r"(?i)(?:{java}|{vb}){script}\s*{colon}|{data}\s*{colon}\s*{html_type}",
        java = entity_tolerant("java"),
        vb = entity_tolerant("vb"),
        script = entity_tolerant("script"),
        data = entity_tolerant("data"),
        html_type = entity_tolerant("text/html"),
    ))
    .expect("script scheme pattern is valid")
});

static NUMERIC_ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&#(?:[xX]([0-9a-fA-F]{1,8})|([0-9]{1,10}));?")
        .expect("numeric entity pattern is valid")
});

/// Pattern matching `word` where any character may also be spelled as a
/// decimal or hex character reference, since markdown decodes those.
fn entity_tolerant(word: &str) -> String {
    word.chars()
        .map(|c| {
            let mut codes = vec![u32::from(c.to_ascii_lowercase())];
            if c.to_ascii_uppercase() != c.to_ascii_lowercase() {
                codes.push(u32::from(c.to_ascii_uppercase()));
            }
            let mut alts = vec![regex::escape(&c.to_string())];
            for code in codes {
                alts.push(format!("&#0*{code};?"));
                alts.push(format!("&#[xX]0*{code:x};?"));
            }
            format!("(?:{})", alts.join("|"))
        })
        .collect()
}

/// Text that has been through [`sanitize`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SanitizedText(String);

impl SanitizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for SanitizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SanitizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip active markup and terminal control sequences from `raw`.
///
/// Passes repeat until nothing changes, so removing one fragment can never
/// splice together a new one, and sanitizing twice equals sanitizing once.
/// Text without markup or control characters comes back byte-for-byte.
pub fn sanitize(raw: &str) -> SanitizedText {
    if is_inert(raw) {
        return SanitizedText(raw.to_string());
    }

    let mut current = sanitize_pass(raw);
    loop {
        let next = sanitize_pass(&current);
        if next == current {
            return SanitizedText(current);
        }
        current = next;
    }
}

fn is_inert(text: &str) -> bool {
    !text.contains('<')
        && !text.contains(':')
        && !text.contains('&')
        && !text.chars().any(is_forbidden_char)
}

fn sanitize_pass(text: &str) -> String {
    let mut text = strip_comments(text);
    loop {
        let next = strip_active_elements(&text);
        if next == text {
            break;
        }
        text = next;
    }
    let text = STRAY_TAG.replace_all(&text, "");
    let text = ANY_TAG.replace_all(&text, |caps: &regex::Captures| {
        HANDLER_ATTR.replace_all(&caps[0], "").into_owned()
    });
    let text = SCRIPT_SCHEME.replace_all(&text, "");
    let text = NUMERIC_ENTITY.replace_all(&text, |caps: &regex::Captures| {
        if decodes_to_forbidden(caps) {
            String::new()
        } else {
            caps[0].to_string()
        }
    });
    strip_forbidden(&text)
}

/// Character references are decoded by the markdown parser, so one naming a
/// control character is as dangerous as the character itself.
fn decodes_to_forbidden(caps: &regex::Captures) -> bool {
    let code = match (caps.get(1), caps.get(2)) {
        (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
        (None, Some(dec)) => dec.as_str().parse::<u32>().ok(),
        (None, None) => None,
    };
    code.and_then(char::from_u32)
        .is_some_and(|c| c == '\0' || is_forbidden_char(c))
}

pub(crate) fn strip_forbidden(text: &str) -> String {
    text.chars().filter(|c| !is_forbidden_char(*c)).collect()
}

/// True when `url` uses a scheme that runs code when followed.
pub(crate) fn is_script_url(url: &str) -> bool {
    let compact: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();
    SCRIPT_SCHEME.is_match(&compact)
}

/// Control characters other than line breaks and tabs drive the terminal
/// (escape sequences, OSC payloads); bidi overrides reorder what is shown.
pub(crate) fn is_forbidden_char(c: char) -> bool {
    (c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
        || matches!(c, '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}')
}

fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("<!--") {
        out.push_str(&rest[..start]);
        match rest[start + 4..].find("-->") {
            Some(end) => rest = &rest[start + 4 + end + 3..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Remove each active element from its opening tag through the matching
/// closing tag. An element that is never closed swallows the remainder.
fn strip_active_elements(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let Some(caps) = ACTIVE_OPEN.captures(rest) else {
            out.push_str(rest);
            return out;
        };
        let (Some(open), Some(name)) = (caps.get(0), caps.get(1)) else {
            out.push_str(rest);
            return out;
        };
        out.push_str(&rest[..open.start()]);

        let after = &rest[open.end()..];
        let close_end = ACTIVE_CLOSE
            .captures_iter(after)
            .find(|close| {
                close
                    .get(1)
                    .is_some_and(|n| n.as_str().eq_ignore_ascii_case(name.as_str()))
            })
            .and_then(|close| close.get(0))
            .map(|m| m.end());

        match close_end {
            Some(end) => rest = &after[end..],
            None => return out,
        }
    }
}
