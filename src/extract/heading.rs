//! Code and definition parsing from the page heading or title

use crate::codec::{Code, CODE_PATTERN};
use crate::extract::dom::{collapse_whitespace, DomNode};
use regex::Regex;
use std::sync::OnceLock;

/// Characters trimmed from the edges of a definition
const DEFINITION_EDGES: &[char] = &[' ', '–', '-', ':', '|'];

fn heading_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"(?i)^({})\s*[–-]\s*(.+)$", CODE_PATTERN))
            .expect("heading pattern is valid")
    })
}

/// Regex matching a standalone code token anywhere in a text
pub fn code_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"(?i)\b{}\b", CODE_PATTERN)).expect("token pattern is valid")
    })
}

fn clean_definition(text: &str) -> Option<String> {
    let cleaned = collapse_whitespace(text);
    let cleaned = cleaned.trim_matches(DEFINITION_EDGES);
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Parses a primary heading text such as `P0300-00 – Random Misfire Detected`
///
/// Tries `{Code} – {definition}` (en-dash or hyphen) first, then a heading
/// whose first token is a code.
pub fn parse_heading_text(text: &str) -> Option<(Code, Option<String>)> {
    let text = collapse_whitespace(text);

    if let Some(caps) = heading_regex().captures(&text) {
        if let Ok(code) = Code::parse(&caps[1]) {
            return Some((code, clean_definition(&caps[2])));
        }
    }

    let first = text.split_whitespace().next()?;
    let code = Code::parse(first).ok()?;
    Some((code, clean_definition(&text[first.len()..])))
}

/// Finds a code embedded anywhere in a title; the rest of the title is the definition
pub fn parse_title_text(text: &str) -> Option<(Code, Option<String>)> {
    let text = collapse_whitespace(text);
    let found = code_token_regex().find(&text)?;
    let code = Code::parse(found.as_str()).ok()?;

    let remainder = format!("{} {}", &text[..found.start()], &text[found.end()..]);
    Some((code, clean_definition(&remainder)))
}

/// Locates the code and definition of a detail page
///
/// The first `h1` wins; the document `title` is the fallback. Returns `None`
/// when neither carries a code, leaving the caller to derive one from the URL.
pub fn find_code_and_definition<N: DomNode>(root: &N) -> Option<(Code, Option<String>)> {
    if let Some(h1) = root.descendants_with_tag(&["h1"]).first() {
        if let Some(found) = parse_heading_text(&h1.collapsed_text()) {
            return Some(found);
        }
    }

    root.descendants_with_tag(&["title"])
        .first()
        .and_then(|title| parse_title_text(&title.collapsed_text()))
}
