//! Detection-hint text grammar.
//!
//! Captions carry detector context as a textual suffix:
//! `"a dog runs (Detected: dog: 2, person: 1)"`. The suffix grammar is
//! comma-separated `class[: count]` tokens. This module is the only place
//! that formats or parses that suffix, so downstream aggregation never
//! touches the raw text.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

/// Matches a trailing `"(Detected: ...)"` suffix.
static HINT_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(Detected:\s*(.*?)\)\s*$").expect("valid hint regex"));

/// Format per-class counts as `"class1: n1, class2: n2"`.
///
/// Classes iterate in sorted order (the map is a BTreeMap), so the same
/// counts always produce the same string.
pub fn format_hint(counts: &BTreeMap<String, u32>) -> String {
    counts
        .iter()
        .map(|(class, count)| format!("{}: {}", class, count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Append a detection hint to a caption: `"<caption> (Detected: <hint>)"`.
///
/// An empty hint returns the caption unchanged.
pub fn attach_hint(caption: &str, hint: &str) -> String {
    if hint.is_empty() {
        caption.to_string()
    } else {
        format!("{} (Detected: {})", caption, hint)
    }
}

/// Strip a trailing `"(Detected: ...)"` suffix and parse its tokens.
///
/// Returns the clean caption text and the parsed `(class, count)` entries.
/// Tokens are comma-separated `class[: count]`; a bare class or a
/// malformed count parses as count = 1. Text without the suffix comes
/// back unchanged with no entries.
pub fn parse_hint_suffix(text: &str) -> (String, Vec<(String, u32)>) {
    let Some(captures) = HINT_SUFFIX.captures(text) else {
        return (text.to_string(), Vec::new());
    };

    let whole = captures.get(0).expect("match exists");
    let clean = text[..whole.start()].to_string();
    let body = captures.get(1).map(|m| m.as_str()).unwrap_or("");

    let mut entries = Vec::new();
    for token in body.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match token.split_once(':') {
            Some((class, count)) => {
                let class = class.trim();
                if class.is_empty() {
                    continue;
                }
                let count = count.trim().parse::<u32>().unwrap_or(1);
                entries.push((class.to_string(), count));
            }
            None => entries.push((token.to_string(), 1)),
        }
    }

    (clean, entries)
}
