//! Candidate JSON slice selection.
//!
//! Rules are tried in order and the first match wins:
//!
//! 1. A leading triple-backtick fence is stripped, including a `json` tag.
//! 2. A single pair of wrapping backticks is stripped.
//! 3. The object span `{` … `}` is taken.
//! 4. The array span `[` … `]` is taken.
//! 5. The trimmed text is returned unchanged.

use super::config::SpanStrategy;

const FENCE: &str = "```";

/// Selects the candidate slice with the greedy span rule.
///
/// Returns `None` only when `raw_text` is empty or whitespace.
#[must_use]
pub fn extract(raw_text: &str) -> Option<&str> {
    extract_with(raw_text, SpanStrategy::Greedy)
}

/// Selects the candidate slice with the given span strategy.
#[must_use]
pub fn extract_with(raw_text: &str, strategy: SpanStrategy) -> Option<&str> {
    let text = raw_text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(rest) = text.strip_prefix(FENCE) {
        return Some(fence_interior(rest));
    }

    if let Some(inner) = single_backtick_interior(text) {
        return Some(inner);
    }

    span(text, '{', '}', strategy)
        .or_else(|| span(text, '[', ']', strategy))
        .or(Some(text))
}

/// Interior of a fenced block whose opening ``` has already been removed.
fn fence_interior(rest: &str) -> &str {
    let body = rest.rfind(FENCE).map_or(rest, |end| &rest[..end]);
    let body = strip_json_tag(body);

    let body = body.trim_start_matches([' ', '\t']);
    let body = body
        .strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(body);

    let body = body.trim_end_matches([' ', '\t']);
    body.strip_suffix("\r\n")
        .or_else(|| body.strip_suffix('\n'))
        .unwrap_or(body)
}

fn strip_json_tag(body: &str) -> &str {
    let body = body.trim_start_matches([' ', '\t']);
    let tag_len = body
        .find(|c: char| c.is_whitespace())
        .unwrap_or(body.len());
    if body[..tag_len].eq_ignore_ascii_case("json") {
        &body[tag_len..]
    } else {
        body
    }
}

fn single_backtick_interior(text: &str) -> Option<&str> {
    let inner = text.strip_prefix('`')?.strip_suffix('`')?;
    (!inner.contains('`')).then_some(inner)
}

fn span(text: &str, open: char, close: char, strategy: SpanStrategy) -> Option<&str> {
    match strategy {
        SpanStrategy::Greedy => greedy_span(text, open, close),
        SpanStrategy::Balanced => {
            balanced_span(text, open, close).or_else(|| greedy_span(text, open, close))
        }
    }
}

fn greedy_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// Matches brackets from the leftmost opener, ignoring brackets inside strings.
fn balanced_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        if c == '"' {
            in_string = true;
        } else if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                let end = start + offset;
                return Some(&text[start..=end]);
            }
        }
    }

    None
}
