//! Bounded, deterministic text fix-ups applied before giving up on a parse.

use std::borrow::Cow;

/// Removes commas that directly precede a closing `}` or `]`.
///
/// Commas inside string literals are left alone. Whitespace between the
/// comma and the closer is kept. Returns [`Cow::Borrowed`] when there was
/// nothing to remove.
#[must_use]
pub fn remove_trailing_commas(text: &str) -> Cow<'_, str> {
    let mut fixed: Option<String> = None;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text.char_indices() {
        let drop = if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            false
        } else if c == '"' {
            in_string = true;
            false
        } else {
            c == ',' && closer_follows(&text[offset + 1..])
        };

        if drop {
            fixed.get_or_insert_with(|| text[..offset].to_string());
        } else if let Some(buf) = fixed.as_mut() {
            buf.push(c);
        }
    }

    fixed.map_or(Cow::Borrowed(text), Cow::Owned)
}

fn closer_follows(rest: &str) -> bool {
    matches!(rest.trim_start().chars().next(), Some('}' | ']'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_comma_before_brace() {
        assert_eq!(remove_trailing_commas(r#"{"a":1,}"#), r#"{"a":1}"#);
    }

    #[test]
    fn test_removes_comma_before_bracket_across_newline() {
        assert_eq!(remove_trailing_commas("[1, 2,\n  ]"), "[1, 2\n  ]");
    }

    #[test]
    fn test_nested_trailing_commas() {
        assert_eq!(
            remove_trailing_commas(r#"{"a": [1, 2,], "b": {"c": 3,},}"#),
            r#"{"a": [1, 2], "b": {"c": 3}}"#
        );
    }

    #[test]
    fn test_commas_inside_strings_are_kept() {
        assert_eq!(
            remove_trailing_commas(r#"{"note": "keep ,] and ,}", "b": [1,]}"#),
            r#"{"note": "keep ,] and ,}", "b": [1]}"#
        );
    }

    #[test]
    fn test_escaped_quote_does_not_end_string() {
        assert_eq!(
            remove_trailing_commas(r#"["say \",]\" twice",]"#),
            r#"["say \",]\" twice"]"#
        );
    }

    #[test]
    fn test_clean_text_is_borrowed() {
        assert!(matches!(
            remove_trailing_commas(r#"{"a": [1, 2], "s": "x,]"}"#),
            Cow::Borrowed(_)
        ));
    }
}
