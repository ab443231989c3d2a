//! Turns raw tokenizer fields into plain text.
//!
//! Rules, in order: `NULL` becomes the empty string, one outer pair of
//! matching quotes is stripped, backslash escapes are collapsed, and HTML
//! character entities are decoded. Normalization never fails; anything it
//! does not recognize passes through unchanged.

use std::borrow::Cow;

/// Normalize a single raw field.
///
/// Whitespace around a `NULL` token or around a quoted literal (as in
/// `(1, 'a')`) is ignored; unquoted fields are otherwise kept as-is.
pub fn normalize_field(raw: &str) -> Cow<'_, str> {
    let trimmed = raw.trim_matches(|c: char| c.is_ascii_whitespace());

    if trimmed == "NULL" || trimmed == "null" {
        return Cow::Borrowed("");
    }

    let inner = strip_outer_quotes(trimmed).unwrap_or(raw);

    match unescape(inner) {
        Cow::Borrowed(text) => html_escape::decode_html_entities(text),
        Cow::Owned(text) => {
            if let Cow::Owned(decoded) = html_escape::decode_html_entities(&text) {
                return Cow::Owned(decoded);
            }
            Cow::Owned(text)
        }
    }
}

/// Normalize every field of a row.
pub fn normalize_row(row: &[&str]) -> Vec<String> {
    row.iter().map(|f| normalize_field(f).into_owned()).collect()
}

/// Strip exactly one outer pair of matching `'` or `"`.
fn strip_outer_quotes(field: &str) -> Option<&str> {
    let bytes = field.as_bytes();
    if bytes.len() < 2 {
        return None;
    }
    let first = bytes[0];
    if (first == b'\'' || first == b'"') && bytes[bytes.len() - 1] == first {
        Some(&field[1..field.len() - 1])
    } else {
        None
    }
}

/// Collapse SQL backslash escapes in one left-to-right pass.
fn unescape(text: &str) -> Cow<'_, str> {
    if !text.contains('\\') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.peek().copied() {
            Some(e @ ('\'' | '"' | '\\')) => {
                chars.next();
                out.push(e);
            }
            Some('n') => {
                chars.next();
                out.push('\n');
            }
            Some('t') => {
                chars.next();
                out.push('\t');
            }
            Some('r') => {
                chars.next();
                // \r\n is a single line break
                let mut lookahead = chars.clone();
                if lookahead.next() == Some('\\') && lookahead.next() == Some('n') {
                    chars = lookahead;
                }
                out.push('\n');
            }
            _ => out.push('\\'),
        }
    }

    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_tokens() {
        assert_eq!(normalize_field("NULL"), "");
        assert_eq!(normalize_field("null"), "");
        assert_eq!(normalize_field(" NULL"), "");
    }

    #[test]
    fn test_null_is_case_sensitive() {
        assert_eq!(normalize_field("Null"), "Null");
    }

    #[test]
    fn test_quoted_null_is_text() {
        assert_eq!(normalize_field("'NULL'"), "NULL");
    }

    #[test]
    fn test_empty_quoted_string() {
        assert_eq!(normalize_field("''"), "");
    }

    #[test]
    fn test_strip_outer_pair_only() {
        assert_eq!(normalize_field("'''a'''"), "''a''");
        assert_eq!(normalize_field(r#""say "hi"""#), r#"say "hi""#);
    }

    #[test]
    fn test_mismatched_quotes_untouched() {
        assert_eq!(normalize_field("'abc\""), "'abc\"");
        assert_eq!(normalize_field("'"), "'");
    }

    #[test]
    fn test_escapes() {
        assert_eq!(normalize_field(r"'it\'s'"), "it's");
        assert_eq!(normalize_field(r#"'a \"b\"'"#), "a \"b\"");
        assert_eq!(normalize_field(r"'C:\\dir'"), r"C:\dir");
        assert_eq!(normalize_field(r"'a\r\nb\nc\rd'"), "a\nb\nc\nd");
        assert_eq!(normalize_field(r"'a\tb'"), "a\tb");
    }

    #[test]
    fn test_escaped_backslash_then_n_is_not_newline() {
        assert_eq!(normalize_field(r"'a\\nb'"), r"a\nb");
    }

    #[test]
    fn test_unknown_escape_passes_through() {
        assert_eq!(normalize_field(r"'50\% off\'"), r"50\% off\");
        assert_eq!(normalize_field(r"'x\0y'"), r"x\0y");
    }

    #[test]
    fn test_html_entities() {
        assert_eq!(normalize_field("'Tom &amp; Jerry'"), "Tom & Jerry");
        assert_eq!(normalize_field("'&#8217;s &lt;b&gt;'"), "\u{2019}s <b>");
        assert_eq!(normalize_field("'&#x41;'"), "A");
    }

    #[test]
    fn test_unknown_entity_passes_through() {
        assert_eq!(normalize_field("'&zzz;'"), "&zzz;");
    }

    #[test]
    fn test_whitespace_around_quoted_field() {
        assert_eq!(normalize_field(" 'a'"), "a");
    }

    #[test]
    fn test_unquoted_value_unchanged() {
        assert_eq!(normalize_field("2024-01-01 10:00:00"), "2024-01-01 10:00:00");
        assert!(matches!(normalize_field("42"), Cow::Borrowed("42")));
    }

    #[test]
    fn test_idempotent_on_clean_text() {
        let clean = "Plain text, no escapes";
        let once = normalize_field(clean).into_owned();
        assert_eq!(normalize_field(&once), once);
    }

    #[test]
    fn test_normalize_row() {
        assert_eq!(
            normalize_row(&["1", "'a'", "NULL"]),
            vec!["1".to_string(), "a".to_string(), String::new()]
        );
    }
}
