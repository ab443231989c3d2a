//! Tokenizer for the value list of an `INSERT ... VALUES` statement.
//!
//! Splits `(a,'b'),(c,'d, (e)')` into rows and each row into raw fields while
//! respecting quoted strings, backslash escapes and nested parentheses. The
//! scanner is an explicit state machine; see [`ScanState`] for the states and
//! [`ValueRows`] for the transition table.
//!
//! Fields are returned verbatim (quotes and escapes included) as slices of the
//! input. Cleaning them up is the job of [`super::normalize`].

use super::values_clause;

/// One parenthesized group of raw fields.
pub type RawRow<'a> = Vec<&'a str>;

/// Scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Between rows (nesting depth 0). Everything except `(` is ignored.
    Default,
    /// Inside a row, outside any string literal.
    InField,
    /// Inside a string literal opened by the given quote byte.
    InString(u8),
    /// Inside a string literal, right after a backslash.
    Escaped(u8),
}

/// Lazy iterator over the rows of a value list.
///
/// Transitions, in priority order:
///
/// | state          | byte                 | action                                   |
/// |----------------|----------------------|------------------------------------------|
/// | `Escaped(q)`   | any                  | keep byte, back to `InString(q)`         |
/// | `InString(q)`  | `\`                  | keep byte, go to `Escaped(q)`            |
/// | `InString(q)`  | `q`                  | keep byte, back to `InField`             |
/// | `InString(q)`  | other                | keep byte                                |
/// | `InField`      | `'` or `"`           | keep byte, go to `InString`              |
/// | `InField`      | `(`                  | depth + 1 (kept when depth > 1)          |
/// | `InField`      | `)` at depth 1       | close field, emit row, go to `Default`   |
/// | `InField`      | `)` at depth > 1     | depth - 1, keep byte                     |
/// | `InField`      | `,` at depth 1       | close field, start the next one          |
/// | `InField`      | other                | keep byte                                |
/// | `Default`      | `(`                  | open row, go to `InField`                |
/// | `Default`      | other                | ignore (row separators, whitespace, `;`) |
///
/// Input that ends outside `Default` (unbalanced parentheses or an unterminated
/// string) drops the partial row and sets [`ValueRows::truncated`].
#[derive(Debug, Clone)]
pub struct ValueRows<'a> {
    input: &'a str,
    pos: usize,
    state: ScanState,
    depth: usize,
    field_start: usize,
    row: RawRow<'a>,
    truncated: bool,
}

impl<'a> ValueRows<'a> {
    /// Tokenize a value list: the text following `VALUES`, without the
    /// terminating `;`.
    pub fn new(list: &'a str) -> Self {
        Self {
            input: list,
            pos: 0,
            state: ScanState::Default,
            depth: 0,
            field_start: 0,
            row: Vec::new(),
            truncated: false,
        }
    }

    /// An iterator that yields nothing.
    pub fn empty() -> Self {
        Self::new("")
    }

    /// True once the input ran out in the middle of a row.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Current scanner state; `Default` between rows.
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Byte offset of the next byte to be scanned.
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    fn close_field(&mut self, end: usize) {
        self.row.push(&self.input[self.field_start..end]);
        self.field_start = end + 1;
    }

    /// Feed one byte at offset `i`; returns a row when one is completed.
    ///
    /// Every structural byte is ASCII, so the slice boundaries taken here
    /// always fall on UTF-8 character boundaries.
    #[inline]
    fn step(&mut self, b: u8, i: usize) -> Option<RawRow<'a>> {
        match self.state {
            ScanState::Escaped(q) => {
                self.state = ScanState::InString(q);
            }
            ScanState::InString(q) => {
                if b == b'\\' {
                    self.state = ScanState::Escaped(q);
                } else if b == q {
                    self.state = ScanState::InField;
                }
            }
            ScanState::Default => {
                if b == b'(' {
                    self.depth = 1;
                    self.field_start = i + 1;
                    self.state = ScanState::InField;
                }
            }
            ScanState::InField => match b {
                b'\'' | b'"' => self.state = ScanState::InString(b),
                b'(' => self.depth += 1,
                b')' if self.depth == 1 => {
                    self.close_field(i);
                    self.depth = 0;
                    self.state = ScanState::Default;
                    return Some(std::mem::take(&mut self.row));
                }
                b')' => self.depth -= 1,
                b',' if self.depth == 1 => self.close_field(i),
                _ => {}
            },
        }
        None
    }
}

impl<'a> Iterator for ValueRows<'a> {
    type Item = RawRow<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.input.as_bytes();

        while self.pos < bytes.len() {
            let i = self.pos;
            self.pos += 1;
            if let Some(row) = self.step(bytes[i], i) {
                return Some(row);
            }
        }

        if self.state != ScanState::Default && !self.truncated {
            self.truncated = true;
            self.row.clear();
        }
        None
    }
}

/// Tokenize the rows of a whole `INSERT` statement.
///
/// Locates the `VALUES` keyword first; a statement without one yields an
/// empty iterator.
pub fn rows_from_statement(stmt: &str) -> ValueRows<'_> {
    values_clause(stmt)
        .map(ValueRows::new)
        .unwrap_or_else(ValueRows::empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(list: &str) -> Vec<Vec<&str>> {
        ValueRows::new(list).collect()
    }

    #[test]
    fn test_three_rows() {
        let rows = collect("(1,'a'),(2,'b'),(3,'c')");
        assert_eq!(
            rows,
            vec![vec!["1", "'a'"], vec!["2", "'b'"], vec!["3", "'c'"]]
        );
    }

    #[test]
    fn test_quoted_comma_and_parens() {
        let rows = collect("(1,'a, b (c)')");
        assert_eq!(rows, vec![vec!["1", "'a, b (c)'"]]);
    }

    #[test]
    fn test_escaped_quote_stays_in_string() {
        let rows = collect(r"(1,'it\'s, fine')");
        assert_eq!(rows, vec![vec!["1", r"'it\'s, fine'"]]);
    }

    #[test]
    fn test_escaped_backslash_before_closing_quote() {
        let rows = collect(r"('a\\',2)");
        assert_eq!(rows, vec![vec![r"'a\\'", "2"]]);
    }

    #[test]
    fn test_double_quoted_string_holds_single_quote() {
        let rows = collect(r#"("it's",1)"#);
        assert_eq!(rows, vec![vec![r#""it's""#, "1"]]);
    }

    #[test]
    fn test_nested_parentheses_outside_strings() {
        let rows = collect("(1,CONCAT(a,b),3)");
        assert_eq!(rows, vec![vec!["1", "CONCAT(a,b)", "3"]]);
    }

    #[test]
    fn test_empty_row_yields_single_empty_field() {
        let rows = collect("()");
        assert_eq!(rows, vec![vec![""]]);
    }

    #[test]
    fn test_empty_trailing_field() {
        let rows = collect("(1,)");
        assert_eq!(rows, vec![vec!["1", ""]]);
    }

    #[test]
    fn test_unterminated_string_truncates() {
        let mut rows = ValueRows::new("(1,'a'),(2,'oops");
        assert_eq!(rows.next(), Some(vec!["1", "'a'"]));
        assert_eq!(rows.next(), None);
        assert!(rows.truncated());
    }

    #[test]
    fn test_unbalanced_parens_truncate() {
        let mut rows = ValueRows::new("(1,(2)");
        assert_eq!(rows.next(), None);
        assert!(rows.truncated());
    }

    #[test]
    fn test_clean_input_not_truncated() {
        let mut rows = ValueRows::new("(1),(2)");
        assert_eq!(rows.by_ref().count(), 2);
        assert!(!rows.truncated());
        assert_eq!(rows.state(), ScanState::Default);
    }

    #[test]
    fn test_rows_from_statement_without_values() {
        assert_eq!(rows_from_statement("INSERT INTO t SELECT 1;").count(), 0);
    }

    #[test]
    fn test_rows_from_statement() {
        let rows: Vec<_> = rows_from_statement("INSERT INTO `t` VALUES (1,'x'),(2,'y');").collect();
        assert_eq!(rows, vec![vec!["1", "'x'"], vec!["2", "'y'"]]);
    }

    #[test]
    fn test_multibyte_content() {
        let rows = collect("(1,'café, naïve (ü)')");
        assert_eq!(rows, vec![vec!["1", "'café, naïve (ü)'"]]);
    }
}
