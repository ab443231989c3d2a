//! Statement-level reading of SQL dumps.
//!
//! The [`Parser`] streams a dump one `;`-terminated statement at a time so
//! that only a single statement has to be resident in memory. The value lists
//! inside `INSERT` statements are handled by [`values`], and individual fields
//! are cleaned up by [`normalize`].

pub mod normalize;
pub mod values;


use memchr::memmem;
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::io::{BufRead, BufReader, Read};

pub use normalize::{normalize_field, normalize_row};
pub use values::{rows_from_statement, RawRow, ValueRows};

pub const SMALL_BUFFER_SIZE: usize = 64 * 1024;
pub const MEDIUM_BUFFER_SIZE: usize = 256 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementType {
    Unknown,
    CreateTable,
    Insert,
}

static CREATE_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?[`\x22]?([^\s`\x22(]+)[`\x22]?")
        .unwrap()
});

static INSERT_INTO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:INSERT|REPLACE)\s+(?:(?:LOW_PRIORITY|DELAYED|HIGH_PRIORITY|IGNORE)\s+)*(?:INTO\s+)?[`\x22]?([^\s`\x22(]+)[`\x22]?",
    )
    .unwrap()
});

pub struct Parser<R: Read> {
    reader: BufReader<R>,
    stmt_buffer: Vec<u8>,
}

impl<R: Read> Parser<R> {
    pub fn new(reader: R, buffer_size: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(buffer_size, reader),
            stmt_buffer: Vec::with_capacity(32 * 1024),
        }
    }

    /// Read the next statement, including its terminating `;`.
    ///
    /// At end of input the remaining bytes are returned as a final statement
    /// even without a terminator, unless they are only whitespace and
    /// comments. Returns `Ok(None)` once the input is exhausted.
    pub fn read_statement(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        self.stmt_buffer.clear();

        let mut inside_single_quote = false;
        let mut inside_double_quote = false;
        let mut escaped = false;

        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                if skip_leading_comments(&self.stmt_buffer).is_empty() {
                    self.stmt_buffer.clear();
                    return Ok(None);
                }
                let result = std::mem::take(&mut self.stmt_buffer);
                return Ok(Some(result));
            }

            let mut consumed = 0;
            let mut found_terminator = false;

            for (i, &b) in buf.iter().enumerate() {
                let inside_string = inside_single_quote || inside_double_quote;

                if escaped {
                    escaped = false;
                    continue;
                }

                if b == b'\\' && inside_string {
                    escaped = true;
                    continue;
                }

                if b == b'\'' && !inside_double_quote {
                    inside_single_quote = !inside_single_quote;
                } else if b == b'"' && !inside_single_quote {
                    inside_double_quote = !inside_double_quote;
                } else if b == b';' && !inside_string {
                    self.stmt_buffer.extend_from_slice(&buf[..=i]);
                    consumed = i + 1;
                    found_terminator = true;
                    break;
                }
            }

            if found_terminator {
                self.reader.consume(consumed);
                let result = std::mem::take(&mut self.stmt_buffer);
                return Ok(Some(result));
            }

            self.stmt_buffer.extend_from_slice(buf);
            let len = buf.len();
            self.reader.consume(len);
        }
    }

    /// Classify a statement and extract the table it targets.
    pub fn parse_statement(stmt: &[u8]) -> (StatementType, String) {
        let stmt = skip_leading_comments(stmt);

        if stmt.len() < 6 {
            return (StatementType::Unknown, String::new());
        }

        let upper_prefix: Vec<u8> = stmt
            .iter()
            .take(20)
            .map(|b| b.to_ascii_uppercase())
            .collect();

        if upper_prefix.starts_with(b"INSERT INTO") {
            if let Some(name) = extract_table_name(stmt, 11) {
                return (StatementType::Insert, name);
            }
        }

        if upper_prefix.starts_with(b"INSERT") || upper_prefix.starts_with(b"REPLACE") {
            if let Some(name) = capture_name(&INSERT_INTO_RE, stmt) {
                return (StatementType::Insert, name);
            }
        }

        if upper_prefix.starts_with(b"CREATE TABLE") {
            if let Some(name) = capture_name(&CREATE_TABLE_RE, stmt) {
                return (StatementType::CreateTable, name);
            }
        }

        (StatementType::Unknown, String::new())
    }
}

/// Return the value list of an `INSERT` statement: the text after the first
/// `VALUES` keyword, without the trailing `;` and surrounding whitespace.
///
/// The keyword is matched case-insensitively as a whole word outside quoted
/// text, so `VALUES` inside a string literal or identifier never counts.
/// Returns `None` when the statement has no `VALUES` keyword.
pub fn values_clause(stmt: &str) -> Option<&str> {
    let pos = find_values_keyword(stmt.as_bytes())?;

    let rest = &stmt[pos + 6..];
    let rest = rest.trim_end_matches(|c: char| c.is_ascii_whitespace() || c == ';');
    Some(rest.trim_start())
}

fn find_values_keyword(bytes: &[u8]) -> Option<usize> {
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' && q != b'`' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }

        match b {
            b'\'' | b'"' | b'`' => quote = Some(b),
            b'V' | b'v' => {
                let is_word = |c: &u8| c.is_ascii_alphanumeric() || *c == b'_';
                let matches = bytes
                    .get(i..i + 6)
                    .is_some_and(|w| w.eq_ignore_ascii_case(b"VALUES"));
                let bounded = (i == 0 || !is_word(&bytes[i - 1]))
                    && !bytes.get(i + 6).is_some_and(is_word);
                if matches && bounded {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

fn capture_name(re: &Regex, stmt: &[u8]) -> Option<String> {
    let caps = re.captures(stmt)?;
    let m = caps.get(1)?;
    Some(String::from_utf8_lossy(m.as_bytes()).into_owned())
}

#[inline]
fn trim_ascii_start(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|&b| !is_whitespace(b))
        .unwrap_or(data.len());
    &data[start..]
}

/// Skip whitespace and any `--`, `#` or `/* */` comments before a statement.
fn skip_leading_comments(mut data: &[u8]) -> &[u8] {
    loop {
        data = trim_ascii_start(data);
        if data.starts_with(b"--") || data.starts_with(b"#") {
            data = match memchr::memchr(b'\n', data) {
                Some(nl) => &data[nl + 1..],
                None => &[],
            };
        } else if data.starts_with(b"/*") {
            data = match memmem::find(&data[2..], b"*/") {
                Some(end) => &data[end + 4..],
                None => &[],
            };
        } else {
            return data;
        }
    }
}

#[inline]
fn extract_table_name(stmt: &[u8], offset: usize) -> Option<String> {
    let mut i = offset;

    while i < stmt.len() && is_whitespace(stmt[i]) {
        i += 1;
    }

    if i >= stmt.len() {
        return None;
    }

    let quote_char = if stmt[i] == b'`' || stmt[i] == b'"' {
        let q = stmt[i];
        i += 1;
        Some(q)
    } else {
        None
    };

    let start = i;

    while i < stmt.len() {
        let b = stmt[i];
        if let Some(q) = quote_char {
            if b == q {
                let name = &stmt[start..i];
                return Some(String::from_utf8_lossy(name).into_owned());
            }
        } else if is_whitespace(b) || b == b'(' || b == b';' || b == b',' {
            if i > start {
                let name = &stmt[start..i];
                return Some(String::from_utf8_lossy(name).into_owned());
            }
            return None;
        }
        i += 1;
    }

    if quote_char.is_none() && i > start {
        let name = &stmt[start..i];
        return Some(String::from_utf8_lossy(name).into_owned());
    }

    None
}

#[inline]
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

pub fn determine_buffer_size(file_size: u64) -> usize {
    if file_size > 1024 * 1024 * 1024 {
        MEDIUM_BUFFER_SIZE
    } else {
        SMALL_BUFFER_SIZE
    }
}
