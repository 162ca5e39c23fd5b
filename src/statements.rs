use crate::error::{MigrationError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

const INSERT_PREFIX: &str = "INSERT INTO";

static TABLE_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^INSERT INTO\s+`([A-Za-z0-9_$]+)`").unwrap());

/// INSERT statements of a dump, grouped by table in source order.
///
/// A table that is inserted into by several statements keeps all of them;
/// large dumps split one table's rows across many INSERTs.
#[derive(Debug, Default)]
pub struct TableInserts<'a> {
    tables: FxHashMap<&'a str, Vec<&'a str>>,
}

impl<'a> TableInserts<'a> {
    pub fn extract(dump: &'a str) -> Result<Self> {
        let mut tables: FxHashMap<&'a str, Vec<&'a str>> = FxHashMap::default();
        let mut skipped = 0usize;

        for statement in split_statements(dump) {
            let statement = strip_leading_comments(statement);
            if !statement.starts_with(INSERT_PREFIX) {
                skipped += 1;
                continue;
            }

            let table = TABLE_NAME_REGEX
                .captures(statement)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
                .ok_or_else(|| MigrationError::MalformedStatement {
                    snippet: snippet(statement),
                })?;

            debug!(table, bytes = statement.len(), "Found INSERT statement");
            tables.entry(table).or_default().push(statement);
        }

        info!(
            tables = tables.len(),
            skipped_statements = skipped,
            "Indexed INSERT statements"
        );

        Ok(Self { tables })
    }

    /// All INSERT statements for `table`, failing if the dump has none.
    pub fn statements(&self, table: &str) -> Result<&[&'a str]> {
        self.tables
            .get(table)
            .map(Vec::as_slice)
            .ok_or_else(|| MigrationError::MissingTable(table.to_string()))
    }

    pub fn require_all(&self, tables: &[&str]) -> Result<()> {
        for table in tables {
            self.statements(table)?;
        }
        Ok(())
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SplitState {
    Normal,
    Quoted(u8),
    LineComment,
    BlockComment,
}

/// Splits dump text on `;` terminators that sit outside quotes and comments.
/// Returned statements are trimmed; empty ones are dropped.
pub fn split_statements(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut statements = Vec::new();
    let mut state = SplitState::Normal;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match state {
            SplitState::Normal => match b {
                b'\'' | b'"' | b'`' => state = SplitState::Quoted(b),
                b'#' => state = SplitState::LineComment,
                b'-' if is_dash_comment(bytes, i) => state = SplitState::LineComment,
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    state = SplitState::BlockComment;
                    i += 1;
                }
                b';' => {
                    push_trimmed(&mut statements, &text[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
            SplitState::Quoted(quote) => {
                if b == b'\\' && quote != b'`' {
                    i += 1;
                } else if b == quote {
                    state = SplitState::Normal;
                }
            }
            SplitState::LineComment => {
                if b == b'\n' {
                    state = SplitState::Normal;
                }
            }
            SplitState::BlockComment => {
                if b == b'*' && bytes.get(i + 1) == Some(&b'/') {
                    state = SplitState::Normal;
                    i += 1;
                }
            }
        }
        i += 1;
    }

    if start < text.len() {
        push_trimmed(&mut statements, &text[start..]);
    }

    statements
}

fn push_trimmed<'a>(statements: &mut Vec<&'a str>, statement: &'a str) {
    let trimmed = statement.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed);
    }
}

/// MySQL only treats `--` as a comment when followed by whitespace or end of input.
fn is_dash_comment(bytes: &[u8], i: usize) -> bool {
    bytes.get(i + 1) == Some(&b'-')
        && bytes
            .get(i + 2)
            .is_none_or(|next| next.is_ascii_whitespace())
}

/// Drops comments and whitespace in front of a statement's first keyword.
fn strip_leading_comments(mut statement: &str) -> &str {
    loop {
        statement = statement.trim_start();
        if statement.starts_with('#') || is_dash_comment(statement.as_bytes(), 0) {
            statement = match statement.find('\n') {
                Some(pos) => &statement[pos + 1..],
                None => "",
            };
        } else if statement.starts_with("/*") {
            statement = match statement[2..].find("*/") {
                Some(pos) => &statement[pos + 4..],
                None => "",
            };
        } else {
            return statement;
        }
    }
}

fn snippet(statement: &str) -> String {
    statement.chars().take(60).collect()
}
