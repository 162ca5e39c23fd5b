//! Value-list tokenizer for `INSERT INTO ... VALUES (...),(...)` statements.
//!
//! Rows are found by walking the statement byte by byte while tracking quote
//! state and parenthesis depth, so commas and parentheses inside string
//! literals never split a row or a field. Fields come back as raw literal
//! text; callers decide per column whether to un-quote or parse them.

use crate::error::{MigrationError, Result};
use crate::models::UserId;

/// One parenthesized row, each field still in its source literal form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTuple<'a> {
    pub row: usize,
    pub fields: Vec<&'a str>,
}

impl<'a> RawTuple<'a> {
    /// Destructures the row into exactly `N` fields.
    pub fn fields<const N: usize>(&self, table: &str) -> Result<&[&'a str; N]> {
        self.fields.as_slice().try_into().map_err(|_| {
            MigrationError::tuple_decode(
                table,
                self.row,
                format!("expected {} fields, found {}", N, self.fields.len()),
            )
        })
    }
}

/// Decodes the rows of every statement in order, numbering rows continuously.
pub fn decode_table<'a>(table: &str, statements: &[&'a str]) -> Result<Vec<RawTuple<'a>>> {
    let mut rows = Vec::new();
    for statement in statements {
        let first_row = rows.len();
        rows.extend(decode_tuples(table, statement, first_row)?);
    }
    Ok(rows)
}

/// Decodes the value list of a single INSERT statement.
pub fn decode_tuples<'a>(
    table: &str,
    statement: &'a str,
    first_row: usize,
) -> Result<Vec<RawTuple<'a>>> {
    let values_start = find_values_keyword(statement).ok_or_else(|| {
        MigrationError::tuple_decode(table, first_row, "statement has no VALUES clause")
    })?;

    let bytes = statement.as_bytes();
    let mut rows = Vec::new();
    let mut fields = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut field_start = 0;
    let mut expect_row = true;
    let mut i = values_start;

    let row_error = |row: usize, message: &str| MigrationError::tuple_decode(table, row, message);

    while i < bytes.len() {
        let b = bytes[i];
        let row = first_row + rows.len();

        if let Some(q) = quote {
            if b == b'\\' {
                i += 1;
            } else if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match b {
            b'\'' | b'"' if depth > 0 => quote = Some(b),
            b'(' => {
                if depth == 0 {
                    if !expect_row {
                        return Err(row_error(row, "missing ',' between rows"));
                    }
                    field_start = i + 1;
                    expect_row = false;
                }
                depth += 1;
            }
            b')' => {
                if depth == 0 {
                    return Err(row_error(row, "unbalanced ')'"));
                }
                depth -= 1;
                if depth == 0 {
                    fields.push(statement[field_start..i].trim());
                    rows.push(RawTuple {
                        row,
                        fields: std::mem::take(&mut fields),
                    });
                }
            }
            b',' if depth == 1 => {
                fields.push(statement[field_start..i].trim());
                field_start = i + 1;
            }
            b',' if depth == 0 => {
                if expect_row {
                    return Err(row_error(row, "empty row in value list"));
                }
                expect_row = true;
            }
            _ if depth == 0 && !b.is_ascii_whitespace() => {
                let message = format!("unexpected '{}' between rows", b as char);
                return Err(row_error(row, message.as_str()));
            }
            _ => {}
        }
        i += 1;
    }

    let row = first_row + rows.len();
    if quote.is_some() {
        return Err(row_error(row, "unterminated string literal"));
    }
    if depth > 0 {
        return Err(row_error(row, "unterminated row"));
    }
    if expect_row {
        return Err(row_error(row, "value list ends without a row"));
    }

    Ok(rows)
}

/// Byte offset just past the `VALUES` keyword, skipping any column list or
/// quoted identifiers before it.
fn find_values_keyword(statement: &str) -> Option<usize> {
    const KEYWORD: &[u8] = b"VALUES";
    let bytes = statement.as_bytes();
    let mut quote: Option<u8> = None;
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' && q != b'`' {
                i += 1;
            } else if b == q {
                quote = None;
            }
        } else {
            match b {
                b'\'' | b'"' | b'`' => quote = Some(b),
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                _ if depth == 0
                    && bytes.len() - i >= KEYWORD.len()
                    && bytes[i..i + KEYWORD.len()].eq_ignore_ascii_case(KEYWORD) =>
                {
                    let end = i + KEYWORD.len();
                    let bounded_before = i == 0 || !is_ident_byte(bytes[i - 1]);
                    let bounded_after = end == bytes.len() || !is_ident_byte(bytes[end]);
                    if bounded_before && bounded_after {
                        return Some(end);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

pub fn is_null(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("NULL")
}

/// Strips the quotes from a string literal and resolves MySQL escapes.
/// Bare tokens (numbers, `NULL`) are returned unchanged.
pub fn unquote(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let quoted = bytes.len() >= 2
        && matches!(bytes[0], b'\'' | b'"')
        && bytes[bytes.len() - 1] == bytes[0];
    if !quoted {
        return raw.to_string();
    }

    let quote = raw.chars().next().unwrap_or('\'');
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('0') => out.push('\0'),
                Some('b') => out.push('\u{8}'),
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('Z') => out.push('\u{1A}'),
                // LIKE wildcards keep their backslash
                Some(c @ ('%' | '_')) => {
                    out.push('\\');
                    out.push(c);
                }
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else if c == quote && chars.peek() == Some(&quote) {
            chars.next();
            out.push(quote);
        } else {
            out.push(c);
        }
    }

    out
}

/// `None` for a `NULL` literal, otherwise the un-quoted value.
pub fn optional_string(raw: &str) -> Option<String> {
    if is_null(raw) {
        None
    } else {
        Some(unquote(raw))
    }
}

pub fn parse_id(raw: &str, table: &str, row: usize) -> Result<UserId> {
    unquote(raw).trim().parse::<UserId>().map_err(|_| {
        MigrationError::tuple_decode(table, row, format!("invalid user id {}", raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(statement: &str) -> Result<Vec<RawTuple<'_>>> {
        decode_tuples("t", statement, 0)
    }

    #[test]
    fn decode_single_row() {
        let rows = decode("INSERT INTO `friends` VALUES (1,1,2,'d')").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fields, vec!["1", "1", "2", "'d'"]);
    }

    #[test]
    fn decode_multiple_rows_with_whitespace() {
        let rows = decode("INSERT INTO `t` VALUES (1, 'a') ,\n (2,'b'),(3,'c')").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].fields, vec!["1", "'a'"]);
        assert_eq!(rows[2].row, 2);
        assert_eq!(rows[2].fields, vec!["3", "'c'"]);
    }

    #[test]
    fn decode_skips_column_list() {
        let rows = decode("INSERT INTO `t` (`id`,`values`) VALUES (1,'x')").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fields, vec!["1", "'x'"]);
    }

    #[test]
    fn parentheses_and_commas_inside_strings_are_data() {
        let rows = decode("INSERT INTO `t` VALUES (1,'spam (again), really','x)y'),(2,'ok','')")
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fields, vec!["1", "'spam (again), really'", "'x)y'"]);
        assert_eq!(rows[1].fields, vec!["2", "'ok'", "''"]);
    }

    #[test]
    fn escaped_quotes_do_not_end_strings() {
        let rows = decode(r"INSERT INTO `t` VALUES (1,'it\'s, fine','a''b')").unwrap();
        assert_eq!(rows[0].fields, vec!["1", r"'it\'s, fine'", "'a''b'"]);
    }

    #[test]
    fn nested_parentheses_stay_in_one_field() {
        let rows = decode("INSERT INTO `t` VALUES (1,NOW(),CONCAT('a','b'))").unwrap();
        assert_eq!(rows[0].fields, vec!["1", "NOW()", "CONCAT('a','b')"]);
    }

    #[test]
    fn lowercase_values_keyword() {
        let rows = decode("INSERT INTO `t` values (7)").unwrap();
        assert_eq!(rows[0].fields, vec!["7"]);
    }

    #[test]
    fn missing_values_clause_fails() {
        let err = decode("INSERT INTO `t` SELECT * FROM u").unwrap_err();
        assert!(matches!(err, MigrationError::TupleDecode { .. }));
    }

    #[test]
    fn unterminated_string_fails() {
        let err = decode("INSERT INTO `t` VALUES (1,'abc)").unwrap_err();
        assert_eq!(
            err,
            MigrationError::tuple_decode("t", 0, "unterminated string literal")
        );
    }

    #[test]
    fn unbalanced_parentheses_fail() {
        assert!(decode("INSERT INTO `t` VALUES (1,(2)").is_err());
        assert!(decode("INSERT INTO `t` VALUES (1),2)").is_err());
        assert!(decode("INSERT INTO `t` VALUES (1)(2)").is_err());
        assert!(decode("INSERT INTO `t` VALUES (1),").is_err());
    }

    #[test]
    fn decode_table_numbers_rows_across_statements() {
        let statements = [
            "INSERT INTO `t` VALUES (1),(2)",
            "INSERT INTO `t` VALUES (3)",
        ];
        let rows = decode_table("t", &statements).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].row, 2);
        assert_eq!(rows[2].fields, vec!["3"]);
    }

    #[test]
    fn fields_checks_arity() {
        let rows = decode("INSERT INTO `t` VALUES (1,2,3)").unwrap();
        let [a, b, c] = rows[0].fields::<3>("t").unwrap();
        assert_eq!((*a, *b, *c), ("1", "2", "3"));

        let err = rows[0].fields::<4>("t").unwrap_err();
        assert_eq!(
            err,
            MigrationError::tuple_decode("t", 0, "expected 4 fields, found 3")
        );
    }

    #[test]
    fn unquote_strips_and_unescapes() {
        assert_eq!(unquote("'a@x.com'"), "a@x.com");
        assert_eq!(unquote(r"'it\'s'"), "it's");
        assert_eq!(unquote("'a''b'"), "a'b");
        assert_eq!(unquote(r"'line\nbreak\\'"), "line\nbreak\\");
        assert_eq!(unquote(r"'50\%'"), r"50\%");
        assert_eq!(unquote("\"dq\""), "dq");
        assert_eq!(unquote("''"), "");
        assert_eq!(unquote("0"), "0");
        assert_eq!(unquote("NULL"), "NULL");
    }

    #[test]
    fn optional_string_maps_null() {
        assert_eq!(optional_string("NULL"), None);
        assert_eq!(optional_string("null"), None);
        assert_eq!(optional_string("'abc'"), Some("abc".to_string()));
        assert_eq!(optional_string("'NULL'"), Some("NULL".to_string()));
    }

    #[test]
    fn parse_id_accepts_bare_and_quoted() {
        assert_eq!(parse_id("42", "t", 0).unwrap(), 42);
        assert_eq!(parse_id("'42'", "t", 0).unwrap(), 42);
        assert!(parse_id("abc", "t", 0).is_err());
        assert!(parse_id("-1", "t", 0).is_err());
    }
}
