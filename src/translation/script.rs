use crate::error::ParseError;

use super::parsers::{is_block_comment_end, is_block_comment_start, is_line_comment_start};
use super::scanner::{Quote, State};

/// Split a multi-statement script on unquoted `;`.
///
/// `--` and `/* */` comments outside quotes are replaced by a single space;
/// quoting follows the template rules (`'`, `"`, `` ` `` with doubling and
/// backslash escapes, `[...]` without). Statements are trimmed and empty ones
/// dropped.
///
/// ```rust
/// use tracker_sql::prelude::*;
///
/// let statements = split_script("INSERT INTO t VALUES(1); -- note\nINSERT INTO t VALUES(2);")?;
/// assert_eq!(statements, vec!["INSERT INTO t VALUES(1)", "INSERT INTO t VALUES(2)"]);
/// # Ok::<(), TrackerDbError>(())
/// ```
///
/// # Errors
/// Returns `ParseError::QuoteMismatch` or `ParseError::UnterminatedComment` if
/// the script ends inside a quote or a block comment.
pub fn split_script(script: &str) -> Result<Vec<String>, ParseError> {
    let bytes = script.as_bytes();
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut state = State::Normal;
    let mut segment_start = 0;
    let mut opened_at = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => {
                if let Some(quote) = Quote::opening(char::from(b)) {
                    state = State::Quoted(quote);
                    opened_at = idx;
                } else if is_line_comment_start(bytes, idx) || is_block_comment_start(bytes, idx) {
                    current.push_str(&script[segment_start..idx]);
                    current.push(' ');
                    state = if b == b'-' {
                        State::LineComment
                    } else {
                        State::BlockComment
                    };
                    opened_at = idx;
                    idx += 2;
                    continue;
                } else if b == b';' {
                    current.push_str(&script[segment_start..idx]);
                    push_statement(&mut statements, &mut current);
                    segment_start = idx + 1;
                }
            }
            State::Quoted(quote) => {
                if quote.escapes() && b == b'\\' {
                    idx += 2;
                    continue;
                }
                if char::from(b) == quote.closer() {
                    if quote.doubles() && bytes.get(idx + 1) == Some(&b) {
                        idx += 2;
                        continue;
                    }
                    state = State::Normal;
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                    segment_start = idx;
                }
            }
            State::BlockComment => {
                if is_block_comment_end(bytes, idx) {
                    state = State::Normal;
                    idx += 2;
                    segment_start = idx;
                    continue;
                }
            }
        }
        idx += 1;
    }

    match state {
        State::Quoted(quote) => {
            return Err(ParseError::QuoteMismatch {
                quote: quote.opener(),
                offset: opened_at,
            });
        }
        State::BlockComment => {
            return Err(ParseError::UnterminatedComment { offset: opened_at });
        }
        State::LineComment => {}
        State::Normal => current.push_str(&script[segment_start..]),
    }
    push_statement(&mut statements, &mut current);
    Ok(statements)
}

fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_owned());
    }
    current.clear();
}
