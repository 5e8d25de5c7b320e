mod parsers;
mod scanner;
mod script;

use crate::dialect::Dialect;
use crate::error::{ParseError, TrackerDbError};
use crate::types::SqlValue;

use parsers::unescape;
use scanner::Quote;

pub use script::split_script;

/// One piece of a compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Engine-ready SQL text.
    Literal(String),
    /// Reference to the parameter slot with this 0-based index.
    Parameter(usize),
}

/// Where a `?` placeholder appeared in the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterSlot {
    pub index: usize,
    pub offset: usize,
}

/// A template compiled for one dialect: literal chunks interleaved with
/// parameter references, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompiledStatement {
    fragments: Vec<Fragment>,
    slots: Vec<ParameterSlot>,
}

impl CompiledStatement {
    #[must_use]
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    #[must_use]
    pub fn parameter_slots(&self) -> &[ParameterSlot] {
        &self.slots
    }

    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.slots.len()
    }

    /// Concatenate the fragments, resolving parameter `i` to `values[i]`.
    ///
    /// # Errors
    /// Returns `TrackerDbError::ParameterError` if `values` does not cover every
    /// slot, or any formatting error raised by the dialect.
    pub fn to_sql(&self, values: &[SqlValue], dialect: &Dialect) -> Result<String, TrackerDbError> {
        if values.len() != self.slots.len() {
            return Err(TrackerDbError::ParameterError(format!(
                "template declares {} parameters, {} supplied",
                self.slots.len(),
                values.len()
            )));
        }
        let mut sql = String::new();
        for fragment in &self.fragments {
            match fragment {
                Fragment::Literal(text) => sql.push_str(text),
                Fragment::Parameter(index) => sql.push_str(&dialect.format_value(&values[*index])?),
            }
        }
        Ok(sql)
    }

    fn push_str(&mut self, text: &str) {
        if let Some(Fragment::Literal(last)) = self.fragments.last_mut() {
            last.push_str(text);
        } else {
            self.fragments.push(Fragment::Literal(text.to_owned()));
        }
    }

    fn push_char(&mut self, c: char) {
        if let Some(Fragment::Literal(last)) = self.fragments.last_mut() {
            last.push(c);
        } else {
            self.fragments.push(Fragment::Literal(c.to_string()));
        }
    }

    fn push_parameter(&mut self, offset: usize) {
        let index = self.slots.len();
        self.slots.push(ParameterSlot { index, offset });
        self.fragments.push(Fragment::Parameter(index));
    }
}

/// Compile a portable template into engine-specific fragments.
///
/// Templates quote string literals with `'`, identifiers with `"`, `` ` `` or
/// `[...]`, and mark positional parameters with `?`. Identifiers are rewritten to
/// the dialect's identifier quotes and literals are re-quoted for the dialect.
///
/// ```rust
/// use tracker_sql::prelude::*;
///
/// let compiled = compile_template("SELECT * FROM [t] WHERE [c] = ?", &Dialect::default())?;
/// assert_eq!(compiled.parameter_count(), 1);
/// let sql = compiled.to_sql(&[SqlValue::Text("x".into())], &Dialect::default())?;
/// assert_eq!(sql, r#"SELECT * FROM "t" WHERE "c" = 'x'"#);
/// # Ok::<(), TrackerDbError>(())
/// ```
///
/// # Errors
/// Returns `ParseError::QuoteMismatch` when a quote is left open and
/// `ParseError::UnsupportedCharacter` when a string literal cannot be re-quoted.
pub fn compile_template(
    template: &str,
    dialect: &Dialect,
) -> Result<CompiledStatement, TrackerDbError> {
    let mut compiled = CompiledStatement::default();
    let mut open: Option<(Quote, usize)> = None;
    let mut quoted = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        let Some((quote, opened_at)) = open else {
            if c == '?' {
                compiled.push_parameter(offset);
            } else if let Some(quote) = Quote::opening(c) {
                open = Some((quote, offset));
                quoted.clear();
            } else {
                compiled.push_char(c);
            }
            continue;
        };

        if c == quote.closer() {
            if quote.doubles() && chars.peek().map(|&(_, next)| next) == Some(c) {
                chars.next();
                quoted.push(c);
            } else {
                compiled.push_str(&render_quoted(quote, &quoted, dialect)?);
                open = None;
            }
        } else if c == '\\' && quote.escapes() {
            let Some((_, escaped)) = chars.next() else {
                return Err(ParseError::QuoteMismatch {
                    quote: quote.opener(),
                    offset: opened_at,
                }
                .into());
            };
            quoted.push(unescape(escaped));
        } else {
            quoted.push(c);
        }
    }

    if let Some((quote, offset)) = open {
        return Err(ParseError::QuoteMismatch {
            quote: quote.opener(),
            offset,
        }
        .into());
    }
    Ok(compiled)
}

fn render_quoted(quote: Quote, content: &str, dialect: &Dialect) -> Result<String, ParseError> {
    if quote.is_string_literal() {
        dialect
            .try_quote_string_literal(content)
            .map_err(|character| ParseError::UnsupportedCharacter { character })
    } else {
        Ok(dialect.quote_identifier(content))
    }
}
