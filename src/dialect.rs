use std::fmt::Write;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::TrackerDbError;
use crate::types::SqlValue;

/// An opening/closing quote character pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotePair {
    pub open: char,
    pub close: char,
}

impl QuotePair {
    #[must_use]
    pub const fn new(open: char, close: char) -> Self {
        Self { open, close }
    }

    #[must_use]
    pub const fn symmetric(quote: char) -> Self {
        Self::new(quote, quote)
    }
}

/// How characters a plain quoted run cannot hold are expressed in a string literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LiteralEscapes {
    /// Backslash escapes inside one quoted run: `\\`, `\n`, `\t`, `\r`.
    #[default]
    Backslash,
    /// Standard SQL: backslash is literal, control characters become `char(N)`
    /// runs joined with the concatenation operator.
    Concat,
}

/// Engine-specific spelling of quotes, NULL and string concatenation.
///
/// Templates are written once and rendered through a `Dialect`:
/// ```rust
/// use tracker_sql::prelude::*;
///
/// let compiled = compile_template("SELECT [name] FROM [t]", &Dialect::mssql())?;
/// assert_eq!(compiled.to_sql(&[], &Dialect::mssql())?, "SELECT [name] FROM [t]");
/// # Ok::<(), TrackerDbError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dialect {
    pub string_quote: QuotePair,
    pub identifier_quote: QuotePair,
    pub null_literal: String,
    pub concat_operator: String,
    pub char_function: String,
    pub literal_escapes: LiteralEscapes,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            string_quote: QuotePair::symmetric('\''),
            identifier_quote: QuotePair::symmetric('"'),
            null_literal: "NULL".into(),
            concat_operator: "||".into(),
            char_function: "char".into(),
            literal_escapes: LiteralEscapes::Backslash,
        }
    }
}

/// Named dialect presets, selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Default,
    Sqlite,
    Postgres,
    Mysql,
    Mssql,
}

impl DialectKind {
    #[must_use]
    pub fn dialect(self) -> Dialect {
        match self {
            DialectKind::Default => Dialect::default(),
            DialectKind::Sqlite => Dialect::sqlite(),
            DialectKind::Postgres => Dialect::postgres(),
            DialectKind::Mysql => Dialect::mysql(),
            DialectKind::Mssql => Dialect::mssql(),
        }
    }
}

impl Dialect {
    #[must_use]
    pub fn sqlite() -> Self {
        Self {
            literal_escapes: LiteralEscapes::Concat,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn postgres() -> Self {
        Self {
            char_function: "chr".into(),
            literal_escapes: LiteralEscapes::Concat,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn mysql() -> Self {
        Self {
            identifier_quote: QuotePair::symmetric('`'),
            char_function: "CHAR".into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn mssql() -> Self {
        Self {
            identifier_quote: QuotePair::new('[', ']'),
            concat_operator: "+".into(),
            char_function: "CHAR".into(),
            literal_escapes: LiteralEscapes::Concat,
            ..Self::default()
        }
    }

    /// Quote an identifier with this dialect's identifier pair; an embedded
    /// closing character is doubled.
    #[must_use]
    pub fn quote_identifier(&self, name: &str) -> String {
        let QuotePair { open, close } = self.identifier_quote;
        let mut out = String::with_capacity(name.len() + 2);
        out.push(open);
        for c in name.chars() {
            if c == close {
                out.push(c);
            }
            out.push(c);
        }
        out.push(close);
        out
    }

    /// Quote `value` as a string literal.
    ///
    /// ```rust
    /// use tracker_sql::prelude::*;
    ///
    /// assert_eq!(Dialect::default().quote_string_literal("O'Brien")?, "'O''Brien'");
    /// assert_eq!(Dialect::sqlite().quote_string_literal("a\nb")?, "'a' || char(10) || 'b'");
    /// # Ok::<(), TrackerDbError>(())
    /// ```
    ///
    /// # Errors
    /// Returns `TrackerDbError::Unimplemented` for DEL or any codepoint outside ASCII.
    pub fn quote_string_literal(&self, value: &str) -> Result<String, TrackerDbError> {
        self.try_quote_string_literal(value).map_err(|c| {
            TrackerDbError::Unimplemented(format!(
                "string literal containing {c:?} (U+{:04X})",
                u32::from(c)
            ))
        })
    }

    /// Same as [`Dialect::quote_string_literal`] but hands back the offending character.
    pub(crate) fn try_quote_string_literal(&self, value: &str) -> Result<String, char> {
        match self.literal_escapes {
            LiteralEscapes::Backslash => self.quote_with_backslashes(value),
            LiteralEscapes::Concat => self.quote_with_concat(value),
        }
    }

    fn quote_with_backslashes(&self, value: &str) -> Result<String, char> {
        let QuotePair { open, close } = self.string_quote;
        let mut out = String::with_capacity(value.len() + 2);
        out.push(open);
        for c in value.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\t' => out.push_str("\\t"),
                '\r' => out.push_str("\\r"),
                ' '..='~' => {
                    if c == close {
                        out.push(c);
                    }
                    out.push(c);
                }
                other => return Err(other),
            }
        }
        out.push(close);
        Ok(out)
    }

    fn quote_with_concat(&self, value: &str) -> Result<String, char> {
        let QuotePair { open, close } = self.string_quote;
        let mut runs: Vec<String> = Vec::new();
        let mut current: Option<String> = None;

        for c in value.chars() {
            match c {
                ' '..='~' => {
                    let run = current.get_or_insert_with(|| String::from(open));
                    if c == close {
                        run.push(c);
                    }
                    run.push(c);
                }
                c if u32::from(c) < 32 => {
                    if let Some(mut run) = current.take() {
                        run.push(close);
                        runs.push(run);
                    }
                    runs.push(format!("{}({})", self.char_function, u32::from(c)));
                }
                other => return Err(other),
            }
        }
        if let Some(mut run) = current.take() {
            run.push(close);
            runs.push(run);
        }

        if runs.is_empty() {
            return Ok(format!("{open}{close}"));
        }
        Ok(runs.join(&format!(" {} ", self.concat_operator)))
    }

    /// Render a bound value as SQL literal text.
    ///
    /// # Errors
    /// Returns `TrackerDbError::ParameterError` for non-finite reals and
    /// `TrackerDbError::Unimplemented` for text this dialect cannot quote.
    pub fn format_value(&self, value: &SqlValue) -> Result<String, TrackerDbError> {
        match value {
            SqlValue::Null => Ok(self.null_literal.clone()),
            SqlValue::Int(i) => Ok(i.to_string()),
            SqlValue::Float(f) if f.is_finite() => Ok(f.to_string()),
            SqlValue::Float(f) => Err(TrackerDbError::ParameterError(format!(
                "{f} has no SQL literal"
            ))),
            SqlValue::Text(s) => self.quote_string_literal(s),
            SqlValue::Bool(b) => self.quote_string_literal(if *b { "Y" } else { "N" }),
            SqlValue::Timestamp(dt) => {
                self.quote_string_literal(&dt.format("%Y-%m-%d %H:%M:%S%.f").to_string())
            }
            SqlValue::Blob(bytes) => {
                let mut out = String::with_capacity(bytes.len() * 2 + 3);
                out.push_str("X'");
                for b in bytes {
                    let _ = write!(out, "{b:02X}");
                }
                out.push('\'');
                Ok(out)
            }
        }
    }
}
