/// The quote kinds a template or script may open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Quote {
    Single,
    Double,
    Backtick,
    Bracket,
}

impl Quote {
    pub(super) fn opening(c: char) -> Option<Quote> {
        match c {
            '\'' => Some(Quote::Single),
            '"' => Some(Quote::Double),
            '`' => Some(Quote::Backtick),
            '[' => Some(Quote::Bracket),
            _ => None,
        }
    }

    pub(super) fn opener(self) -> char {
        match self {
            Quote::Single => '\'',
            Quote::Double => '"',
            Quote::Backtick => '`',
            Quote::Bracket => '[',
        }
    }

    pub(super) fn closer(self) -> char {
        match self {
            Quote::Bracket => ']',
            other => other.opener(),
        }
    }

    /// Doubling the quote inside the quoted text yields one literal quote.
    pub(super) fn doubles(self) -> bool {
        !matches!(self, Quote::Bracket)
    }

    /// Backslash escapes are honoured inside the quoted text.
    pub(super) fn escapes(self) -> bool {
        !matches!(self, Quote::Bracket)
    }

    pub(super) fn is_string_literal(self) -> bool {
        matches!(self, Quote::Single)
    }
}

/// Script lexer state.
#[derive(Debug, Clone, Copy)]
pub(super) enum State {
    Normal,
    Quoted(Quote),
    LineComment,
    BlockComment,
}
