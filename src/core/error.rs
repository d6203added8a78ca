use std::error::Error as StdError;
use std::fmt;

/// Failure raised by [`crate::core::decode::decode`]. Every variant carries the
/// byte offset into the input where the problem was detected.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    UnexpectedEnd { offset: usize },
    UnterminatedString { offset: usize },
    UnmatchedBracket { offset: usize, open: char },
    MalformedNumber { offset: usize, token: String },
    InvalidEscape { offset: usize },
    UnexpectedCharacter { offset: usize, found: char },
    TrailingCharacters { offset: usize },
    NestingTooDeep { offset: usize, limit: usize },
}

impl ParseError {
    pub fn offset(&self) -> usize {
        match self {
            ParseError::UnexpectedEnd { offset }
            | ParseError::UnterminatedString { offset }
            | ParseError::UnmatchedBracket { offset, .. }
            | ParseError::MalformedNumber { offset, .. }
            | ParseError::InvalidEscape { offset }
            | ParseError::UnexpectedCharacter { offset, .. }
            | ParseError::TrailingCharacters { offset }
            | ParseError::NestingTooDeep { offset, .. } => *offset,
        }
    }

    /// Stable short label used in diagnostics and CLI error payloads.
    pub fn category(&self) -> &'static str {
        match self {
            ParseError::UnexpectedEnd { .. } => "unexpected-end",
            ParseError::UnterminatedString { .. } => "unterminated-string",
            ParseError::UnmatchedBracket { .. } => "unmatched-bracket",
            ParseError::MalformedNumber { .. } => "malformed-number",
            ParseError::InvalidEscape { .. } => "invalid-escape",
            ParseError::UnexpectedCharacter { .. } => "unexpected-character",
            ParseError::TrailingCharacters { .. } => "trailing-characters",
            ParseError::NestingTooDeep { .. } => "nesting-too-deep",
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedEnd { offset } => {
                write!(f, "unexpected end of input at offset {offset}")
            }
            ParseError::UnterminatedString { offset } => {
                write!(f, "unterminated string starting at offset {offset}")
            }
            ParseError::UnmatchedBracket { offset, open } => {
                write!(f, "unmatched '{open}' at offset {offset}")
            }
            ParseError::MalformedNumber { offset, token } => {
                write!(f, "malformed number `{token}` at offset {offset}")
            }
            ParseError::InvalidEscape { offset } => {
                write!(f, "invalid escape sequence at offset {offset}")
            }
            ParseError::UnexpectedCharacter { offset, found } => {
                write!(f, "unexpected character {found:?} at offset {offset}")
            }
            ParseError::TrailingCharacters { offset } => {
                write!(f, "trailing characters after value at offset {offset}")
            }
            ParseError::NestingTooDeep { offset, limit } => {
                write!(f, "nesting deeper than {limit} levels at offset {offset}")
            }
        }
    }
}

impl StdError for ParseError {}

/// Failure raised by [`crate::core::encode::encode`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EncodeError {
    /// `path` is a dotted/indexed location such as `rows[2].score`.
    UnsupportedValue { path: String, reason: &'static str },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::UnsupportedValue { path, reason } => {
                if path.is_empty() {
                    write!(f, "unsupported value: {reason}")
                } else {
                    write!(f, "unsupported value at {path}: {reason}")
                }
            }
        }
    }
}

impl StdError for EncodeError {}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    NotFound,
    Conflict,
    Permission,
    Decode,
    Encode,
    Remote,
    Io,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    status: Option<u16>,
    code: Option<String>,
    offset: Option<usize>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            status: None,
            code: None,
            offset: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::new(ErrorKind::Decode)
            .with_message(format!("invalid json ({})", err.category()))
            .with_offset(err.offset())
            .with_source(err)
    }
}

impl From<EncodeError> for Error {
    fn from(err: EncodeError) -> Self {
        Error::new(ErrorKind::Encode)
            .with_message("failed to encode json")
            .with_source(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(status) = self.status {
            write!(f, " (status: {status})")?;
        }
        if let Some(code) = &self.code {
            write!(f, " (code: {code})")?;
        }
        if let Some(offset) = self.offset {
            write!(f, " (offset: {offset})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::Conflict => 4,
        ErrorKind::Permission => 5,
        ErrorKind::Decode => 6,
        ErrorKind::Encode => 7,
        ErrorKind::Remote => 8,
        ErrorKind::Io => 9,
    }
}
