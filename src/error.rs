use std::fmt;

use crate::matcher::MatchError;
use crate::syntax;

/// An error returned by an [`Engine`](crate::Engine) operation.
#[derive(Clone, Debug)]
pub struct Error {
    kind: ErrorKind,
}

/// The kind of error that occurred.
#[derive(Clone, Debug)]
pub enum ErrorKind {
    /// The pattern failed to parse. Carries the offset of the failure.
    Syntax(syntax::Error),
    /// A matcher exceeded a resource budget (backtracks or wall clock).
    Match(MatchError),
    /// The pattern or input violated a configured limit.
    InvalidArgument(String),
}

impl Error {
    /// Return the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub(crate) fn pattern_too_long(len: usize, limit: usize) -> Error {
        Error {
            kind: ErrorKind::InvalidArgument(format!(
                "pattern length {} exceeds maximum {}",
                len, limit,
            )),
        }
    }

    pub(crate) fn input_too_long(len: usize, limit: usize) -> Error {
        Error {
            kind: ErrorKind::InvalidArgument(format!(
                "input length {} exceeds maximum {}",
                len, limit,
            )),
        }
    }
}

impl From<syntax::Error> for Error {
    fn from(err: syntax::Error) -> Error {
        Error { kind: ErrorKind::Syntax(err) }
    }
}

impl From<MatchError> for Error {
    fn from(err: MatchError) -> Error {
        Error { kind: ErrorKind::Match(err) }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Syntax(err) => Some(err),
            ErrorKind::Match(err) => Some(err),
            ErrorKind::InvalidArgument(_) => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            ErrorKind::Syntax(err) => write!(f, "regex parse error: {}", err),
            ErrorKind::Match(err) => err.fmt(f),
            ErrorKind::InvalidArgument(reason) => f.write_str(reason),
        }
    }
}
