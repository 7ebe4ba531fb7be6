use std::{error, fmt, result};

use crate::source::Loc;

/// An error raised while compiling or linking a project.
///
/// Every error carries a message and, for errors detected in source
/// code, the location the diagnostic points at. Rendering with source
/// context is done by [`crate::source::SourceMap::render`].
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    loc: Option<Loc>,
}

/// The kind of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An invalid token was encountered.
    Lex,
    /// A preprocessing directive or macro expansion failed.
    Preprocess,
    /// The token stream does not form a valid program.
    Parse,
    /// A construct is well-formed but ill-typed.
    Type,
    /// A constant expression could not be evaluated.
    ConstEval,
    /// A symbol failed to resolve or executable memory was refused.
    Link,
    /// A compiler bug: an unreachable state was reached.
    Internal,
    /// An arena or the system allocator was exhausted.
    OutOfMemory,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>) -> Error {
        Error {
            kind,
            message: message.into(),
            loc: None,
        }
    }

    pub(crate) fn at(kind: ErrorKind, loc: Loc, message: impl Into<String>) -> Error {
        Error {
            kind,
            message: message.into(),
            loc: Some(loc),
        }
    }

    pub(crate) fn lex(loc: Loc, message: impl Into<String>) -> Error {
        Error::at(ErrorKind::Lex, loc, message)
    }

    pub(crate) fn preprocess(loc: Loc, message: impl Into<String>) -> Error {
        Error::at(ErrorKind::Preprocess, loc, message)
    }

    pub(crate) fn parse(loc: Loc, message: impl Into<String>) -> Error {
        Error::at(ErrorKind::Parse, loc, message)
    }

    pub(crate) fn type_error(loc: Loc, message: impl Into<String>) -> Error {
        Error::at(ErrorKind::Type, loc, message)
    }

    pub(crate) fn const_eval(loc: Loc, message: impl Into<String>) -> Error {
        Error::at(ErrorKind::ConstEval, loc, message)
    }

    pub(crate) fn link(message: impl Into<String>) -> Error {
        Error::new(ErrorKind::Link, message)
    }

    pub(crate) fn internal(file: &str, line: u32, message: &str) -> Error {
        Error::new(ErrorKind::Internal, format!("{file}:{line}: {message}"))
    }

    /// Get the kind of error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the diagnostic message, without source context.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source location the diagnostic points at, if any.
    pub fn loc(&self) -> Option<Loc> {
        self.loc
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl error::Error for Error {}

/// The `Result` type for this library.
pub type Result<T> = result::Result<T, Error>;

/// Raise an [`ErrorKind::Internal`] error tagged with the current file
/// and line, for states the compiler believes impossible.
macro_rules! internal_error {
    ($($arg:tt)*) => {
        return Err($crate::error::Error::internal(
            file!(),
            line!(),
            &format!($($arg)*),
        ))
    };
}

pub(crate) use internal_error;
