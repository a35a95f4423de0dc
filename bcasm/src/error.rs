use crate::parser::Rule;
use pest::error::{Error as PestError, LineColLocation};
use std::error::Error as StdError;
use std::fmt;

/// Classifies everything that can go wrong while assembling.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    /// The grammar rejected a line outright.
    Syntax,
    /// Content appeared before any section header.
    BadSection,
    /// The mnemonic names no instruction.
    UnknownOpcode,
    /// The instruction has the wrong number of operands.
    BadOperandCount,
    /// An operand has a kind the instruction does not accept.
    BadOperandShape,
    /// A label name was declared twice.
    DuplicateLabel,
    /// A data name was declared twice.
    DuplicateData,
    /// A label line with no name before the colon.
    EmptyLabel,
    /// A `_data` line that is not a valid `DB name[size]` declaration.
    MalformedDb,
    /// A numeric literal that cannot be used where it appeared.
    BadNumber,
    /// An operand references a name in neither symbol namespace.
    UnknownSymbol,
}

/// A fatal assembly error. No module is produced when one occurs.
///
/// Every error carries the one-based source line it was detected on.
#[derive(Clone, Debug)]
pub struct Error {
    kind: ErrorKind,
    line: usize,
    message: String,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, line: usize, message: String) -> Error {
        Error {
            kind,
            line,
            message,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn line(&self) -> usize {
        self.line
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl StdError for Error {}

impl From<PestError<Rule>> for Error {
    fn from(err: PestError<Rule>) -> Error {
        let line = match err.line_col {
            LineColLocation::Pos((line, _)) => line,
            LineColLocation::Span((line, _), _) => line,
        };
        let message = format!("{}", err.variant.message());
        Error::new(ErrorKind::Syntax, line, message)
    }
}
