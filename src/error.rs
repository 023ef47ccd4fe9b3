use std::error::Error as StdError;
use std::fmt;
use std::io::Error as IoError;
use std::result;

use bufstream::IntoInnerError as BufError;

/// A convenience wrapper around `Result` for [`Error`].
pub type Result<T> = result::Result<T, Error>;

/// A set of errors that can occur while driving bulk commands.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// An `io::Error` that occurred while trying to read or write to a network stream.
    Io(IoError),
    /// The connection was terminated unexpectedly, or the server announced `BYE`.
    ConnectionLost,
    /// A `BAD` completion from the IMAP server.
    Bad(String),
    /// A `NO` completion from the IMAP server.
    No(String),
    /// Error parsing a server response.
    Parse(ParseError),
    /// Error validating input data.
    Validate(ValidateError),
    /// A flag outside the closed system-flag table was handed to a STORE.
    ///
    /// Raised while the command is being built, before anything is sent.
    UnknownSystemFlag(String),
}

impl From<IoError> for Error {
    fn from(err: IoError) -> Error {
        Error::Io(err)
    }
}

impl<T> From<BufError<T>> for Error {
    fn from(err: BufError<T>) -> Error {
        Error::Io(err.into())
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<ValidateError> for Error {
    fn from(err: ValidateError) -> Error {
        Error::Validate(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => fmt::Display::fmt(e, f),
            Error::ConnectionLost => f.write_str("Connection lost"),
            Error::Bad(data) => write!(f, "Bad response: {}", data),
            Error::No(data) => write!(f, "No response: {}", data),
            Error::Parse(e) => fmt::Display::fmt(e, f),
            Error::Validate(e) => fmt::Display::fmt(e, f),
            Error::UnknownSystemFlag(flag) => {
                write!(f, "Unknown system flag: {}", flag)
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Parse(e) => Some(e),
            Error::Validate(e) => Some(e),
            _ => None,
        }
    }
}

/// An error parsing a server response.
#[derive(Debug)]
#[non_exhaustive]
pub enum ParseError {
    /// The server response could not be classified.
    Invalid(Vec<u8>),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Invalid(data) => write!(
                f,
                "Unable to parse response: {}",
                String::from_utf8_lossy(data).trim_end()
            ),
        }
    }
}

impl StdError for ParseError {}

/// An invalid character in a command argument.
#[derive(Debug)]
pub struct ValidateError(pub char);

impl fmt::Display for ValidateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // print the offending character in debug form, invalid ones are
        // often whitespace
        write!(f, "Invalid character in input: {:?}", self.0)
    }
}

impl StdError for ValidateError {}
