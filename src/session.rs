use std::io::{Read, Write};

use bufstream::BufStream;

use crate::error::{Error, Result, ValidateError};

static TAG_PREFIX: &str = "a";
const INITIAL_TAG: u32 = 0;
const CR: u8 = 0x0d;
const LF: u8 = 0x0a;

macro_rules! quote {
    ($x:expr) => {
        format!("\"{}\"", $x.replace('\\', "\\\\").replace('"', "\\\""))
    };
}

/// Quote and escape a mailbox-name argument, rejecting characters that
/// would break the command line apart.
pub(crate) fn validate_str(value: &str) -> Result<String> {
    let quoted = quote!(value);
    if quoted.contains('\n') {
        return Err(Error::Validate(ValidateError('\n')));
    }
    if quoted.contains('\r') {
        return Err(Error::Validate(ValidateError('\r')));
    }
    Ok(quoted)
}

/// Handle to the command stream of one IMAP connection.
///
/// A `Session` owns the line discipline only: it allocates command tags,
/// appends CRLF on the way out and reads single LF-terminated lines on the
/// way back in. Greeting, authentication and mailbox selection are the
/// caller's business — the stream handed to [`Session::new`] must already
/// sit between commands of an authenticated, selected connection.
#[derive(Debug)]
pub struct Session<T: Read + Write> {
    stream: BufStream<T>,
    tag: u32,
    /// Activate wire tracing: commands and responses are printed as `C:`
    /// and `S:` lines.
    pub debug: bool,
}

impl<T: Read + Write> Session<T> {
    /// Creates a new session over the given stream.
    pub fn new(stream: T) -> Session<T> {
        Session {
            stream: BufStream::new(stream),
            tag: INITIAL_TAG,
            debug: false,
        }
    }

    /// Tear the session down and hand back the underlying stream.
    pub fn into_inner(self) -> Result<T> {
        Ok(self.stream.into_inner()?)
    }

    /// Send one tagged command line; returns the tag it was assigned.
    pub(crate) fn run_command(&mut self, untagged_command: &str) -> Result<String> {
        self.tag += 1;
        let tag = format!("{}{}", TAG_PREFIX, self.tag);
        let line = format!("{} {}", tag, untagged_command);
        self.write_line(line.as_bytes())?;
        Ok(tag)
    }

    /// Append one line (through the LF) onto `into`.
    pub(crate) fn readline(&mut self, into: &mut Vec<u8>) -> Result<usize> {
        use std::io::BufRead;
        let read = self.stream.read_until(LF, into)?;
        if read == 0 {
            return Err(Error::ConnectionLost);
        }

        if self.debug {
            let len = into.len();
            print!("S: {}", String::from_utf8_lossy(&into[len - read..]));
        }

        Ok(read)
    }

    fn write_line(&mut self, buf: &[u8]) -> Result<()> {
        self.stream.write_all(buf)?;
        self.stream.write_all(&[CR, LF])?;
        self.stream.flush()?;
        if self.debug {
            println!("C: {}", String::from_utf8_lossy(buf));
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn get_ref(&self) -> &T {
        self.stream.get_ref()
    }
}
