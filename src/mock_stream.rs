use std::io::{Error, ErrorKind, Read, Result, Write};

/// Scripted stream for driving a session in tests: reads serve a pre-canned
/// response script, writes are captured for byte-exact assertions.
pub struct MockStream {
    script: Vec<u8>,
    read_pos: usize,
    pub written_buf: Vec<u8>,
    err_on_read: bool,
    eof_on_read: bool,
}

impl MockStream {
    pub fn new(script: impl Into<Vec<u8>>) -> MockStream {
        MockStream {
            script: script.into(),
            read_pos: 0,
            written_buf: Vec::new(),
            err_on_read: false,
            eof_on_read: false,
        }
    }

    pub fn empty() -> MockStream {
        MockStream::new(Vec::new())
    }

    /// Every read reports end-of-file, as if the peer closed the socket.
    pub fn with_eof(mut self) -> MockStream {
        self.eof_on_read = true;
        self
    }

    /// Every read fails, as if the transport broke mid-command.
    pub fn with_err(mut self) -> MockStream {
        self.err_on_read = true;
        self
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.eof_on_read {
            return Ok(0);
        }
        if self.err_on_read {
            return Err(Error::new(ErrorKind::Other, "simulated transport failure"));
        }
        let remaining = &self.script[self.read_pos..];
        if remaining.is_empty() {
            return Err(Error::new(ErrorKind::UnexpectedEof, "response script exhausted"));
        }
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.read_pos += n;
        Ok(n)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.written_buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
