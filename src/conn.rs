use std::fmt::{Debug, Formatter};
use std::io::{Read, Write};

/// Trait of a read/write stream carrying an IMAP command channel.
///
/// Connecting, upgrading to TLS, authenticating and selecting a mailbox all
/// happen before a stream is handed to this crate, so the only thing asked
/// of the transport is byte I/O.
pub trait ImapConnection: Read + Write + Send + private::Sealed {}

impl<T> ImapConnection for T where T: Read + Write + Send {}

impl Debug for dyn ImapConnection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Imap connection")
    }
}

/// A boxed connection type, for callers that want to erase their transport.
pub type Connection = Box<dyn ImapConnection>;

mod private {
    use super::{Read, Write};

    pub trait Sealed {}

    impl<T> Sealed for T where T: Read + Write {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_stream::MockStream;
    use crate::session::Session;

    #[test]
    fn boxed_connection_drives_a_session() {
        let conn: Connection = Box::new(MockStream::empty());
        let mut session = Session::new(conn);
        session.run_command("NOOP").unwrap();
    }
}
