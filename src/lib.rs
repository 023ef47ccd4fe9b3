//! Batched COPY and STORE execution for IMAP connections.
//!
//! This crate drives the two bulk message operations of
//! [RFC 3501](https://tools.ietf.org/html/rfc3501) — `COPY` and `STORE` —
//! against an already-authenticated, already-selected connection. Large
//! identifier sets are compressed to IMAP sequence-set syntax and split
//! across as few command lines as the server's line-length bound allows,
//! and `COPYUID` replies ([RFC 4315](https://tools.ietf.org/html/rfc4315))
//! are correlated back onto the caller's UIDs.
//!
//! Everything around the two commands stays with the caller: connecting,
//! TLS, authentication, selecting the mailbox, and retry policy. The
//! engine owns one connection for the duration of one command and issues
//! strictly sequential, blocking rounds on it.
//!
//! # Usage
//!
//! ```no_run
//! use imap_bulk::{CopyCommand, Flag, Mailbox, Session, StoreAction, StoreCommand};
//!
//! # fn run(stream: std::net::TcpStream) -> imap_bulk::error::Result<()> {
//! // `stream` is connected, authenticated and has INBOX selected with
//! // 120 messages; all of that happened before this crate got involved.
//! let mut mailbox = Mailbox::new(Session::new(stream), 120);
//!
//! let copied = CopyCommand::uids(&mut mailbox, &[7, 32, 44, 45], "Archive", false)?
//!     .execute()?;
//! assert_eq!(copied.len(), 4);
//!
//! StoreCommand::uids(&mut mailbox, &[7, 32], &[Flag::Seen], StoreAction::Add, true)?
//!     .execute()?;
//! # Ok(())
//! # }
//! ```

mod command;
mod conn;
mod mailbox;
mod session;
mod types;
mod utf7;

pub mod error;
pub mod sequence;

pub use crate::command::{
    BulkConfig, CopyCommand, StoreAction, StoreCommand, DEFAULT_MAX_LINE_LENGTH,
};
pub use crate::conn::{Connection, ImapConnection};
pub use crate::mailbox::Mailbox;
pub use crate::session::Session;
pub use crate::types::{Flag, Seq, Uid};

#[cfg(test)]
mod mock_stream;
