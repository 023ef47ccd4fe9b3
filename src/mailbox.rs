use std::io::{Read, Write};

use crate::command::BulkConfig;
use crate::session::Session;

/// A selected mailbox that owns the connection commands run on.
///
/// One mailbox wraps exactly one [`Session`], and only one command can be
/// in flight on it at a time — IMAP is a stateful request/response protocol
/// over a single stream. Concurrency across mailboxes or accounts lives
/// entirely with the caller, one connection each.
///
/// `message_count` is the `EXISTS` count the caller observed when it
/// selected the mailbox. Commands use it to skip the wire entirely when
/// the mailbox is empty.
#[derive(Debug)]
pub struct Mailbox<T: Read + Write> {
    pub(crate) session: Session<T>,
    message_count: u32,
    pub(crate) config: BulkConfig,
}

impl<T: Read + Write> Mailbox<T> {
    /// Wrap a session whose connection has this mailbox selected.
    pub fn new(session: Session<T>, message_count: u32) -> Mailbox<T> {
        Mailbox::with_config(session, message_count, BulkConfig::default())
    }

    /// Like [`Mailbox::new`], with explicit server tuning.
    pub fn with_config(
        session: Session<T>,
        message_count: u32,
        config: BulkConfig,
    ) -> Mailbox<T> {
        Mailbox {
            session,
            message_count,
            config,
        }
    }

    /// Number of messages in the selected mailbox.
    pub fn message_count(&self) -> u32 {
        self.message_count
    }

    /// Update the message count after the caller observes an untagged
    /// `EXISTS` or an expunge on its own channel.
    pub fn set_message_count(&mut self, message_count: u32) {
        self.message_count = message_count;
    }

    /// Hand the session back, e.g. to select another mailbox.
    pub fn into_session(self) -> Session<T> {
        self.session
    }
}
