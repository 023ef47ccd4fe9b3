//! Batched `STORE` / `UID STORE` flag updates.

use std::io::{Read, Write};

use imap_proto::Response;

use super::{BulkCommand, Handling};
use crate::error::Result;
use crate::mailbox::Mailbox;
use crate::sequence;
use crate::types::flag::encode_flag_list;
use crate::types::{Flag, Seq, Uid};

/// Whether a store adds or removes the given flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreAction {
    /// `+FLAGS` — set the flags on the addressed messages.
    Add,
    /// `-FLAGS` — clear the flags on the addressed messages.
    Remove,
}

impl StoreAction {
    fn sign(self) -> char {
        match self {
            StoreAction::Add => '+',
            StoreAction::Remove => '-',
        }
    }
}

/// A batched flag update against one selected mailbox.
///
/// Construct one with [`StoreCommand::uids`], [`StoreCommand::all`] or
/// [`StoreCommand::range`], then call [`StoreCommand::execute`]. An empty
/// flag set never reaches the wire.
pub struct StoreCommand<'a, T: Read + Write> {
    mailbox: &'a mut Mailbox<T>,
    op: StoreOp,
}

struct StoreOp {
    batches: Vec<String>,
    flag_list: String,
    action: StoreAction,
    silent: bool,
    uid_command: bool,
}

enum Target<'s> {
    Uids(&'s [Uid]),
    All,
    Range(Seq, Seq),
}

impl<'a, T: Read + Write> StoreCommand<'a, T> {
    /// Store `flags` on the messages with the given UIDs.
    ///
    /// `uids` must be sorted ascending and duplicate-free. `silent` asks
    /// the server to skip the per-message `FETCH FLAGS` echo.
    pub fn uids(
        mailbox: &'a mut Mailbox<T>,
        uids: &[Uid],
        flags: &[Flag<'_>],
        action: StoreAction,
        silent: bool,
    ) -> Result<StoreCommand<'a, T>> {
        StoreCommand::build(mailbox, Target::Uids(uids), flags, action, silent)
    }

    /// Store `flags` on every message in the mailbox (sequence set `1:*`).
    pub fn all(
        mailbox: &'a mut Mailbox<T>,
        flags: &[Flag<'_>],
        action: StoreAction,
        silent: bool,
    ) -> Result<StoreCommand<'a, T>> {
        StoreCommand::build(mailbox, Target::All, flags, action, silent)
    }

    /// Store `flags` on a contiguous range of message sequence numbers.
    pub fn range(
        mailbox: &'a mut Mailbox<T>,
        first: Seq,
        last: Seq,
        flags: &[Flag<'_>],
        action: StoreAction,
        silent: bool,
    ) -> Result<StoreCommand<'a, T>> {
        StoreCommand::build(mailbox, Target::Range(first, last), flags, action, silent)
    }

    fn build(
        mailbox: &'a mut Mailbox<T>,
        target: Target<'_>,
        flags: &[Flag<'_>],
        action: StoreAction,
        silent: bool,
    ) -> Result<StoreCommand<'a, T>> {
        let uid_command = matches!(&target, Target::Uids(_));

        let flag_list = match encode_flag_list(flags, mailbox.config.utf7_user_flags)? {
            Some(flag_list) => flag_list,
            // nothing to change: zero batches keeps the command off the wire
            None => {
                return Ok(StoreCommand {
                    mailbox,
                    op: StoreOp {
                        batches: Vec::new(),
                        flag_list: String::new(),
                        action,
                        silent,
                        uid_command,
                    },
                })
            }
        };

        let skeleton = skeleton_len(uid_command, silent, &flag_list);
        let budget = mailbox.config.sequence_budget(skeleton);
        let batches = match target {
            Target::Uids(uids) => sequence::encode(uids, false, budget),
            Target::All => vec![String::from("1:*")],
            Target::Range(first, last) => sequence::encode(&[first, last], true, budget),
        };

        Ok(StoreCommand {
            mailbox,
            op: StoreOp {
                batches,
                flag_list,
                action,
                silent,
                uid_command,
            },
        })
    }

    /// Run the store, one command line per batch.
    pub fn execute(self) -> Result<()> {
        let StoreCommand { mailbox, mut op } = self;
        mailbox.run_bulk(&mut op)
    }
}

impl BulkCommand for StoreOp {
    type Output = ();

    fn batches(&self) -> &[String] {
        &self.batches
    }

    fn build_command(&self, index: usize) -> String {
        let set = &self.batches[index];
        format!(
            "{}STORE {} {}FLAGS{} ({})",
            if self.uid_command { "UID " } else { "" },
            set,
            self.action.sign(),
            if self.silent { ".SILENT" } else { "" },
            self.flag_list,
        )
    }

    fn fast(&self) -> bool {
        // a silent store gets nothing back worth reading
        self.silent
    }

    fn handle_response(&mut self, _line: &[u8], _response: &Response<'_>) -> Handling {
        // non-silent stores echo `* n FETCH (FLAGS ...)` per message;
        // drained but not interpreted
        Handling::AwaitFurther
    }

    fn default_value(&mut self) {}

    fn take_output(&mut self) {}
}

/// Fixed bytes of a store line once the sequence set is taken out:
/// `["UID "] "STORE " <set> " " ("+"|"-") "FLAGS" [".SILENT"] " (" <flags> ")"`.
fn skeleton_len(uid_command: bool, silent: bool, flag_list: &str) -> usize {
    let keyword = if uid_command { "UID STORE " } else { "STORE " };
    let flags_word = if silent { "FLAGS.SILENT" } else { "FLAGS" };
    keyword.len() + 1 + 1 + flags_word.len() + 2 + flag_list.len() + 1
}
