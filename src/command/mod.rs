//! The batched command execution loop shared by COPY and STORE.
//!
//! Both commands face the same problem: an identifier set of arbitrary size
//! has to go out over a protocol whose command lines are length-bounded, so
//! one logical operation becomes N wire commands against the same
//! connection, each followed by its own response round. The loop lives
//! here; the commands supply hooks for their command text and for whatever
//! structured reply they care about.

mod copy;
mod store;

pub use self::copy::CopyCommand;
pub use self::store::{StoreAction, StoreCommand};

use std::borrow::Cow;
use std::io::{Read, Write};

use imap_proto::{Response, Status};
use log::debug;

use crate::error::{Error, ParseError, Result};
use crate::mailbox::Mailbox;

/// Room reserved for the `aNNNNNNNNNN ` tag prefix when deriving budgets.
const TAG_RESERVE: usize = 12;
/// Room for the terminating CRLF.
const CRLF_LEN: usize = 2;

/// Default bound on one full command line, including tag and CRLF.
///
/// RFC 2683 advises clients to stay below 1000 octets per line, but servers
/// in practice take far more; 8 KiB matches Dovecot's default limit.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 8 * 1024;

/// Knobs that vary by server rather than by command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BulkConfig {
    /// Upper bound for one command line, including tag and CRLF. Sequence
    /// sets are split across as many lines as it takes to stay below this.
    pub max_line_length: usize,
    /// Encode non-ASCII user flags as modified UTF-7. Whether that is
    /// needed depends on the server's capabilities, which the caller knows
    /// and this crate does not.
    pub utf7_user_flags: bool,
}

impl Default for BulkConfig {
    fn default() -> BulkConfig {
        BulkConfig {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            utf7_user_flags: false,
        }
    }
}

impl BulkConfig {
    /// Byte budget left for a sequence set once `skeleton` bytes of fixed
    /// command text are accounted for.
    pub(crate) fn sequence_budget(&self, skeleton: usize) -> usize {
        self.max_line_length
            .saturating_sub(skeleton + TAG_RESERVE + CRLF_LEN)
    }
}

/// Verdict a command hands back for one server response.
pub(crate) enum Handling {
    /// The reply this command was waiting for has been consumed; stop
    /// forwarding responses for the rest of the batch.
    Satisfied,
    /// Keep forwarding.
    AwaitFurther,
}

/// Per-batch progress of the execution loop.
enum BatchState {
    AwaitingResponse,
    Complete,
}

/// Hook surface for a command executed batch-wise over one connection.
///
/// One implementation per command kind; the executor in
/// [`Mailbox::run_bulk`] owns the loop.
pub(crate) trait BulkCommand {
    type Output;

    /// Sequence-set argument strings, one command line each.
    fn batches(&self) -> &[String];

    /// Full (untagged) command text for batch `index`.
    fn build_command(&self, index: usize) -> String;

    /// When true, responses are drained without interpretation.
    fn fast(&self) -> bool;

    /// Inspect one response belonging to the current batch. `line` is the
    /// raw wire text that `response` was parsed from; structured reply
    /// parsing works on the raw text since response-code placement varies
    /// between servers.
    fn handle_response(&mut self, line: &[u8], response: &Response<'_>) -> Handling;

    /// Result when the command never reaches the wire: nothing to address,
    /// nothing to change, or nothing in the mailbox.
    fn default_value(&mut self) -> Self::Output;

    /// Result after all batches completed.
    fn take_output(&mut self) -> Self::Output;
}

impl<T: Read + Write> Mailbox<T> {
    /// Drive a command through all of its batches.
    ///
    /// Transport failures and `NO`/`BAD` completions abort immediately;
    /// batches already sent have taken effect server-side and are not
    /// rolled back.
    pub(crate) fn run_bulk<C: BulkCommand>(&mut self, cmd: &mut C) -> Result<C::Output> {
        if self.message_count() == 0 || cmd.batches().is_empty() {
            return Ok(cmd.default_value());
        }

        let total = cmd.batches().len();
        for index in 0..total {
            let text = cmd.build_command(index);
            let tag = self.session.run_command(&text)?;
            debug!("batch {}/{}: {} bytes on tag {}", index + 1, total, text.len(), tag);
            self.read_batch_responses(cmd, tag.as_bytes())?;
        }
        Ok(cmd.take_output())
    }

    /// Read responses until the tagged completion for `tag` arrives.
    fn read_batch_responses<C: BulkCommand>(&mut self, cmd: &mut C, tag: &[u8]) -> Result<()> {
        let mut state = BatchState::AwaitingResponse;
        let mut satisfied = cmd.fast();

        while let BatchState::AwaitingResponse = state {
            let mut line: Vec<u8> = Vec::new();
            // responses carrying a literal span lines; read until one parses
            loop {
                self.session.readline(&mut line)?;
                match imap_proto::parser::parse_response(&line) {
                    Ok((_, response)) => {
                        match &response {
                            Response::Done {
                                tag: response_tag,
                                status,
                                information,
                                ..
                            } => {
                                if response_tag.as_bytes() != tag {
                                    return Err(Error::Parse(ParseError::Invalid(line.clone())));
                                }
                                match status {
                                    Status::Ok => {
                                        if !satisfied {
                                            // the reply a command waits for
                                            // usually rides the tagged OK
                                            cmd.handle_response(&line, &response);
                                        }
                                        state = BatchState::Complete;
                                    }
                                    Status::No => {
                                        return Err(Error::No(explanation(information)));
                                    }
                                    Status::Bad => {
                                        return Err(Error::Bad(explanation(information)));
                                    }
                                    _ => return Err(Error::ConnectionLost),
                                }
                            }
                            Response::Data {
                                status: Status::Bye,
                                ..
                            } => {
                                // the server is about to drop the connection
                                return Err(Error::ConnectionLost);
                            }
                            other => {
                                if !satisfied {
                                    if let Handling::Satisfied =
                                        cmd.handle_response(&line, other)
                                    {
                                        satisfied = true;
                                    }
                                }
                            }
                        }
                        break;
                    }
                    Err(nom::Err::Incomplete(_)) => continue,
                    Err(_) => {
                        return Err(Error::Parse(ParseError::Invalid(line.clone())));
                    }
                }
            }
        }
        Ok(())
    }
}

fn explanation(information: &Option<Cow<'_, str>>) -> String {
    information
        .as_ref()
        .map(|text| text.to_string())
        .unwrap_or_else(|| String::from("no explanation given"))
}
