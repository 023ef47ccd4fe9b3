//! Batched `COPY` / `UID COPY` with `COPYUID` correlation.

use std::collections::HashMap;
use std::io::{Read, Write};

use imap_proto::{Response, Status};
use lazy_static::lazy_static;
use log::warn;
use regex::Regex;

use super::{BulkCommand, Handling};
use crate::error::{Error, Result, ValidateError};
use crate::mailbox::Mailbox;
use crate::sequence;
use crate::session::validate_str;
use crate::types::{Seq, Uid};
use crate::utf7;

lazy_static! {
    static ref COPYUID: Regex = Regex::new(r"(?i)\bCOPYUID\b").unwrap();
}

/// A batched message copy into another mailbox.
///
/// Servers with `UIDPLUS` report where the copies landed through a
/// `COPYUID` response code ([RFC 4315](https://tools.ietf.org/html/rfc4315));
/// a non-fast copy collects those reports and maps every requested UID to
/// the UID its copy received in the destination mailbox.
///
/// Construct one with [`CopyCommand::uids`], [`CopyCommand::all`] or
/// [`CopyCommand::range`], then call [`CopyCommand::execute`].
pub struct CopyCommand<'a, T: Read + Write> {
    mailbox: &'a mut Mailbox<T>,
    op: CopyOp,
}

struct CopyOp {
    batches: Vec<String>,
    destination: String,
    uid_command: bool,
    fast: bool,
    /// Position of each requested UID in the caller's argument order.
    positions: HashMap<Uid, usize>,
    results: Vec<Option<Uid>>,
}

impl<'a, T: Read + Write> CopyCommand<'a, T> {
    /// Copy the messages with the given UIDs into `destination`.
    ///
    /// `uids` must be sorted ascending and duplicate-free. With
    /// `fast == false` the result maps each requested UID to the UID
    /// assigned in the destination; with `fast == true` the `COPYUID`
    /// replies are not inspected and the result is empty.
    pub fn uids(
        mailbox: &'a mut Mailbox<T>,
        uids: &[Uid],
        destination: &str,
        fast: bool,
    ) -> Result<CopyCommand<'a, T>> {
        let destination = prepare_mailbox_name(destination)?;
        let skeleton = skeleton_len(true, &destination);
        let budget = mailbox.config.sequence_budget(skeleton);
        let batches = sequence::encode(uids, false, budget);

        let (positions, results) = if fast {
            (HashMap::new(), Vec::new())
        } else {
            (
                uids.iter().copied().enumerate().map(|(i, uid)| (uid, i)).collect(),
                vec![None; uids.len()],
            )
        };

        Ok(CopyCommand {
            mailbox,
            op: CopyOp {
                batches,
                destination,
                uid_command: true,
                fast,
                positions,
                results,
            },
        })
    }

    /// Copy every message in the mailbox (sequence set `1:*`).
    pub fn all(mailbox: &'a mut Mailbox<T>, destination: &str) -> Result<CopyCommand<'a, T>> {
        let destination = prepare_mailbox_name(destination)?;
        Ok(CopyCommand {
            mailbox,
            op: CopyOp {
                batches: vec![String::from("1:*")],
                destination,
                uid_command: false,
                fast: true,
                positions: HashMap::new(),
                results: Vec::new(),
            },
        })
    }

    /// Copy a contiguous range of message sequence numbers.
    pub fn range(
        mailbox: &'a mut Mailbox<T>,
        first: Seq,
        last: Seq,
        destination: &str,
    ) -> Result<CopyCommand<'a, T>> {
        let destination = prepare_mailbox_name(destination)?;
        let skeleton = skeleton_len(false, &destination);
        let budget = mailbox.config.sequence_budget(skeleton);
        // a range is one token, the budget never splits it
        let batches = sequence::encode(&[first, last], true, budget);
        Ok(CopyCommand {
            mailbox,
            op: CopyOp {
                batches,
                destination,
                uid_command: false,
                fast: true,
                positions: HashMap::new(),
                results: Vec::new(),
            },
        })
    }

    /// Run the copy, one command line per batch.
    ///
    /// In non-fast UID mode the returned vector parallels the requested UID
    /// list; an entry is `None` when no `COPYUID` reply accounted for that
    /// UID. An empty UID list, an empty mailbox, or fast mode all yield an
    /// empty vector without touching the connection (beyond the batches a
    /// fast copy itself sends).
    pub fn execute(self) -> Result<Vec<Option<Uid>>> {
        let CopyCommand { mailbox, mut op } = self;
        mailbox.run_bulk(&mut op)
    }
}

impl BulkCommand for CopyOp {
    type Output = Vec<Option<Uid>>;

    fn batches(&self) -> &[String] {
        &self.batches
    }

    fn build_command(&self, index: usize) -> String {
        let set = &self.batches[index];
        if self.uid_command {
            format!("UID COPY {} {}", set, self.destination)
        } else {
            format!("COPY {} {}", set, self.destination)
        }
    }

    fn fast(&self) -> bool {
        self.fast
    }

    fn handle_response(&mut self, line: &[u8], response: &Response<'_>) -> Handling {
        // COPYUID rides the tagged OK on most servers and an untagged OK on
        // some; anything else cannot carry it
        let ok = matches!(
            response,
            Response::Done {
                status: Status::Ok,
                ..
            } | Response::Data {
                status: Status::Ok,
                ..
            }
        );
        if !ok {
            return Handling::AwaitFurther;
        }

        let text = String::from_utf8_lossy(line);
        match parse_copyuid(&text) {
            Ok((source, destination)) => {
                self.fill(&source, &destination);
                Handling::Satisfied
            }
            Err(CopyUidError::Missing) => Handling::AwaitFurther,
            Err(CopyUidError::Malformed) => {
                warn!(
                    "unparsable COPYUID in {:?}, destination UIDs stay unresolved",
                    text.trim_end()
                );
                Handling::Satisfied
            }
        }
    }

    fn default_value(&mut self) -> Vec<Option<Uid>> {
        Vec::new()
    }

    fn take_output(&mut self) -> Vec<Option<Uid>> {
        std::mem::take(&mut self.results)
    }
}

impl CopyOp {
    /// Correlate one `COPYUID` reply onto the result array.
    fn fill(&mut self, source: &str, destination: &str) {
        let (source, destination) = match (sequence::expand(source), sequence::expand(destination))
        {
            (Some(source), Some(destination)) => (source, destination),
            _ => {
                warn!(
                    "COPYUID sets {:?} / {:?} do not expand, destination UIDs stay unresolved",
                    source, destination
                );
                return;
            }
        };

        // equal cardinality is the server's obligation; zip drops any
        // excess on either side instead of trusting it
        for (source_uid, destination_uid) in source.into_iter().zip(destination) {
            if let Some(&position) = self.positions.get(&source_uid) {
                self.results[position] = Some(destination_uid);
            }
        }
    }
}

/// Destination names go out as modified UTF-7, quoted and escaped.
///
/// Line breaks are rejected on the raw name: the encoder would shift them
/// into base64 and the command would silently address a different mailbox.
fn prepare_mailbox_name(name: &str) -> Result<String> {
    if name.contains('\n') {
        return Err(Error::Validate(ValidateError('\n')));
    }
    if name.contains('\r') {
        return Err(Error::Validate(ValidateError('\r')));
    }
    validate_str(&utf7::encode(name))
}

/// Fixed bytes of a copy line once the sequence set is taken out:
/// `["UID "] "COPY " <set> " " <destination>`.
fn skeleton_len(uid_command: bool, destination: &str) -> usize {
    let keyword = if uid_command { "UID COPY " } else { "COPY " };
    keyword.len() + 1 + destination.len()
}

#[derive(Debug)]
enum CopyUidError {
    Missing,
    Malformed,
}

/// Extract the source and destination sequence sets from a response line
/// carrying a `COPYUID` response code.
///
/// After the (case-insensitive) token, the line must hold at least three
/// whitespace-separated atoms: the destination's UIDVALIDITY, the source
/// set and the destination set, the last one optionally closed by the
/// response-code bracket.
fn parse_copyuid(text: &str) -> std::result::Result<(String, String), CopyUidError> {
    let found = COPYUID.find(text).ok_or(CopyUidError::Missing)?;
    let mut atoms = text[found.end()..].split_whitespace();

    let _uidvalidity = atoms.next().ok_or(CopyUidError::Malformed)?;
    let source = atoms.next().ok_or(CopyUidError::Malformed)?;
    let destination = atoms.next().ok_or(CopyUidError::Malformed)?;
    let destination = destination.strip_suffix(']').unwrap_or(destination);

    Ok((source.to_string(), destination.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::BulkConfig;
    use crate::error::Error;
    use crate::mock_stream::MockStream;
    use crate::session::Session;

    fn mailbox_with(script: &str, message_count: u32) -> Mailbox<MockStream> {
        Mailbox::new(Session::new(MockStream::new(script)), message_count)
    }

    fn written(mailbox: &Mailbox<MockStream>) -> Vec<u8> {
        mailbox.session.get_ref().written_buf.clone()
    }

    #[test]
    fn copyuid_is_correlated_onto_source_uids() {
        let mut mailbox = mailbox_with("a1 OK [COPYUID 1185853191 7,32 44:45] Completed\r\n", 9);
        let copied = CopyCommand::uids(&mut mailbox, &[7, 32], "MEETING", false)
            .unwrap()
            .execute()
            .unwrap();
        assert_eq!(vec![Some(44), Some(45)], copied);
        assert_eq!(b"a1 UID COPY 7,32 \"MEETING\"\r\n".to_vec(), written(&mailbox));
    }

    #[test]
    fn copyuid_on_an_untagged_ok_is_accepted() {
        let mut mailbox = mailbox_with(
            "* OK [COPYUID 1185853191 7 44] Copied.\r\na1 OK Completed\r\n",
            9,
        );
        let copied = CopyCommand::uids(&mut mailbox, &[7], "Archive", false)
            .unwrap()
            .execute()
            .unwrap();
        assert_eq!(vec![Some(44)], copied);
    }

    #[test]
    fn untagged_noise_is_tolerated() {
        let mut mailbox = mailbox_with(
            "* 5 EXISTS\r\na1 OK [COPYUID 1 7 44] Completed\r\n",
            9,
        );
        let copied = CopyCommand::uids(&mut mailbox, &[7], "Archive", false)
            .unwrap()
            .execute()
            .unwrap();
        assert_eq!(vec![Some(44)], copied);
    }

    #[test]
    fn missing_copyuid_leaves_the_result_unresolved() {
        let mut mailbox = mailbox_with("a1 OK Completed\r\n", 9);
        let copied = CopyCommand::uids(&mut mailbox, &[7, 32], "Archive", false)
            .unwrap()
            .execute()
            .unwrap();
        assert_eq!(vec![None, None], copied);
    }

    #[test]
    fn malformed_copyuid_is_not_fatal() {
        let mut mailbox = mailbox_with("a1 OK [COPYUID 1185853191 7,32] Completed\r\n", 9);
        let copied = CopyCommand::uids(&mut mailbox, &[7, 32], "Archive", false)
            .unwrap()
            .execute()
            .unwrap();
        assert_eq!(vec![None, None], copied);
    }

    #[test]
    fn cardinality_mismatch_ignores_the_excess() {
        let mut mailbox = mailbox_with("a1 OK [COPYUID 1 7,32 44] Completed\r\n", 9);
        let copied = CopyCommand::uids(&mut mailbox, &[7, 32], "Archive", false)
            .unwrap()
            .execute()
            .unwrap();
        assert_eq!(vec![Some(44), None], copied);
    }

    #[test]
    fn large_sets_split_into_multiple_commands() {
        let config = BulkConfig {
            max_line_length: 30,
            ..BulkConfig::default()
        };
        let script = "a1 OK [COPYUID 9 1,3 101:102] Completed\r\n\
                      a2 OK [COPYUID 9 5,7 103:104] Completed\r\n";
        let mut mailbox =
            Mailbox::with_config(Session::new(MockStream::new(script)), 9, config);
        let copied = CopyCommand::uids(&mut mailbox, &[1, 3, 5, 7], "X", false)
            .unwrap()
            .execute()
            .unwrap();
        assert_eq!(vec![Some(101), Some(102), Some(103), Some(104)], copied);
        assert_eq!(
            b"a1 UID COPY 1,3 \"X\"\r\na2 UID COPY 5,7 \"X\"\r\n".to_vec(),
            written(&mailbox)
        );
    }

    #[test]
    fn empty_uid_set_sends_nothing() {
        let mut mailbox = mailbox_with("", 9);
        let copied = CopyCommand::uids(&mut mailbox, &[], "Archive", false)
            .unwrap()
            .execute()
            .unwrap();
        assert!(copied.is_empty());
        assert!(written(&mailbox).is_empty());
    }

    #[test]
    fn empty_mailbox_sends_nothing() {
        let mut mailbox = mailbox_with("", 0);
        let copied = CopyCommand::uids(&mut mailbox, &[7, 32], "Archive", false)
            .unwrap()
            .execute()
            .unwrap();
        assert!(copied.is_empty());
        assert!(written(&mailbox).is_empty());
    }

    #[test]
    fn fast_mode_skips_reply_parsing() {
        let mut mailbox = mailbox_with("a1 OK [COPYUID 1 7 44] Completed\r\n", 9);
        let copied = CopyCommand::uids(&mut mailbox, &[7], "Archive", true)
            .unwrap()
            .execute()
            .unwrap();
        assert!(copied.is_empty());
        assert_eq!(b"a1 UID COPY 7 \"Archive\"\r\n".to_vec(), written(&mailbox));
    }

    #[test]
    fn copy_all_addresses_by_sequence() {
        let mut mailbox = mailbox_with("a1 OK Completed\r\n", 3);
        let copied = CopyCommand::all(&mut mailbox, "Archive")
            .unwrap()
            .execute()
            .unwrap();
        assert!(copied.is_empty());
        assert_eq!(b"a1 COPY 1:* \"Archive\"\r\n".to_vec(), written(&mailbox));
    }

    #[test]
    fn copy_range_addresses_by_sequence() {
        let mut mailbox = mailbox_with("a1 OK Completed\r\n", 9);
        CopyCommand::range(&mut mailbox, 2, 4, "Archive")
            .unwrap()
            .execute()
            .unwrap();
        assert_eq!(b"a1 COPY 2:4 \"Archive\"\r\n".to_vec(), written(&mailbox));
    }

    #[test]
    fn destination_names_are_utf7_encoded_and_quoted() {
        let mut mailbox = mailbox_with("a1 OK Completed\r\n", 9);
        CopyCommand::uids(&mut mailbox, &[1], "Entwürfe", true)
            .unwrap()
            .execute()
            .unwrap();
        assert_eq!(
            b"a1 UID COPY 1 \"Entw&APw-rfe\"\r\n".to_vec(),
            written(&mailbox)
        );
    }

    #[test]
    fn destination_with_line_break_is_rejected_before_io() {
        let mut mailbox = mailbox_with("", 9);
        match CopyCommand::uids(&mut mailbox, &[1], "bad\r\nname", true) {
            Err(Error::Validate(_)) => {}
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }
        assert!(written(&mailbox).is_empty());
    }

    #[test]
    fn no_completion_aborts_the_batch_loop() {
        let mut mailbox = mailbox_with("a1 NO [OVERQUOTA] Quota exceeded\r\n", 9);
        let err = CopyCommand::uids(&mut mailbox, &[7], "Archive", false)
            .unwrap()
            .execute()
            .unwrap_err();
        match err {
            Error::No(_) => {}
            other => panic!("expected NO, got {:?}", other),
        }
    }

    #[test]
    fn untagged_bye_surfaces_as_connection_lost() {
        let mut mailbox = mailbox_with("* BYE Shutting down\r\n", 9);
        let err = CopyCommand::uids(&mut mailbox, &[7], "Archive", false)
            .unwrap()
            .execute()
            .unwrap_err();
        match err {
            Error::ConnectionLost => {}
            other => panic!("expected connection lost, got {:?}", other),
        }
    }

    #[test]
    fn transport_failure_propagates() {
        let mut mailbox = Mailbox::new(
            Session::new(MockStream::empty().with_err()),
            9,
        );
        let err = CopyCommand::uids(&mut mailbox, &[7], "Archive", false)
            .unwrap()
            .execute()
            .unwrap_err();
        match err {
            Error::Io(_) => {}
            other => panic!("expected io error, got {:?}", other),
        }
    }

    #[test]
    fn copyuid_atoms_parse() {
        let (source, destination) =
            parse_copyuid("a4 OK [CopyUID 1185853191 7,32 44:45] Completed").unwrap();
        assert_eq!("7,32", source);
        assert_eq!("44:45", destination);
    }

    #[test]
    fn copyuid_token_absent() {
        assert!(matches!(
            parse_copyuid("a4 OK Completed"),
            Err(CopyUidError::Missing)
        ));
    }

    #[test]
    fn copyuid_atom_shortage_is_malformed() {
        assert!(matches!(
            parse_copyuid("a4 OK [COPYUID 1185853191] Completed"),
            Err(CopyUidError::Malformed)
        ));
        assert!(matches!(
            parse_copyuid("a4 OK [COPYUID 1185853191 7,32]"),
            Err(CopyUidError::Malformed)
        ));
    }
}
