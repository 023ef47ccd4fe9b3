//! Modified UTF-7, the encoding IMAP uses for non-ASCII mailbox names and
//! (on servers without UTF-8 support) flag atoms.
//!
//! [RFC 3501 section 5.1.3](https://tools.ietf.org/html/rfc3501#section-5.1.3)
//! modifies RFC 2152 UTF-7: the shift character is `&`, a literal `&` is
//! written `&-`, and the base64 alphabet uses `,` instead of `/` with no
//! padding. Only the encoding direction is needed here — everything this
//! crate sends is produced locally as UTF-8.

use std::borrow::Cow;

use base64::alphabet;
use base64::engine::general_purpose::NO_PAD;
use base64::engine::GeneralPurpose;
use base64::Engine as _;

const MUTF7: GeneralPurpose = GeneralPurpose::new(&alphabet::IMAP_MUTF7, NO_PAD);

/// Encode `s` as modified UTF-7.
///
/// Printable ASCII other than `&` passes through, `&` becomes `&-`, and any
/// other run of characters is shifted into base64-coded UTF-16BE. Strings
/// that need no shifting are returned borrowed.
pub(crate) fn encode(s: &str) -> Cow<'_, str> {
    if s.bytes().all(is_direct) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 8);
    let mut pending = String::new();
    for ch in s.chars() {
        if ch == '&' {
            flush_shifted(&mut out, &mut pending);
            out.push_str("&-");
        } else if ch.is_ascii() && is_direct(ch as u8) {
            flush_shifted(&mut out, &mut pending);
            out.push(ch);
        } else {
            pending.push(ch);
        }
    }
    flush_shifted(&mut out, &mut pending);
    Cow::Owned(out)
}

/// Close a pending shifted run: `&` + base64(UTF-16BE units) + `-`.
fn flush_shifted(out: &mut String, pending: &mut String) {
    if pending.is_empty() {
        return;
    }
    let mut units = Vec::with_capacity(pending.len() * 2);
    for unit in pending.encode_utf16() {
        units.extend_from_slice(&unit.to_be_bytes());
    }
    out.push('&');
    out.push_str(&MUTF7.encode(units));
    out.push('-');
    pending.clear();
}

fn is_direct(byte: u8) -> bool {
    (0x20..0x7f).contains(&byte) && byte != b'&'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through_borrowed() {
        assert!(matches!(encode("INBOX"), Cow::Borrowed("INBOX")));
        assert_eq!("Sent Messages", encode("Sent Messages"));
    }

    #[test]
    fn ampersand_is_escaped() {
        assert_eq!("Lost &- Found", encode("Lost & Found"));
    }

    #[test]
    fn non_ascii_runs_are_shifted() {
        assert_eq!("Entw&APw-rfe", encode("Entwürfe"));
        assert_eq!("&Jjo-!", encode("☺!"));
    }

    // examples from RFC 3501 section 5.1.3
    #[test]
    fn rfc_examples() {
        assert_eq!("~peter/mail/&U,BTFw-/&ZeVnLIqe-", encode("~peter/mail/台北/日本語"));
        assert_eq!("&U,BTF2XlZyyKng-", encode("台北日本語"));
    }

    #[test]
    fn control_characters_are_shifted_too() {
        assert_eq!("&AAE-", encode("\u{1}"));
    }
}
