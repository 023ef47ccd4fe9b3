use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::utf7;

/// With the exception of [`Flag::Custom`], these flags are system flags that
/// are pre-defined in [RFC 3501 section
/// 2.3.2](https://tools.ietf.org/html/rfc3501#section-2.3.2). All system
/// flags begin with `\` in the IMAP protocol.
///
/// A flag can be permanent or session-only on a per-flag basis. Permanent
/// flags are those which the client can add or remove from the message flags
/// permanently; that is, concurrent and subsequent sessions will see any
/// change in permanent flags.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub enum Flag<'a> {
    /// Message has been read
    Seen,

    /// Message has been answered
    Answered,

    /// Message is "flagged" for urgent/special attention
    Flagged,

    /// Message is "deleted" for removal by later EXPUNGE
    Deleted,

    /// Message has not completed composition (marked as a draft).
    Draft,

    /// Message is "recently" arrived in this mailbox. This session is the
    /// first session to have been notified about this message.
    Recent,

    /// The special flag `\*`, which a mailbox may list among its permanent
    /// flags to indicate that new keywords can be created. It never denotes
    /// a flag on a message and cannot be stored.
    MayCreate,

    /// A non-standard user- or server-defined flag.
    Custom(Cow<'a, str>),
}

impl Flag<'static> {
    fn system(s: &str) -> Option<Self> {
        match s {
            "\\Seen" => Some(Flag::Seen),
            "\\Answered" => Some(Flag::Answered),
            "\\Flagged" => Some(Flag::Flagged),
            "\\Deleted" => Some(Flag::Deleted),
            "\\Draft" => Some(Flag::Draft),
            "\\Recent" => Some(Flag::Recent),
            "\\*" => Some(Flag::MayCreate),
            _ => None,
        }
    }

    /// Helper function to transform Strings into owned Flags
    pub fn from_strs<S: ToString>(
        v: impl IntoIterator<Item = S>,
    ) -> impl Iterator<Item = Flag<'static>> {
        v.into_iter().map(|s| Flag::from(s.to_string()))
    }
}

impl<'a> Flag<'a> {
    /// Get an owned version of the [`Flag`].
    pub fn into_owned(self) -> Flag<'static> {
        match self {
            Flag::Custom(cow) => Flag::Custom(Cow::Owned(cow.into_owned())),
            Flag::Seen => Flag::Seen,
            Flag::Answered => Flag::Answered,
            Flag::Flagged => Flag::Flagged,
            Flag::Deleted => Flag::Deleted,
            Flag::Draft => Flag::Draft,
            Flag::Recent => Flag::Recent,
            Flag::MayCreate => Flag::MayCreate,
        }
    }
}

impl<'a> std::fmt::Display for Flag<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Flag::Seen => write!(f, "\\Seen"),
            Flag::Answered => write!(f, "\\Answered"),
            Flag::Flagged => write!(f, "\\Flagged"),
            Flag::Deleted => write!(f, "\\Deleted"),
            Flag::Draft => write!(f, "\\Draft"),
            Flag::Recent => write!(f, "\\Recent"),
            Flag::MayCreate => write!(f, "\\*"),
            Flag::Custom(ref s) => write!(f, "{}", s),
        }
    }
}

impl<'a> From<String> for Flag<'a> {
    fn from(s: String) -> Self {
        if let Some(f) = Flag::system(&s) {
            f
        } else {
            Flag::Custom(Cow::Owned(s))
        }
    }
}

impl<'a> From<&'a str> for Flag<'a> {
    fn from(s: &'a str) -> Self {
        if let Some(f) = Flag::system(s) {
            f
        } else {
            Flag::Custom(Cow::Borrowed(s))
        }
    }
}

/// Render the inside of the parenthesized STORE flag list.
///
/// System flags go through the fixed name table and come first, user flags
/// follow space-joined, optionally in modified UTF-7 when the server does
/// not take UTF-8 flag atoms. Returns `Ok(None)` when there is nothing to
/// store, which callers must treat as "skip the command entirely".
pub(crate) fn encode_flag_list(
    flags: &[Flag<'_>],
    utf7_user_flags: bool,
) -> Result<Option<String>> {
    let mut system = String::new();
    let mut user = String::new();

    for flag in flags {
        match flag {
            Flag::Custom(name) => {
                if !user.is_empty() {
                    user.push(' ');
                }
                if utf7_user_flags {
                    user.push_str(&utf7::encode(name));
                } else {
                    user.push_str(name);
                }
            }
            Flag::MayCreate => {
                // the system-flag enumeration is closed; \* never names a
                // message flag
                return Err(Error::UnknownSystemFlag(flag.to_string()));
            }
            Flag::Seen => push_system(&mut system, "\\Seen"),
            Flag::Answered => push_system(&mut system, "\\Answered"),
            Flag::Flagged => push_system(&mut system, "\\Flagged"),
            Flag::Deleted => push_system(&mut system, "\\Deleted"),
            Flag::Draft => push_system(&mut system, "\\Draft"),
            Flag::Recent => push_system(&mut system, "\\Recent"),
        }
    }

    Ok(match (system.is_empty(), user.is_empty()) {
        (true, true) => None,
        (false, true) => Some(system),
        (true, false) => Some(user),
        (false, false) => Some(format!("{} {}", system, user)),
    })
}

fn push_system(list: &mut String, name: &str) {
    if !list.is_empty() {
        list.push(' ');
    }
    list.push_str(name);
}
