//! Types shared across the bulk command engine.

/// From section [2.3.1.1 of RFC 3501](https://tools.ietf.org/html/rfc3501#section-2.3.1.1).
///
/// A 32-bit value assigned to each message, which when combined with the
/// mailbox's unique identifier validity value forms a 64-bit value that will
/// not refer to any other message in the mailbox. Unique identifiers are
/// assigned in a strictly ascending fashion and, unlike message sequence
/// numbers, are stable across sessions.
pub type Uid = u32;

/// From section [2.3.1.2 of RFC 3501](https://tools.ietf.org/html/rfc3501#section-2.3.1.2).
///
/// A relative position from 1 to the number of messages in the mailbox,
/// ordered by ascending unique identifier. Message sequence numbers are
/// reassigned as messages are expunged during the session.
pub type Seq = u32;

pub(crate) mod flag;
pub use self::flag::Flag;
