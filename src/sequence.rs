//! Compact sequence-set encoding for large identifier sets.
//!
//! IMAP addresses messages with the `sequence-set` grammar from [RFC 3501
//! section 9](https://tools.ietf.org/html/rfc3501#section-9): consecutive
//! runs collapse to `first:last`, singletons stay bare, and elements are
//! comma-joined. Command lines have a server-imposed length bound, so a
//! large set additionally has to be split across several command lines;
//! [`encode`] produces one argument string per line.

use crate::types::Uid;

/// Encode a sorted, duplicate-free identifier list into sequence-set
/// argument strings, none longer than `budget` bytes.
///
/// `budget` is what remains of the command line once the fixed command text
/// is accounted for; the caller derives it from its line-length
/// configuration. The split only ever happens between range tokens, so a
/// single token longer than the whole budget is still emitted intact —
/// every returned string is a valid sequence set on its own.
///
/// With `sequential == true` the caller asserts that `ids` is a gap-free
/// ascending run, and the whole set is emitted as one `first:last` token
/// without scanning the interior. The output is unspecified (but memory
/// safe) if that assertion is violated.
///
/// An empty `ids` produces no argument strings at all; callers short-circuit
/// to their default result without touching the connection.
pub fn encode(ids: &[Uid], sequential: bool, budget: usize) -> Vec<String> {
    if ids.is_empty() {
        return Vec::new();
    }

    if sequential {
        let first = ids[0];
        let last = ids[ids.len() - 1];
        return vec![range_token(first, last)];
    }

    let mut batches = Vec::new();
    let mut current = String::new();
    let mut i = 0;
    while i < ids.len() {
        let start = ids[i];
        let mut end = start;
        while i + 1 < ids.len() && ids[i + 1] == end + 1 {
            end = ids[i + 1];
            i += 1;
        }
        i += 1;

        let token = range_token(start, end);
        if current.is_empty() {
            current = token;
        } else if current.len() + 1 + token.len() <= budget {
            current.push(',');
            current.push_str(&token);
        } else {
            batches.push(std::mem::replace(&mut current, token));
        }
    }
    batches.push(current);
    batches
}

fn range_token(start: Uid, end: Uid) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{}:{}", start, end)
    }
}

/// Range-expand a sequence-set back into the identifier list it denotes.
///
/// This is the inverse of [`encode`] and is also what correlates `COPYUID`
/// reply sets with the requested UIDs. Returns `None` when the text is not
/// a plain numeric sequence set; `*` has no meaning without mailbox state
/// and is rejected. Reversed ranges (`9:7`) are normalized to ascending
/// order.
pub fn expand(set: &str) -> Option<Vec<Uid>> {
    let mut ids = Vec::new();
    for part in set.split(',') {
        match part.split_once(':') {
            None => ids.push(part.parse().ok()?),
            Some((a, b)) => {
                let mut lo: Uid = a.parse().ok()?;
                let mut hi: Uid = b.parse().ok()?;
                if lo > hi {
                    std::mem::swap(&mut lo, &mut hi);
                }
                ids.extend(lo..=hi);
            }
        }
    }
    Some(ids)
}
