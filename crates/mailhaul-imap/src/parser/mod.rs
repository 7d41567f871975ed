//! IMAP response parsing.
//!
//! The dialog hands back one raw reply buffer per command. The functions
//! here recover the pieces the synchronizer needs from those buffers:
//! tagged completion status, SELECT mailbox state, SEARCH UID lists, and
//! (in [`fetch`]) the literal-framed message payloads.

mod fetch;

pub use fetch::{FetchedMessage, parse_uid_fetch};

use crate::types::{MailboxStatus, Status, Uid, UidValidity};
use crate::{Error, Result};

/// Iterates over CRLF-terminated lines of a reply buffer.
///
/// Only valid for replies without literals; FETCH replies go through
/// [`parse_uid_fetch`], which honors literal framing.
fn lines(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    data.split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .filter(|line| !line.is_empty())
}

/// Finds the tagged completion line and returns its status and text.
///
/// # Errors
///
/// Returns [`Error::Truncated`] when no line carries the tag and
/// [`Error::Malformed`] when the status keyword is unknown.
pub fn tagged_status(data: &[u8], tag: &str) -> Result<(Status, String)> {
    for line in lines(data) {
        if line.len() > tag.len() && line.starts_with(tag.as_bytes()) && line[tag.len()] == b' ' {
            let rest = &line[tag.len() + 1..];
            let (keyword, text) = match rest.iter().position(|&b| b == b' ') {
                Some(sp) => (&rest[..sp], &rest[sp + 1..]),
                None => (rest, &[][..]),
            };
            let status = match keyword {
                b"OK" => Status::Ok,
                b"NO" => Status::No,
                b"BAD" => Status::Bad,
                other => {
                    return Err(Error::Malformed {
                        position: 0,
                        message: format!(
                            "unknown completion status {:?}",
                            String::from_utf8_lossy(other)
                        ),
                    });
                }
            };
            return Ok((status, String::from_utf8_lossy(text).into_owned()));
        }
    }
    Err(Error::Truncated(format!(
        "no tagged completion for {tag}"
    )))
}

/// Checks that the tagged completion is OK.
///
/// # Errors
///
/// Maps NO and BAD completions to [`Error::No`] and [`Error::Bad`].
pub fn check_ok(data: &[u8], tag: &str) -> Result<()> {
    match tagged_status(data, tag)? {
        (Status::Ok, _) => Ok(()),
        (Status::No, text) => Err(Error::No(text)),
        (Status::Bad, text) => Err(Error::Bad(text)),
    }
}

/// Extracts mailbox state from a SELECT reply.
///
/// `UIDVALIDITY <n>` may appear on any untagged line; EXISTS and RECENT
/// counts are collected when present.
///
/// # Errors
///
/// Returns [`Error::Protocol`] when no non-zero UIDVALIDITY is advertised,
/// and [`Error::No`]/[`Error::Bad`] when the server rejects the SELECT.
pub fn parse_select(data: &[u8], tag: &str) -> Result<MailboxStatus> {
    check_ok(data, tag)?;

    let mut uid_validity = None;
    let mut exists = 0;
    let mut recent = 0;

    for line in lines(data) {
        if !line.starts_with(b"* ") {
            continue;
        }
        if let Some(n) = number_after(line, b"UIDVALIDITY ") {
            uid_validity = UidValidity::new(n);
        } else if line.ends_with(b" EXISTS") {
            exists = leading_number(&line[2..]).unwrap_or(0);
        } else if line.ends_with(b" RECENT") {
            recent = leading_number(&line[2..]).unwrap_or(0);
        }
    }

    let uid_validity = uid_validity
        .ok_or_else(|| Error::Protocol("UIDVALIDITY missing from SELECT response".to_string()))?;

    Ok(MailboxStatus {
        uid_validity,
        exists,
        recent,
    })
}

/// Extracts the UID set from a `* SEARCH` reply.
///
/// An absent SEARCH line or a SEARCH line without numbers yields an empty
/// set. Order follows the server output.
///
/// # Errors
///
/// Returns [`Error::No`]/[`Error::Bad`] when the server rejects the SEARCH
/// and [`Error::Malformed`] when a listed UID is zero or not a number.
pub fn parse_search(data: &[u8], tag: &str) -> Result<Vec<Uid>> {
    check_ok(data, tag)?;

    let mut uids = Vec::new();
    for line in lines(data) {
        let Some(rest) = line.strip_prefix(b"* SEARCH".as_slice()) else {
            continue;
        };
        if !rest.is_empty() && rest[0] != b' ' {
            continue;
        }
        for word in rest.split(|&b| b == b' ').filter(|w| !w.is_empty()) {
            let n: u32 = std::str::from_utf8(word)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| Error::Malformed {
                    position: 0,
                    message: format!(
                        "invalid UID {:?} in SEARCH response",
                        String::from_utf8_lossy(word)
                    ),
                })?;
            let uid = Uid::new(n).ok_or_else(|| Error::Malformed {
                position: 0,
                message: "UID 0 in SEARCH response".to_string(),
            })?;
            uids.push(uid);
        }
    }
    Ok(uids)
}

/// Parses the decimal number following `pattern` anywhere in the line.
fn number_after(line: &[u8], pattern: &[u8]) -> Option<u32> {
    let start = line
        .windows(pattern.len())
        .position(|w| w == pattern)?
        + pattern.len();
    leading_number(&line[start..])
}

/// Parses the decimal digits at the start of the slice.
fn leading_number(bytes: &[u8]) -> Option<u32> {
    let end = bytes
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(bytes.len());
    if end == 0 {
        return None;
    }
    std::str::from_utf8(&bytes[..end]).ok()?.parse().ok()
}
