//! UID FETCH response parsing.
//!
//! FETCH payloads arrive as octet-counted literals interleaved with
//! protocol text, and a message body may contain arbitrary bytes including
//! lines that look like IMAP responses. The parser therefore walks the
//! reply as a byte stream: protocol lines are scanned for the UID and the
//! literal introducer, and literal payloads are consumed by their
//! advertised byte count without inspecting their content.

use crate::types::{Status, Uid};
use crate::{Error, Result};

/// One message recovered from a UID FETCH reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMessage {
    /// Server-assigned UID.
    pub uid: Uid,
    /// The exact literal bytes, unaltered.
    pub body: Vec<u8>,
}

/// Parses a complete UID FETCH reply into `(uid, payload)` pairs.
///
/// FETCH data without a literal (metadata-only responses) contribute no
/// entry. Untagged lines the synchronizer does not need (EXISTS, RECENT,
/// EXPUNGE, flag updates) are skipped.
///
/// # Errors
///
/// - [`Error::No`]/[`Error::Bad`] for an error completion,
/// - [`Error::Malformed`] when an advertised literal length exceeds the
///   bytes remaining in the reply or a UID is invalid,
/// - [`Error::Truncated`] when the reply ends without the tagged
///   completion line.
pub fn parse_uid_fetch(data: &[u8], tag: &str) -> Result<Vec<FetchedMessage>> {
    let mut messages = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let Some(eol) = find_crlf(&data[pos..]) else {
            return Err(Error::Truncated(
                "reply ends inside a protocol line".to_string(),
            ));
        };
        let line = &data[pos..pos + eol];
        let after_line = pos + eol + 2;

        if let Some((status, text)) = completion(line, tag) {
            return match status {
                Status::Ok => Ok(messages),
                Status::No => Err(Error::No(text)),
                Status::Bad => Err(Error::Bad(text)),
            };
        }

        let Some(uid) = fetch_uid(line, pos)? else {
            pos = after_line;
            continue;
        };

        let Some(len) = trailing_literal(line) else {
            // Metadata-only FETCH datum.
            pos = after_line;
            continue;
        };

        if after_line + len > data.len() {
            return Err(Error::Malformed {
                position: after_line,
                message: format!(
                    "literal of {len} bytes exceeds the {} bytes remaining",
                    data.len() - after_line
                ),
            });
        }

        messages.push(FetchedMessage {
            uid,
            body: data[after_line..after_line + len].to_vec(),
        });
        pos = after_line + len;
    }

    Err(Error::Truncated(format!(
        "reply ended without a tagged completion for {tag}"
    )))
}

/// Finds the next CRLF in the slice.
fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(2).position(|w| w == b"\r\n")
}

/// Recognizes the tagged completion line for `tag`.
fn completion(line: &[u8], tag: &str) -> Option<(Status, String)> {
    let rest = line.strip_prefix(tag.as_bytes())?;
    let rest = rest.strip_prefix(b" ")?;
    let (keyword, text) = match rest.iter().position(|&b| b == b' ') {
        Some(sp) => (&rest[..sp], &rest[sp + 1..]),
        None => (rest, &[][..]),
    };
    let status = match keyword {
        b"OK" => Status::Ok,
        b"NO" => Status::No,
        b"BAD" => Status::Bad,
        _ => return None,
    };
    Some((status, String::from_utf8_lossy(text).into_owned()))
}

/// Extracts the UID from a `* <n> FETCH (UID <digits>` line.
///
/// Lines that are not FETCH data return `Ok(None)`.
fn fetch_uid(line: &[u8], position: usize) -> Result<Option<Uid>> {
    if !line.starts_with(b"* ") {
        return Ok(None);
    }
    const PATTERN: &[u8] = b"FETCH (UID ";
    let Some(at) = line
        .windows(PATTERN.len())
        .position(|w| w == PATTERN)
    else {
        return Ok(None);
    };

    let digits = &line[at + PATTERN.len()..];
    let end = digits
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return Err(Error::Malformed {
            position,
            message: "FETCH datum without a UID value".to_string(),
        });
    }

    let n: u32 = std::str::from_utf8(&digits[..end])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::Malformed {
            position,
            message: "UID does not fit in 32 bits".to_string(),
        })?;

    Uid::new(n)
        .map(Some)
        .ok_or_else(|| Error::Malformed {
            position,
            message: "UID 0 in FETCH response".to_string(),
        })
}

/// Parses a trailing `{n}` literal introducer.
fn trailing_literal(line: &[u8]) -> Option<usize> {
    let line = line.strip_suffix(b"}")?;
    let open = line.iter().rposition(|&b| b == b'{')?;
    let digits = &line[open + 1..];
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}
