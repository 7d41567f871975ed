//! IMAP command builders and serialization.
//!
//! Commands are serialized into complete wire lines: tag, command name,
//! arguments, CRLF. Mailbox names and login arguments are written as IMAP
//! astrings and quoted when they contain characters outside the atom set.

mod tag;

pub use tag::TagSequence;

use crate::types::Uid;

/// A single IMAP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// LOGIN with plaintext credentials.
    Login {
        /// Account name.
        username: String,
        /// Account password.
        password: String,
    },
    /// SELECT a mailbox for read-write access.
    Select {
        /// Mailbox name.
        mailbox: String,
    },
    /// UID SEARCH with a single criterion.
    UidSearch {
        /// Search criterion.
        criteria: SearchCriteria,
    },
    /// UID FETCH for an explicit UID list.
    UidFetch {
        /// UIDs to fetch, in the order they will appear on the wire.
        uids: Vec<Uid>,
        /// What to fetch for each UID.
        items: FetchItems,
    },
    /// NOOP keepalive.
    Noop,
    /// LOGOUT and close the session.
    Logout,
}

/// Search criteria supported by the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchCriteria {
    /// All messages in the mailbox.
    All,
    /// Messages that are recent and unseen.
    New,
}

impl SearchCriteria {
    const fn as_str(self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::New => "NEW",
        }
    }
}

/// FETCH data items requested per message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchItems {
    /// The complete message: `(UID BODY[])`.
    FullBody,
    /// Headers only, without setting \Seen: `(UID BODY.PEEK[HEADER])`.
    Headers,
}

impl FetchItems {
    const fn as_str(self) -> &'static str {
        match self {
            Self::FullBody => "(UID BODY[])",
            Self::Headers => "(UID BODY.PEEK[HEADER])",
        }
    }
}

impl Command {
    /// Returns the command name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => "LOGIN",
            Self::Select { .. } => "SELECT",
            Self::UidSearch { .. } => "UID SEARCH",
            Self::UidFetch { .. } => "UID FETCH",
            Self::Noop => "NOOP",
            Self::Logout => "LOGOUT",
        }
    }

    /// Serializes the command into a complete wire line for the given tag.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(tag.as_bytes());
        buf.push(b' ');

        match self {
            Self::Login { username, password } => {
                buf.extend_from_slice(b"LOGIN ");
                write_astring(&mut buf, username);
                buf.push(b' ');
                write_astring(&mut buf, password);
            }
            Self::Select { mailbox } => {
                buf.extend_from_slice(b"SELECT ");
                write_astring(&mut buf, mailbox);
            }
            Self::UidSearch { criteria } => {
                buf.extend_from_slice(b"UID SEARCH ");
                buf.extend_from_slice(criteria.as_str().as_bytes());
            }
            Self::UidFetch { uids, items } => {
                buf.extend_from_slice(b"UID FETCH ");
                for (i, uid) in uids.iter().enumerate() {
                    if i > 0 {
                        buf.push(b',');
                    }
                    buf.extend_from_slice(uid.to_string().as_bytes());
                }
                buf.push(b' ');
                buf.extend_from_slice(items.as_str().as_bytes());
            }
            Self::Noop => buf.extend_from_slice(b"NOOP"),
            Self::Logout => buf.extend_from_slice(b"LOGOUT"),
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }
}

/// Writes an astring (atom or quoted string).
fn write_astring(buf: &mut Vec<u8>, s: &str) {
    if s.is_empty() || s.bytes().any(needs_quoting) {
        buf.push(b'"');
        for b in s.bytes() {
            if b == b'"' || b == b'\\' {
                buf.push(b'\\');
            }
            buf.push(b);
        }
        buf.push(b'"');
    } else {
        buf.extend_from_slice(s.as_bytes());
    }
}

/// Returns true if the byte forces the containing string to be quoted.
const fn needs_quoting(b: u8) -> bool {
    matches!(b, b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*') || b < 0x20 || b == 0x7F
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn uid(n: u32) -> Uid {
        Uid::new(n).unwrap()
    }

    #[test]
    fn serialize_login() {
        let cmd = Command::Login {
            username: "alice".into(),
            password: "secret".into(),
        };
        assert_eq!(cmd.serialize("A001"), b"A001 LOGIN alice secret\r\n");
    }

    #[test]
    fn serialize_login_quotes_specials() {
        let cmd = Command::Login {
            username: "alice@example.org".into(),
            password: "pa ss\"w".into(),
        };
        assert_eq!(
            cmd.serialize("A001"),
            b"A001 LOGIN alice@example.org \"pa ss\\\"w\"\r\n"
        );
    }

    #[test]
    fn serialize_select() {
        let cmd = Command::Select {
            mailbox: "INBOX".into(),
        };
        assert_eq!(cmd.serialize("A002"), b"A002 SELECT INBOX\r\n");
    }

    #[test]
    fn serialize_select_quotes_spaces() {
        let cmd = Command::Select {
            mailbox: "Sent Items".into(),
        };
        assert_eq!(cmd.serialize("A002"), b"A002 SELECT \"Sent Items\"\r\n");
    }

    #[test]
    fn serialize_uid_search() {
        let all = Command::UidSearch {
            criteria: SearchCriteria::All,
        };
        assert_eq!(all.serialize("A003"), b"A003 UID SEARCH ALL\r\n");

        let new = Command::UidSearch {
            criteria: SearchCriteria::New,
        };
        assert_eq!(new.serialize("A003"), b"A003 UID SEARCH NEW\r\n");
    }

    #[test]
    fn serialize_uid_fetch_preserves_order() {
        let cmd = Command::UidFetch {
            uids: vec![uid(3), uid(1), uid(2)],
            items: FetchItems::FullBody,
        };
        assert_eq!(cmd.serialize("A004"), b"A004 UID FETCH 3,1,2 (UID BODY[])\r\n");
    }

    #[test]
    fn serialize_uid_fetch_headers() {
        let cmd = Command::UidFetch {
            uids: vec![uid(7)],
            items: FetchItems::Headers,
        };
        assert_eq!(
            cmd.serialize("A004"),
            b"A004 UID FETCH 7 (UID BODY.PEEK[HEADER])\r\n"
        );
    }

    #[test]
    fn serialize_logout() {
        assert_eq!(Command::Logout.serialize("A005"), b"A005 LOGOUT\r\n");
    }
}
