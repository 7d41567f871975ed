//! Tagged command dialog over a byte stream.
//!
//! IMAP replies are CRLF-terminated lines interleaved with `{n}` octet
//! literals. The dialog writes one tagged command at a time and accumulates
//! the raw reply until the line carrying that command's tag arrives.
//! Literal payloads are consumed by their advertised byte count, so payload
//! bytes that happen to look like a completion line can never end the reply
//! early.

use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::command::{Command, TagSequence};
use crate::{Error, Result};

/// Read buffer size for the underlying stream.
const READ_BUFFER_SIZE: usize = 4096;

/// Maximum protocol line length accepted from the server.
const MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Maximum literal size accepted from the server.
const MAX_LITERAL_SIZE: usize = 100 * 1024 * 1024;

/// A complete raw reply to one command.
#[derive(Debug)]
pub struct Reply {
    /// The tag the command was issued under.
    pub tag: String,
    /// The accumulated reply bytes, tagged completion line included.
    pub data: Vec<u8>,
}

/// Sequential command/reply dialog.
///
/// Exactly one command is in flight at a time; [`Dialog::send`] does not
/// return until the matching tagged completion line has been buffered.
pub struct Dialog<S> {
    reader: BufReader<S>,
    tags: TagSequence,
    read_timeout: Duration,
}

impl<S> Dialog<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new dialog over the given stream.
    pub fn new(stream: S, read_timeout: Duration) -> Self {
        Self {
            reader: BufReader::with_capacity(READ_BUFFER_SIZE, stream),
            tags: TagSequence::new(),
            read_timeout,
        }
    }

    /// Reads the server greeting.
    ///
    /// The greeting is the first CRLF-terminated untagged line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bye`] when the server refuses the connection and
    /// [`Error::Protocol`] when the first line is not untagged.
    pub async fn read_greeting(&mut self) -> Result<Vec<u8>> {
        let line = self.read_line().await?;
        if line.starts_with(b"* BYE") {
            return Err(Error::Bye(line_text(&line)));
        }
        if !line.starts_with(b"* ") {
            return Err(Error::Protocol(format!(
                "unexpected greeting: {}",
                line_text(&line)
            )));
        }
        trace!(greeting = %line_text(&line), "server greeting");
        Ok(line)
    }

    /// Sends one command and accumulates its complete reply.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, per-read timeout expiry, peer EOF, oversized
    /// protocol lines or literals, and tag exhaustion.
    pub async fn send(&mut self, command: &Command) -> Result<Reply> {
        let tag = self.tags.next()?;
        let line = command.serialize(&tag);

        let stream = self.reader.get_mut();
        stream.write_all(&line).await?;
        stream.flush().await?;
        debug!(%tag, command = command.name(), "sent command");

        let data = self.read_until_tagged(&tag).await?;
        trace!(%tag, bytes = data.len(), "reply complete");
        Ok(Reply { tag, data })
    }

    /// Accumulates reply bytes until a line starting with `<tag> ` arrives.
    async fn read_until_tagged(&mut self, tag: &str) -> Result<Vec<u8>> {
        let mut reply = Vec::new();

        loop {
            let line = self.read_line().await?;
            let completed = is_tagged_line(&line, tag);
            let literal = parse_literal_len(&line);
            reply.extend_from_slice(&line);

            if let Some(len) = literal {
                if len > MAX_LITERAL_SIZE {
                    return Err(Error::Protocol(format!("literal too large: {len} bytes")));
                }
                self.read_literal(len, &mut reply).await?;
                continue;
            }

            if completed {
                return Ok(reply);
            }
        }
    }

    /// Reads a single CRLF-terminated line, timeout-bounded per read.
    async fn read_line(&mut self) -> Result<Vec<u8>> {
        let mut line = BytesMut::new();

        loop {
            let buf = timeout(self.read_timeout, self.reader.fill_buf())
                .await
                .map_err(|_| Error::ReadTimeout(self.read_timeout))??;
            if buf.is_empty() {
                return Err(Error::ConnectionClosed);
            }

            // CRLF split across two reads: the CR is already buffered.
            if line.last() == Some(&b'\r') && buf[0] == b'\n' {
                line.extend_from_slice(&buf[..1]);
                self.reader.consume(1);
                return Ok(line.to_vec());
            }

            if let Some(pos) = buf.windows(2).position(|w| w == b"\r\n") {
                line.extend_from_slice(&buf[..pos + 2]);
                self.reader.consume(pos + 2);
                return Ok(line.to_vec());
            }

            let len = buf.len();
            line.extend_from_slice(buf);
            self.reader.consume(len);

            if line.len() > MAX_LINE_LENGTH {
                return Err(Error::Protocol("line too long".to_string()));
            }
        }
    }

    /// Reads exactly `len` literal bytes, timeout-bounded per read.
    async fn read_literal(&mut self, len: usize, reply: &mut Vec<u8>) -> Result<()> {
        let mut remaining = len;
        while remaining > 0 {
            let buf = timeout(self.read_timeout, self.reader.fill_buf())
                .await
                .map_err(|_| Error::ReadTimeout(self.read_timeout))??;
            if buf.is_empty() {
                return Err(Error::Truncated(format!(
                    "connection closed with {remaining} literal bytes outstanding"
                )));
            }
            let take = remaining.min(buf.len());
            reply.extend_from_slice(&buf[..take]);
            self.reader.consume(take);
            remaining -= take;
        }
        Ok(())
    }

    /// Shuts down the underlying stream, sending the TLS close alert when
    /// the connection is encrypted.
    pub async fn shutdown(mut self) {
        let _ = self.reader.get_mut().shutdown().await;
    }
}

/// Checks whether a line is the tagged completion for `tag`.
fn is_tagged_line(line: &[u8], tag: &str) -> bool {
    line.len() > tag.len()
        && line.starts_with(tag.as_bytes())
        && line[tag.len()] == b' '
}

/// Parses a trailing literal introducer `{n}` from a CRLF-terminated line.
fn parse_literal_len(line: &[u8]) -> Option<usize> {
    let line = line.strip_suffix(b"\r\n")?;
    let line = line.strip_suffix(b"}")?;
    let open = line.iter().rposition(|&b| b == b'{')?;
    let digits = &line[open + 1..];
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// Renders a protocol line for error messages and logging.
fn line_text(line: &[u8]) -> String {
    String::from_utf8_lossy(line).trim_end().to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::command::SearchCriteria;

    #[test]
    fn literal_len_parsing() {
        assert_eq!(parse_literal_len(b"* 1 FETCH (BODY[] {123}\r\n"), Some(123));
        assert_eq!(parse_literal_len(b"{0}\r\n"), Some(0));
        assert_eq!(parse_literal_len(b"no literal\r\n"), None);
        assert_eq!(parse_literal_len(b"not terminated {12"), None);
        assert_eq!(parse_literal_len(b"bad digits {1a2}\r\n"), None);
        assert_eq!(parse_literal_len(b"empty {}\r\n"), None);
    }

    #[test]
    fn tagged_line_detection() {
        assert!(is_tagged_line(b"A001 OK done\r\n", "A001"));
        assert!(!is_tagged_line(b"A0010 OK done\r\n", "A001"));
        assert!(!is_tagged_line(b"* OK ready\r\n", "A001"));
        assert!(!is_tagged_line(b"A001", "A001"));
    }

    #[tokio::test]
    async fn greeting_is_first_untagged_line() {
        let mock = tokio_test::io::Builder::new()
            .read(b"* OK IMAP4rev1 server ready\r\n")
            .build();
        let mut dialog = Dialog::new(mock, Duration::from_secs(5));

        let greeting = dialog.read_greeting().await.unwrap();
        assert_eq!(greeting, b"* OK IMAP4rev1 server ready\r\n");
    }

    #[tokio::test]
    async fn greeting_bye_is_an_error() {
        let mock = tokio_test::io::Builder::new()
            .read(b"* BYE busy\r\n")
            .build();
        let mut dialog = Dialog::new(mock, Duration::from_secs(5));

        assert!(matches!(
            dialog.read_greeting().await,
            Err(Error::Bye(text)) if text.contains("busy")
        ));
    }

    #[tokio::test]
    async fn send_collects_untagged_lines_until_completion() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A001 UID SEARCH ALL\r\n")
            .read(b"* SEARCH 1 2 3\r\n")
            .read(b"A001 OK SEARCH completed\r\n")
            .build();
        let mut dialog = Dialog::new(mock, Duration::from_secs(5));

        let reply = dialog
            .send(&Command::UidSearch {
                criteria: SearchCriteria::All,
            })
            .await
            .unwrap();
        assert_eq!(reply.tag, "A001");
        assert_eq!(
            reply.data,
            b"* SEARCH 1 2 3\r\nA001 OK SEARCH completed\r\n"
        );
    }

    #[tokio::test]
    async fn literal_bytes_cannot_terminate_the_reply() {
        // The literal payload contains what looks like our tagged OK; the
        // dialog must swallow it as data and keep reading.
        let payload = b"fake\r\nA001 OK injected\r\nrest of the body padding!!";
        assert_eq!(payload.len(), 50);
        let mut conversation = Vec::new();
        conversation.extend_from_slice(b"* 1 FETCH (UID 9 BODY[] {50}\r\n");
        conversation.extend_from_slice(payload);
        conversation.extend_from_slice(b")\r\n");

        let mock = tokio_test::io::Builder::new()
            .write(b"A001 NOOP\r\n")
            .read(&conversation)
            .read(b"A001 OK FETCH completed\r\n")
            .build();
        let mut dialog = Dialog::new(mock, Duration::from_secs(5));

        let reply = dialog.send(&Command::Noop).await.unwrap();
        assert!(reply.data.ends_with(b"A001 OK FETCH completed\r\n"));
        // The injected line is present as payload, before the final line.
        let body_pos = reply
            .data
            .windows(payload.len())
            .position(|w| w == payload)
            .unwrap();
        assert!(body_pos < reply.data.len() - payload.len());
    }

    #[tokio::test]
    async fn literal_split_across_reads() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A001 NOOP\r\n")
            .read(b"* 1 FETCH (UID 2 BODY[] {10}\r\n")
            .read(b"hello")
            .read(b"world)\r\n")
            .read(b"A001 OK done\r\n")
            .build();
        let mut dialog = Dialog::new(mock, Duration::from_secs(5));

        let reply = dialog.send(&Command::Noop).await.unwrap();
        assert!(
            reply
                .data
                .windows(10)
                .any(|w| w == b"helloworld")
        );
    }

    #[tokio::test]
    async fn crlf_split_across_reads() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A001 NOOP\r\n")
            .read(b"* OK partial\r")
            .read(b"\nA001 OK done\r\n")
            .build();
        let mut dialog = Dialog::new(mock, Duration::from_secs(5));

        let reply = dialog.send(&Command::Noop).await.unwrap();
        assert_eq!(reply.data, b"* OK partial\r\nA001 OK done\r\n");
    }

    #[tokio::test]
    async fn eof_mid_command_is_connection_closed() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A001 NOOP\r\n")
            .read(b"* OK partial\r\n")
            .build();
        let mut dialog = Dialog::new(mock, Duration::from_secs(5));

        assert!(matches!(
            dialog.send(&Command::Noop).await,
            Err(Error::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn eof_inside_literal_is_truncated() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A001 NOOP\r\n")
            .read(b"* 1 FETCH (UID 2 BODY[] {100}\r\n")
            .read(b"only a little")
            .build();
        let mut dialog = Dialog::new(mock, Duration::from_secs(5));

        assert!(matches!(
            dialog.send(&Command::Noop).await,
            Err(Error::Truncated(_))
        ));
    }
}
