//! Error types for the IMAP protocol engine.
//!
//! Every failure mode of the connection, the command dialog, and the
//! response parsers has a named variant so callers can distinguish setup
//! failures from protocol failures from framing failures.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during IMAP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake or encryption error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS peer verification.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Hostname resolution failed.
    #[error("DNS resolution failed for {0}")]
    Dns(String),

    /// The connect attempt did not complete within the configured bound.
    #[error("Connection timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// A single read from the server did not complete within the configured bound.
    #[error("Read timed out after {0:?}")]
    ReadTimeout(Duration),

    /// The peer closed the connection while a command was in flight.
    #[error("Connection closed by server")]
    ConnectionClosed,

    /// Authentication was rejected by the server.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Server returned a tagged NO completion.
    #[error("Server returned NO: {0}")]
    No(String),

    /// Server returned a tagged BAD completion.
    #[error("Server returned BAD: {0}")]
    Bad(String),

    /// Server sent BYE (disconnecting).
    #[error("Server sent BYE: {0}")]
    Bye(String),

    /// Protocol violation or unexpected data.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A response could not be parsed.
    #[error("Malformed response at byte {position}: {message}")]
    Malformed {
        /// Byte position where the error was detected.
        position: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// The response ended before all advertised data arrived.
    #[error("Truncated response: {0}")]
    Truncated(String),

    /// The tag counter has been exhausted for this connection.
    #[error("Command tag counter exhausted")]
    TagOverflow,
}

impl Error {
    /// Returns true if this error indicates the connection is unusable.
    #[must_use]
    pub const fn is_connection_dead(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::Tls(_)
                | Self::Bye(_)
                | Self::ConnectionClosed
                | Self::ConnectTimeout(_)
                | Self::ReadTimeout(_)
        )
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
