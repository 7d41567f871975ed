//! Error types for the synchronization engine.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during mailbox synchronization.
#[derive(Debug, Error)]
pub enum Error {
    /// IMAP protocol or connection failure.
    #[error("IMAP error: {0}")]
    Imap(#[from] mailhaul_imap::Error),

    /// Filesystem failure in the local store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Credentials file missing, unreadable, or incomplete.
    #[error("Credentials error in {path}: {message}")]
    Credentials {
        /// The credentials file.
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },

    /// The on-disk UIDVALIDITY marker is unreadable.
    #[error("Invalid UIDVALIDITY marker {path}: {message}")]
    Marker {
        /// The marker file.
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
