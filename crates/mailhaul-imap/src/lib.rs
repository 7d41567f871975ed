//! # mailhaul-imap
//!
//! A minimal IMAP4rev1 client protocol engine built for one job: pulling
//! messages out of a remote mailbox. It speaks LOGIN, SELECT, UID SEARCH,
//! UID FETCH, and LOGOUT over plaintext or TLS, and recovers raw message
//! payloads from the literal-framed FETCH responses without altering a
//! byte of them.
//!
//! ## Connection states
//!
//! The client uses the type-state pattern so invalid command sequences do
//! not compile:
//!
//! ```text
//! ┌─────────────────────┐
//! │   NotAuthenticated  │ ─── login() ───→ Authenticated
//! └─────────────────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │    Authenticated    │ ─── select() ───→ Selected
//! └─────────────────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │      Selected       │ ─── uid_search() / uid_fetch()
//! └─────────────────────┘
//! ```
//!
//! `logout()` is available from every state and consumes the client.
//!
//! ## Sequencing
//!
//! The engine is strictly sequential: one command is in flight at a time
//! and its complete reply is buffered before the next command is written.
//! Every individual read is bounded by a timeout; expiry tears the
//! connection down.
//!
//! ## Modules
//!
//! - [`command`]: command builders, serialization, tag generation
//! - [`connection`]: stream setup, the command dialog, the type-state client
//! - [`parser`]: reply parsing, including literal-framed FETCH payloads

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::{Command, FetchItems, SearchCriteria, TagSequence};
pub use connection::{
    Authenticated, Client, Config, ConfigBuilder, Dialog, ImapStream, NotAuthenticated, Reply,
    Security, Selected, connect,
};
pub use error::{Error, Result};
pub use parser::FetchedMessage;
pub use types::{MailboxStatus, Status, Uid, UidValidity};
