//! # mailhaul-core
//!
//! The synchronization engine behind the `mailhaul` binary: credentials
//! loading, the on-disk message store with its UIDVALIDITY marker, and the
//! synchronizer that reconciles a remote mailbox with the local inventory.
//!
//! The engine never alters message bytes. Whatever the server delivers
//! inside a FETCH literal is what lands in the `.eml` file.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod credentials;
mod error;
mod store;
mod sync;

pub use credentials::Credentials;
pub use error::{Error, Result};
pub use store::{LocalInventory, MailStore};
pub use sync::{SyncOptions, SyncReport, sync_mailbox};
