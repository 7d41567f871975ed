//! Connection management: stream setup, the command dialog, and the
//! type-state client.

mod client;
mod config;
mod dialog;
mod stream;

pub use client::{Authenticated, Client, NotAuthenticated, Selected};
pub use config::{Config, ConfigBuilder, DEFAULT_CA_DIR, Security};
pub use dialog::{Dialog, Reply};
pub use stream::{ImapStream, connect};
