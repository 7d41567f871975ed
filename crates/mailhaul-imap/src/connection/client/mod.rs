//! Type-state IMAP client connection.
//!
//! Uses the type-state pattern to enforce valid state transitions at
//! compile time:
//!
//! - `NotAuthenticated`: initial state after the greeting
//! - `Authenticated`: after a successful LOGIN
//! - `Selected`: after a successful SELECT
//!
//! Each state only exposes the operations that are valid in that state,
//! and LOGOUT is available everywhere.

mod authenticated;
mod not_authenticated;
mod selected;
mod states;

pub use states::{Authenticated, NotAuthenticated, Selected};

use tokio::io::{AsyncRead, AsyncWrite};

use super::dialog::Dialog;
use crate::command::Command;
use crate::parser;
use crate::{Error, Result};

/// IMAP client connection with type-state.
///
/// The type parameter `State` tracks the connection state at compile time.
pub struct Client<S, State> {
    pub(crate) dialog: Dialog<S>,
    pub(crate) state: State,
}

impl<S, State> std::fmt::Debug for Client<S, State>
where
    State: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Sends a NOOP command to keep the connection alive.
    ///
    /// # Errors
    ///
    /// Returns an error when the command fails or the reply is not OK.
    pub async fn noop(&mut self) -> Result<()> {
        let reply = self.dialog.send(&Command::Noop).await?;
        parser::check_ok(&reply.data, &reply.tag)
    }

    /// Gracefully disconnects from the server.
    ///
    /// The LOGOUT reply is not interpreted; the stream is shut down
    /// regardless of what the server sent.
    pub async fn logout(mut self) {
        let _ = self.dialog.send(&Command::Logout).await;
        self.dialog.shutdown().await;
    }

    /// Maps NO/BAD completions of LOGIN to authentication errors.
    pub(crate) fn auth_error(err: Error) -> Error {
        match err {
            Error::No(text) | Error::Bad(text) => Error::Auth(text),
            other => other,
        }
    }
}
