//! Implementation for the not-authenticated state.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::states::{Authenticated, NotAuthenticated};
use crate::command::Command;
use crate::connection::dialog::Dialog;
use crate::parser;
use crate::Result;

/// Default bound on every individual read from the server.
pub(crate) const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new client from a connected stream and reads the server
    /// greeting.
    ///
    /// # Errors
    ///
    /// Returns an error when the greeting does not arrive or the server
    /// refuses the connection with BYE.
    pub async fn from_stream(stream: S) -> Result<Self> {
        Self::from_stream_timeout(stream, DEFAULT_READ_TIMEOUT).await
    }

    /// Like [`Client::from_stream`] with an explicit per-read timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the greeting does not arrive or the server
    /// refuses the connection with BYE.
    pub async fn from_stream_timeout(stream: S, read_timeout: Duration) -> Result<Self> {
        let mut dialog = Dialog::new(stream, read_timeout);
        let _greeting = dialog.read_greeting().await?;

        Ok(Self {
            dialog,
            state: NotAuthenticated,
        })
    }

    /// Authenticates with the server using LOGIN.
    ///
    /// Consumes self and returns an authenticated client on success.
    ///
    /// # Errors
    ///
    /// A NO or BAD completion surfaces as [`crate::Error::Auth`].
    pub async fn login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        let cmd = Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        };
        let reply = self.dialog.send(&cmd).await?;
        parser::check_ok(&reply.data, &reply.tag).map_err(Self::auth_error)?;

        Ok(Client {
            dialog: self.dialog,
            state: Authenticated,
        })
    }
}
