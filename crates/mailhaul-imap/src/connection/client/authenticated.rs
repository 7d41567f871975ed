//! Implementation for the authenticated state.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::states::{Authenticated, Selected};
use crate::command::Command;
use crate::parser;
use crate::types::MailboxStatus;
use crate::Result;

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Selects a mailbox for read-write access.
    ///
    /// Consumes self and returns the selected client together with the
    /// mailbox state from the SELECT reply.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Protocol`] when the server does not
    /// advertise a non-zero UIDVALIDITY, and `No`/`Bad` when the SELECT is
    /// rejected.
    pub async fn select(mut self, mailbox: &str) -> Result<(Client<S, Selected>, MailboxStatus)> {
        let cmd = Command::Select {
            mailbox: mailbox.to_string(),
        };
        let reply = self.dialog.send(&cmd).await?;
        let status = parser::parse_select(&reply.data, &reply.tag)?;

        Ok((
            Client {
                dialog: self.dialog,
                state: Selected {
                    mailbox: mailbox.to_string(),
                    status,
                },
            },
            status,
        ))
    }
}
