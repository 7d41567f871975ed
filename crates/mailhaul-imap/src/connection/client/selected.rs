//! Implementation for the selected state.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::states::Selected;
use crate::command::{Command, FetchItems, SearchCriteria};
use crate::parser::{self, FetchedMessage};
use crate::types::{Uid, UidValidity};
use crate::Result;

impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the name of the currently selected mailbox.
    #[must_use]
    pub fn mailbox(&self) -> &str {
        &self.state.mailbox
    }

    /// Returns the UIDVALIDITY advertised for this selection.
    #[must_use]
    pub const fn uid_validity(&self) -> UidValidity {
        self.state.status.uid_validity
    }

    /// Returns the number of messages in the mailbox at SELECT time.
    #[must_use]
    pub const fn exists(&self) -> u32 {
        self.state.status.exists
    }

    /// Searches the mailbox by UID.
    ///
    /// Returns matching UIDs in server order; an empty vector when nothing
    /// matches.
    ///
    /// # Errors
    ///
    /// Returns an error when the SEARCH is rejected or the response cannot
    /// be parsed.
    pub async fn uid_search(&mut self, criteria: SearchCriteria) -> Result<Vec<Uid>> {
        let reply = self.dialog.send(&Command::UidSearch { criteria }).await?;
        parser::parse_search(&reply.data, &reply.tag)
    }

    /// Fetches message payloads for an explicit UID list.
    ///
    /// The comma list on the wire preserves the order of `uids`. The
    /// returned pairs follow the server's response order, which may differ.
    ///
    /// # Errors
    ///
    /// Returns an error when the FETCH is rejected or a literal is
    /// malformed or truncated.
    pub async fn uid_fetch(
        &mut self,
        uids: &[Uid],
        items: FetchItems,
    ) -> Result<Vec<FetchedMessage>> {
        if uids.is_empty() {
            return Ok(Vec::new());
        }
        let cmd = Command::UidFetch {
            uids: uids.to_vec(),
            items,
        };
        let reply = self.dialog.send(&cmd).await?;
        parser::parse_uid_fetch(&reply.data, &reply.tag)
    }
}
