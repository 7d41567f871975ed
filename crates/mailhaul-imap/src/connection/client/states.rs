//! Connection states for the type-state client.

use crate::types::MailboxStatus;

/// State before authentication.
#[derive(Debug, Clone, Copy)]
pub struct NotAuthenticated;

/// State after a successful LOGIN.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated;

/// State after a successful SELECT; carries the selection data.
#[derive(Debug, Clone)]
pub struct Selected {
    pub(crate) mailbox: String,
    pub(crate) status: MailboxStatus,
}
