//! Mailbox synchronization.
//!
//! Drives the SELECT → SEARCH → FETCH workflow against an authenticated
//! client, reconciling the server's UID set with the local inventory under
//! UIDVALIDITY semantics:
//!
//! - a changed UIDVALIDITY discards all local artifacts for the mailbox
//!   before anything is downloaded,
//! - in full mode, UIDs present only as headers-only artifacts are
//!   re-fetched and upgraded,
//! - in headers-only mode, any locally present UID is left alone.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use mailhaul_imap::{Authenticated, Client, FetchItems, SearchCriteria, Uid};

use crate::store::MailStore;
use crate::Result;

/// What to synchronize and how.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Mailbox to select.
    pub mailbox: String,
    /// Only consider messages matching `UID SEARCH NEW`.
    pub new_only: bool,
    /// Fetch `BODY.PEEK[HEADER]` instead of full bodies.
    pub headers_only: bool,
}

impl SyncOptions {
    /// Options for a full-body sync of the given mailbox.
    #[must_use]
    pub fn new(mailbox: impl Into<String>) -> Self {
        Self {
            mailbox: mailbox.into(),
            new_only: false,
            headers_only: false,
        }
    }
}

/// Outcome of a synchronization run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Mailbox that was synchronized.
    pub mailbox: String,
    /// Messages written to disk.
    pub downloaded: usize,
    /// Messages that failed to persist.
    pub failed: usize,
    /// Whether the run was restricted to new messages.
    pub new_only: bool,
    /// Whether headers-only artifacts were fetched.
    pub headers_only: bool,
}

impl SyncReport {
    /// Renders the user-facing result line.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.new_only && self.downloaded == 0 && self.failed == 0 {
            return "No new messages found".to_string();
        }
        if self.headers_only {
            format!(
                "Downloaded {} message headers from mailbox {}",
                self.downloaded, self.mailbox
            )
        } else {
            format!(
                "Downloaded {} messages from mailbox {}",
                self.downloaded, self.mailbox
            )
        }
    }
}

/// Synchronizes one mailbox into the store.
///
/// Consumes the authenticated client; the connection is logged out and
/// shut down before returning on the success path.
///
/// # Errors
///
/// Protocol, I/O, and parse failures abort the run. Per-message
/// persistence failures do not: they are logged, counted in the report,
/// and the remaining messages are still written.
pub async fn sync_mailbox<S>(
    client: Client<S, Authenticated>,
    store: &MailStore,
    options: &SyncOptions,
) -> Result<SyncReport>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut client, status) = client.select(&options.mailbox).await?;
    let uid_validity = status.uid_validity.get();
    info!(
        mailbox = %options.mailbox,
        uid_validity,
        exists = status.exists,
        "mailbox selected"
    );

    reconcile_uid_validity(store, uid_validity)?;

    let criteria = if options.new_only {
        SearchCriteria::New
    } else {
        SearchCriteria::All
    };
    let server_uids = client.uid_search(criteria).await?;
    debug!(count = server_uids.len(), ?criteria, "server UID set");

    let mut report = SyncReport {
        mailbox: options.mailbox.clone(),
        downloaded: 0,
        failed: 0,
        new_only: options.new_only,
        headers_only: options.headers_only,
    };

    if options.new_only && server_uids.is_empty() {
        info!(mailbox = %options.mailbox, "no new messages");
        client.logout().await;
        return Ok(report);
    }

    let to_fetch = plan_fetch(store, &server_uids, options.headers_only)?;

    if to_fetch.is_empty() {
        debug!("local inventory already matches the server");
    } else {
        info!(count = to_fetch.len(), "fetching messages");
        let items = if options.headers_only {
            FetchItems::Headers
        } else {
            FetchItems::FullBody
        };
        let messages = client.uid_fetch(&to_fetch, items).await?;

        for message in &messages {
            match store.write_message(message.uid.get(), &message.body, options.headers_only) {
                Ok(()) => report.downloaded += 1,
                Err(e) => {
                    warn!(uid = message.uid.get(), error = %e, "failed to persist message");
                    report.failed += 1;
                }
            }
        }
    }

    client.logout().await;
    Ok(report)
}

/// Compares the server's UIDVALIDITY with the stored marker and discards
/// local state on mismatch.
///
/// Invalidation happens before the marker is replaced, so a failure leaves
/// the old marker in place and the next run retries the invalidation.
fn reconcile_uid_validity(store: &MailStore, uid_validity: u32) -> Result<()> {
    match store.read_marker()? {
        None => {
            debug!(uid_validity, "no marker, first sync for this mailbox");
            store.write_marker(uid_validity)
        }
        Some(stored) if stored == uid_validity => Ok(()),
        Some(stored) => {
            info!(
                stored,
                advertised = uid_validity,
                "UIDVALIDITY changed, discarding local mailbox state"
            );
            store.invalidate()?;
            store.write_marker(uid_validity)
        }
    }
}

/// Computes the UIDs to fetch, preserving server search order.
///
/// In headers-only mode a UID with any local artifact is skipped; in full
/// mode only a full artifact counts, so headers-only UIDs are upgraded.
fn plan_fetch(store: &MailStore, server_uids: &[Uid], headers_only: bool) -> Result<Vec<Uid>> {
    let inventory = store.inventory()?;
    let to_fetch = server_uids
        .iter()
        .copied()
        .filter(|uid| {
            if headers_only {
                !inventory.contains(uid.get())
            } else {
                !inventory.full.contains(&uid.get())
            }
        })
        .collect();
    Ok(to_fetch)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn uid(n: u32) -> Uid {
        Uid::new(n).unwrap()
    }

    fn store_in(dir: &std::path::Path) -> MailStore {
        MailStore::new(dir, "mail.example.org", "INBOX")
    }

    #[test]
    fn plan_full_mode_refetches_headers_only_uids() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.write_message(1, b"full", false).unwrap();
        store.write_message(2, b"headers", true).unwrap();

        let server = [uid(1), uid(2), uid(3)];
        let plan = plan_fetch(&store, &server, false).unwrap();
        assert_eq!(plan, vec![uid(2), uid(3)]);
    }

    #[test]
    fn plan_headers_mode_skips_any_local_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.write_message(1, b"full", false).unwrap();
        store.write_message(2, b"headers", true).unwrap();

        let server = [uid(1), uid(2), uid(3)];
        let plan = plan_fetch(&store, &server, true).unwrap();
        assert_eq!(plan, vec![uid(3)]);
    }

    #[test]
    fn plan_preserves_server_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let server = [uid(9), uid(3), uid(7)];
        let plan = plan_fetch(&store, &server, false).unwrap();
        assert_eq!(plan, vec![uid(9), uid(3), uid(7)]);
    }

    #[test]
    fn reconcile_writes_marker_on_first_sync() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        reconcile_uid_validity(&store, 42).unwrap();
        assert_eq!(store.read_marker().unwrap(), Some(42));
    }

    #[test]
    fn reconcile_keeps_matching_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.write_marker(42).unwrap();
        store.write_message(1, b"keep me", false).unwrap();

        reconcile_uid_validity(&store, 42).unwrap();
        assert!(store.message_path(1, false).exists());
        assert_eq!(store.read_marker().unwrap(), Some(42));
    }

    #[test]
    fn reconcile_discards_state_on_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.write_marker(42).unwrap();
        store.write_message(1, b"stale", false).unwrap();
        store.write_message(2, b"stale", true).unwrap();

        reconcile_uid_validity(&store, 99).unwrap();
        assert!(!store.message_path(1, false).exists());
        assert!(!store.message_path(2, true).exists());
        assert_eq!(store.read_marker().unwrap(), Some(99));
    }

    #[test]
    fn summary_lines() {
        let mut report = SyncReport {
            mailbox: "INBOX".into(),
            downloaded: 3,
            failed: 0,
            new_only: false,
            headers_only: false,
        };
        assert_eq!(report.summary(), "Downloaded 3 messages from mailbox INBOX");

        report.headers_only = true;
        assert_eq!(
            report.summary(),
            "Downloaded 3 message headers from mailbox INBOX"
        );

        report.headers_only = false;
        report.downloaded = 0;
        report.new_only = true;
        assert_eq!(report.summary(), "No new messages found");
    }
}
