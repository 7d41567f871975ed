//! On-disk message store.
//!
//! The store owns every file in the output directory that follows the
//! naming convention
//!
//! ```text
//! <outdir>/<host>_<mailbox>_<uid>.eml            full message
//! <outdir>/<host>_<mailbox>_<uid>_headers.eml    headers-only artifact
//! <outdir>/<host>_uidvalidity_<mailbox>          UIDVALIDITY marker
//! ```
//!
//! where `<host>` is the canonical hostname of the server. UIDs are
//! recovered from filenames by stripping the known prefix and suffix;
//! anything with a non-numeric middle segment is ignored.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::{Error, Result};

/// Suffix of a full message artifact.
const FULL_SUFFIX: &str = ".eml";

/// Suffix of a headers-only artifact.
const HEADERS_SUFFIX: &str = "_headers.eml";

/// The partition of locally present UIDs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalInventory {
    /// UIDs whose only artifact is a headers-only file.
    pub headers_only: BTreeSet<u32>,
    /// UIDs with a complete message file.
    pub full: BTreeSet<u32>,
}

impl LocalInventory {
    /// Returns true if the UID is present in either category.
    #[must_use]
    pub fn contains(&self, uid: u32) -> bool {
        self.full.contains(&uid) || self.headers_only.contains(&uid)
    }
}

/// Store for one `(server, mailbox)` pair in one output directory.
#[derive(Debug, Clone)]
pub struct MailStore {
    outdir: PathBuf,
    host: String,
    mailbox: String,
}

impl MailStore {
    /// Creates a store rooted at `outdir` for the given canonical host and
    /// mailbox. Nothing is touched on disk until a write operation runs.
    #[must_use]
    pub fn new(outdir: impl Into<PathBuf>, host: impl Into<String>, mailbox: impl Into<String>) -> Self {
        Self {
            outdir: outdir.into(),
            host: host.into(),
            mailbox: mailbox.into(),
        }
    }

    /// Returns the output directory.
    #[must_use]
    pub fn outdir(&self) -> &Path {
        &self.outdir
    }

    /// Common prefix of every message artifact for this store.
    fn artifact_prefix(&self) -> String {
        format!("{}_{}_", self.host, self.mailbox)
    }

    /// Path of the message artifact for a UID.
    #[must_use]
    pub fn message_path(&self, uid: u32, headers_only: bool) -> PathBuf {
        let suffix = if headers_only { HEADERS_SUFFIX } else { FULL_SUFFIX };
        self.outdir
            .join(format!("{}{uid}{suffix}", self.artifact_prefix()))
    }

    /// Path of the UIDVALIDITY marker.
    #[must_use]
    pub fn marker_path(&self) -> PathBuf {
        self.outdir
            .join(format!("{}_uidvalidity_{}", self.host, self.mailbox))
    }

    /// Scans the output directory and classifies existing artifacts.
    ///
    /// A missing directory yields an empty inventory.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory exists but cannot be read.
    pub fn inventory(&self) -> Result<LocalInventory> {
        let mut inventory = LocalInventory::default();

        let entries = match std::fs::read_dir(&self.outdir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(inventory),
            Err(e) => return Err(Error::Io(e)),
        };

        let prefix = self.artifact_prefix();
        for entry in entries {
            let entry = entry.map_err(Error::Io)?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(rest) = name.strip_prefix(&prefix) else {
                continue;
            };

            if let Some(middle) = rest.strip_suffix(HEADERS_SUFFIX) {
                if let Ok(uid) = middle.parse::<u32>() {
                    inventory.headers_only.insert(uid);
                }
            } else if let Some(middle) = rest.strip_suffix(FULL_SUFFIX) {
                if let Ok(uid) = middle.parse::<u32>() {
                    inventory.full.insert(uid);
                }
            }
        }

        trace!(
            full = inventory.full.len(),
            headers = inventory.headers_only.len(),
            "local inventory"
        );
        Ok(inventory)
    }

    /// Reads the UIDVALIDITY marker.
    ///
    /// Returns `None` when no marker exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Marker`] when the marker exists but does not hold a
    /// decimal number.
    pub fn read_marker(&self) -> Result<Option<u32>> {
        let path = self.marker_path();
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        };
        let value = contents.trim().parse::<u32>().map_err(|_| Error::Marker {
            path,
            message: format!("expected a decimal UIDVALIDITY, found {:?}", contents.trim()),
        })?;
        Ok(Some(value))
    }

    /// Atomically replaces the UIDVALIDITY marker.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created or the marker
    /// cannot be written.
    pub fn write_marker(&self, uid_validity: u32) -> Result<()> {
        std::fs::create_dir_all(&self.outdir)?;
        let path = self.marker_path();
        // Write-then-rename; the dot prefix keeps the temp file outside the
        // artifact naming convention.
        let tmp = self
            .outdir
            .join(format!(".{}_uidvalidity_{}.tmp", self.host, self.mailbox));
        std::fs::write(&tmp, uid_validity.to_string())?;
        std::fs::rename(&tmp, &path)?;
        debug!(uid_validity, path = %path.display(), "UIDVALIDITY marker written");
        Ok(())
    }

    /// Removes every message artifact belonging to this `(host, mailbox)`.
    ///
    /// The marker is left in place; callers replace it separately.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory scan or a removal fails.
    pub fn invalidate(&self) -> Result<()> {
        let entries = match std::fs::read_dir(&self.outdir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(Error::Io(e)),
        };

        let prefix = self.artifact_prefix();
        let mut removed = 0usize;
        for entry in entries {
            let entry = entry.map_err(Error::Io)?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with(&prefix) {
                std::fs::remove_file(entry.path())?;
                removed += 1;
            }
        }

        debug!(removed, "local mailbox state invalidated");
        Ok(())
    }

    /// Writes one message artifact.
    ///
    /// Message bytes are written verbatim. Writing a full message removes
    /// any superseded headers-only artifact for the same UID first, so a
    /// later run never sees both.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created or the write
    /// fails.
    pub fn write_message(&self, uid: u32, raw: &[u8], headers_only: bool) -> Result<()> {
        std::fs::create_dir_all(&self.outdir)?;

        if !headers_only {
            let headers = self.message_path(uid, true);
            match std::fs::remove_file(&headers) {
                Ok(()) => debug!(uid, "removed superseded headers-only artifact"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }

        let path = self.message_path(uid, headers_only);
        std::fs::write(&path, raw)?;
        debug!(uid, bytes = raw.len(), path = %path.display(), "message written");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store(dir: &Path) -> MailStore {
        MailStore::new(dir, "mail.example.org", "INBOX")
    }

    #[test]
    fn inventory_of_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("not-there");
        let inv = store(&missing).inventory().unwrap();
        assert!(inv.full.is_empty());
        assert!(inv.headers_only.is_empty());
    }

    #[test]
    fn inventory_classifies_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        s.write_message(1, b"full one", false).unwrap();
        s.write_message(2, b"headers two", true).unwrap();
        s.write_message(3, b"full three", false).unwrap();

        let inv = s.inventory().unwrap();
        assert_eq!(inv.full.iter().copied().collect::<Vec<_>>(), [1, 3]);
        assert_eq!(inv.headers_only.iter().copied().collect::<Vec<_>>(), [2]);
    }

    #[test]
    fn inventory_ignores_foreign_and_non_numeric_files() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        s.write_message(1, b"mine", false).unwrap();
        std::fs::write(dir.path().join("other.example.org_INBOX_2.eml"), b"x").unwrap();
        std::fs::write(dir.path().join("mail.example.org_Sent_3.eml"), b"x").unwrap();
        std::fs::write(dir.path().join("mail.example.org_INBOX_abc.eml"), b"x").unwrap();
        std::fs::write(dir.path().join("unrelated.txt"), b"x").unwrap();

        let inv = s.inventory().unwrap();
        assert_eq!(inv.full.iter().copied().collect::<Vec<_>>(), [1]);
        assert!(inv.headers_only.is_empty());
    }

    #[test]
    fn marker_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        assert_eq!(s.read_marker().unwrap(), None);

        s.write_marker(42).unwrap();
        assert_eq!(s.read_marker().unwrap(), Some(42));

        s.write_marker(99).unwrap();
        assert_eq!(s.read_marker().unwrap(), Some(99));
    }

    #[test]
    fn garbage_marker_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        std::fs::create_dir_all(dir.path()).unwrap();
        std::fs::write(s.marker_path(), "not a number").unwrap();
        assert!(matches!(s.read_marker(), Err(Error::Marker { .. })));
    }

    #[test]
    fn invalidate_uses_strict_host_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        s.write_message(1, b"mine", false).unwrap();
        s.write_message(2, b"mine", true).unwrap();
        // Same mailbox on a different server must survive.
        let foreign = dir.path().join("other.example.org_INBOX_5.eml");
        std::fs::write(&foreign, b"keep").unwrap();

        s.invalidate().unwrap();

        assert!(!s.message_path(1, false).exists());
        assert!(!s.message_path(2, true).exists());
        assert!(foreign.exists());
        // The marker survives invalidation; reconciliation replaces it.
    }

    #[test]
    fn invalidate_leaves_marker() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        s.write_marker(42).unwrap();
        s.write_message(1, b"x", false).unwrap();

        s.invalidate().unwrap();
        assert_eq!(s.read_marker().unwrap(), Some(42));
    }

    #[test]
    fn full_write_removes_headers_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        s.write_message(7, b"headers", true).unwrap();
        assert!(s.message_path(7, true).exists());

        s.write_message(7, b"full body", false).unwrap();
        assert!(!s.message_path(7, true).exists());
        assert_eq!(std::fs::read(s.message_path(7, false)).unwrap(), b"full body");
    }

    #[test]
    fn message_bytes_are_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        let raw: Vec<u8> = (0..=255).collect();
        s.write_message(4, &raw, false).unwrap();
        assert_eq!(std::fs::read(s.message_path(4, false)).unwrap(), raw);
    }

    #[test]
    fn filenames_follow_the_convention() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        assert_eq!(
            s.message_path(12, false).file_name().unwrap(),
            "mail.example.org_INBOX_12.eml"
        );
        assert_eq!(
            s.message_path(12, true).file_name().unwrap(),
            "mail.example.org_INBOX_12_headers.eml"
        );
        assert_eq!(
            s.marker_path().file_name().unwrap(),
            "mail.example.org_uidvalidity_INBOX"
        );
    }
}
