//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

/// Download an IMAP mailbox into a local directory of `.eml` files.
///
/// Synchronization is incremental: messages already present locally are
/// not fetched again, and a UIDVALIDITY change on the server discards the
/// local state for the mailbox.
#[derive(Debug, Parser)]
#[command(name = "mailhaul", version, disable_help_flag = true)]
pub struct Cli {
    /// IMAP server hostname or address.
    pub server: String,

    /// TCP port (default: 143, or 993 with -T).
    #[arg(short = 'p', value_name = "port")]
    pub port: Option<u16>,

    /// Connect with TLS.
    #[arg(short = 'T')]
    pub tls: bool,

    /// CA certificate file (only with -T).
    #[arg(short = 'c', value_name = "certfile", requires = "tls")]
    pub ca_file: Option<PathBuf>,

    /// CA certificate directory (only with -T; default: /etc/ssl/certs).
    #[arg(short = 'C', value_name = "certaddr", requires = "tls")]
    pub ca_dir: Option<PathBuf>,

    /// Download only messages matching UID SEARCH NEW.
    #[arg(short = 'n')]
    pub new_only: bool,

    /// Download headers only (BODY.PEEK[HEADER]).
    #[arg(short = 'h')]
    pub headers_only: bool,

    /// Credentials file with `username = ...` and `password = ...` lines.
    #[arg(short = 'a', value_name = "auth_file")]
    pub auth_file: PathBuf,

    /// Mailbox to synchronize.
    #[arg(short = 'b', value_name = "MAILBOX", default_value = "INBOX")]
    pub mailbox: String,

    /// Output directory for downloaded messages.
    #[arg(short = 'o', value_name = "out_dir")]
    pub out_dir: PathBuf,

    /// Print help.
    #[arg(long, action = clap::ArgAction::Help)]
    help: Option<bool>,
}

impl Cli {
    /// Effective port: explicit `-p`, else the default for the mode.
    #[must_use]
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(if self.tls { 993 } else { 143 })
    }
}
