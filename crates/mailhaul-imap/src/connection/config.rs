//! Connection configuration types.

use std::path::PathBuf;
use std::time::Duration;

/// Connection security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// No encryption (port 143).
    Plain,
    /// TLS from the start (port 993).
    #[default]
    Tls,
}

impl Security {
    /// Returns the default port for this security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Plain => 143,
            Self::Tls => 993,
        }
    }
}

/// Conventional system directory holding CA certificates.
pub const DEFAULT_CA_DIR: &str = "/etc/ssl/certs";

/// IMAP connection configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server hostname as supplied by the caller.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Security mode.
    pub security: Security,
    /// Bound on the TCP connect attempt.
    pub connect_timeout: Duration,
    /// Bound on every individual read from the server.
    pub read_timeout: Duration,
    /// PEM file with additional trust anchors.
    pub ca_file: Option<PathBuf>,
    /// Directory of PEM trust anchors; `None` means [`DEFAULT_CA_DIR`].
    pub ca_dir: Option<PathBuf>,
}

impl Config {
    /// Creates a new configuration with implicit TLS on port 993.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Security::Tls.default_port(),
            security: Security::Tls,
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(5),
            ca_file: None,
            ca_dir: None,
        }
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(host)
    }
}

/// Builder for connection configuration.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    host: String,
    port: Option<u16>,
    security: Security,
    connect_timeout: Duration,
    read_timeout: Duration,
    ca_file: Option<PathBuf>,
    ca_dir: Option<PathBuf>,
}

impl ConfigBuilder {
    /// Creates a new builder with the given hostname.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            security: Security::Tls,
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(5),
            ca_file: None,
            ca_dir: None,
        }
    }

    /// Sets the port. Unset means the default port for the security mode.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the security mode.
    #[must_use]
    pub const fn security(mut self, security: Security) -> Self {
        self.security = security;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the per-read timeout.
    #[must_use]
    pub const fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets a PEM file with trust anchors.
    #[must_use]
    pub fn ca_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_file = Some(path.into());
        self
    }

    /// Sets a directory of PEM trust anchors.
    #[must_use]
    pub fn ca_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_dir = Some(path.into());
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        Config {
            port: self.port.unwrap_or_else(|| self.security.default_port()),
            host: self.host,
            security: self.security,
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
            ca_file: self.ca_file,
            ca_dir: self.ca_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ports() {
        assert_eq!(Security::Plain.default_port(), 143);
        assert_eq!(Security::Tls.default_port(), 993);
    }

    #[test]
    fn builder_defaults() {
        let config = Config::builder("imap.example.org").build();
        assert_eq!(config.host, "imap.example.org");
        assert_eq!(config.port, 993);
        assert_eq!(config.security, Security::Tls);
        assert_eq!(config.read_timeout, Duration::from_secs(5));
        assert!(config.ca_file.is_none());
    }

    #[test]
    fn builder_plain_default_port() {
        let config = Config::builder("imap.example.org")
            .security(Security::Plain)
            .build();
        assert_eq!(config.port, 143);
    }

    #[test]
    fn builder_explicit_port_wins() {
        let config = Config::builder("imap.example.org")
            .security(Security::Plain)
            .port(1143)
            .build();
        assert_eq!(config.port, 1143);
    }
}
