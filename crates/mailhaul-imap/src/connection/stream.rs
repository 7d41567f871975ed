//! Stream types for IMAP connections.
//!
//! Opens the TCP connection under the configured connect timeout, performs
//! the optional TLS handshake with peer verification, and resolves the
//! canonical hostname that names all on-disk artifacts for this server.

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use rustls::RootCertStore;
use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::{debug, warn};

use super::config::{Config, DEFAULT_CA_DIR, Security};
use crate::{Error, Result};

/// A stream that can be either plaintext or TLS.
pub enum ImapStream {
    /// Plaintext TCP stream.
    Plain(TcpStream),
    /// TLS-encrypted stream (boxed to reduce enum size).
    Tls(Box<TlsStream<TcpStream>>),
}

impl ImapStream {
    /// Returns true if the stream is TLS-encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }
}

impl AsyncRead for ImapStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for ImapStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

/// Connects to the configured server.
///
/// Returns the connected stream together with the canonical hostname for
/// the server: the PTR name of the connected peer address, or the
/// caller-supplied host string when reverse resolution yields nothing.
///
/// # Errors
///
/// Returns [`Error::Dns`] when the host does not resolve,
/// [`Error::ConnectTimeout`] when the connect attempt exceeds the bound,
/// and [`Error::Tls`] when the handshake fails.
pub async fn connect(config: &Config) -> Result<(ImapStream, String)> {
    let addr = resolve(&config.host, config.port).await?;

    let tcp = timeout(config.connect_timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| Error::ConnectTimeout(config.connect_timeout))??;

    let canonical = canonical_host(addr, &config.host).await;
    debug!(host = %config.host, %canonical, port = config.port, "TCP connection established");

    let stream = match config.security {
        Security::Plain => ImapStream::Plain(tcp),
        Security::Tls => {
            let connector = tls_connector(config)?;
            let server_name = ServerName::try_from(config.host.clone())?;
            let tls = connector.connect(server_name, tcp).await?;
            ImapStream::Tls(Box::new(tls))
        }
    };

    Ok((stream, canonical))
}

/// Resolves the host to a socket address.
async fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    let mut addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|_| Error::Dns(host.to_string()))?;
    addrs.next().ok_or_else(|| Error::Dns(host.to_string()))
}

/// Looks up the canonical hostname for the connected peer.
///
/// Falls back to the caller-supplied host string when no PTR record exists
/// or the resolver cannot be constructed from system configuration.
async fn canonical_host(addr: SocketAddr, fallback: &str) -> String {
    let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|_| {
        TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
    });

    match resolver.reverse_lookup(addr.ip()).await {
        Ok(ptr) => ptr
            .iter()
            .next()
            .map_or_else(
                || fallback.to_string(),
                |name| name.to_utf8().trim_end_matches('.').to_string(),
            ),
        Err(e) => {
            debug!(ip = %addr.ip(), error = %e, "reverse lookup failed, using supplied hostname");
            fallback.to_string()
        }
    }
}

/// Creates a TLS connector from the configured trust anchors.
///
/// Explicitly given `ca_file`/`ca_dir` paths must yield at least one usable
/// anchor. With neither given, anchors are read from [`DEFAULT_CA_DIR`],
/// falling back to the bundled webpki roots when that directory is absent.
fn tls_connector(config: &Config) -> Result<TlsConnector> {
    let explicit = config.ca_file.is_some() || config.ca_dir.is_some();
    let mut roots = RootCertStore::empty();

    if let Some(file) = &config.ca_file {
        add_pem_file(&mut roots, file)?;
    }

    let dir = config
        .ca_dir
        .clone()
        .unwrap_or_else(|| DEFAULT_CA_DIR.into());
    match std::fs::read_dir(&dir) {
        Ok(entries) => {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() {
                    // Non-PEM files in a shared certs directory are expected; skip quietly.
                    let _ = add_pem_file(&mut roots, &path);
                }
            }
        }
        Err(e) if explicit => {
            return Err(Error::Io(e));
        }
        Err(_) => {}
    }

    if roots.is_empty() {
        if explicit {
            return Err(Error::Protocol(format!(
                "no usable trust anchors in {}",
                dir.display()
            )));
        }
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }

    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(tls_config)))
}

/// Adds all parseable certificates from a PEM file to the store.
fn add_pem_file(roots: &mut RootCertStore, path: &std::path::Path) -> Result<()> {
    let pem = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(pem);
    let certs: Vec<_> = rustls_pemfile::certs(&mut reader)
        .collect::<std::io::Result<_>>()
        .map_err(Error::Io)?;
    let (added, ignored) = roots.add_parsable_certificates(certs);
    if added == 0 && ignored > 0 {
        warn!(path = %path.display(), "no parseable certificates in file");
    }
    Ok(())
}
