//! mailhaul - download IMAP mailboxes to local `.eml` files.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mailhaul_core::{Credentials, MailStore, SyncOptions, SyncReport, sync_mailbox};
use mailhaul_imap::{Client, Config, Security};

use cli::Cli;

fn main() -> ExitCode {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("Failed to install rustls crypto provider");
        return ExitCode::from(2);
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailhaul=info,mailhaul_core=info,mailhaul_imap=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // Usage and argument errors exit 1; --help and --version exit 0.
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let credentials = match Credentials::load(&args.auth_file) {
        Ok(credentials) => credentials,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to start runtime: {e}");
            return ExitCode::from(2);
        }
    };

    match runtime.block_on(run(&args, &credentials)) {
        Ok(report) => {
            println!("{}", report.summary());
            if report.failed > 0 {
                error!(failed = report.failed, "some messages could not be written");
                return ExitCode::from(2);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::from(2)
        }
    }
}

async fn run(args: &Cli, credentials: &Credentials) -> mailhaul_core::Result<SyncReport> {
    let security = if args.tls {
        Security::Tls
    } else {
        Security::Plain
    };
    let mut builder = Config::builder(&args.server)
        .port(args.effective_port())
        .security(security);
    if let Some(ca_file) = &args.ca_file {
        builder = builder.ca_file(ca_file);
    }
    if let Some(ca_dir) = &args.ca_dir {
        builder = builder.ca_dir(ca_dir);
    }
    let config = builder.build();

    let (stream, canonical_host) = mailhaul_imap::connect(&config).await?;
    info!(
        server = %args.server,
        host = %canonical_host,
        port = config.port,
        tls = args.tls,
        "connected"
    );

    let client = Client::from_stream_timeout(stream, config.read_timeout).await?;
    let client = client
        .login(&credentials.username, &credentials.password)
        .await?;

    let store = MailStore::new(&args.out_dir, canonical_host, &args.mailbox);
    let options = SyncOptions {
        mailbox: args.mailbox.clone(),
        new_only: args.new_only,
        headers_only: args.headers_only,
    };

    sync_mailbox(client, &store, &options).await
}
