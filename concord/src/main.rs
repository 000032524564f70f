use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use concord_core::config::{KeepaliveConfig, LoggingConfig, TlsConfig};
use concord_core::peer::PeerEndpoint;
use concord_core::tls::PeriodicCertLoader;
use concord_core::{logging, tls};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Role {
    /// Accept connections and wait for peers to dial in.
    Server,
    /// Dial a single peer and stay connected to it.
    Client,
}

#[derive(Parser, Debug)]
#[command(name = "concord")]
#[command(about = "Federated service discovery peer", long_about = None)]
struct Args {
    /// Whether this process accepts connections or dials out to one.
    #[arg(long, value_enum, env = "CONCORD_ROLE")]
    role: Role,

    /// Address to accept connections on (server role).
    #[arg(long, env = "CONCORD_LISTEN_ADDR", default_value = "0.0.0.0:7443")]
    listen_addr: String,

    /// Address of the peer to dial (client role).
    #[arg(long, env = "CONCORD_PEER_ADDR")]
    peer_addr: Option<String>,

    /// Resource type URL this peer publishes and subscribes to.
    #[arg(
        long,
        env = "CONCORD_RESOURCE_URL",
        default_value = concord_core::FEDERATED_SERVICE_RESOURCE_URL
    )]
    resource_url: String,

    /// Shared secret both peers must present on the handshake.
    #[arg(long, env = "CONCORD_CONTEXT_TOKEN", default_value = "")]
    context_token: String,

    /// Path to this peer's TLS certificate (PEM). Omit to run without TLS.
    #[arg(long, env = "CONCORD_TLS_CERT")]
    tls_cert: Option<String>,

    /// Path to this peer's TLS private key (PEM).
    #[arg(long, env = "CONCORD_TLS_KEY")]
    tls_key: Option<String>,

    /// Path to the CA bundle used to verify the other side's certificate.
    #[arg(long, env = "CONCORD_TLS_CA")]
    tls_ca: Option<String>,

    /// Skip server-certificate verification. Client role, test mode only.
    #[arg(long, env = "CONCORD_TLS_INSECURE", default_value_t = false)]
    insecure: bool,

    /// Log level.
    #[arg(long, env = "CONCORD_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format: "pretty" or "json".
    #[arg(long, env = "CONCORD_LOG_FORMAT", default_value = "pretty")]
    log_format: String,

    /// Optional path to a daily-rolling log file. Logs go to stdout when omitted.
    #[arg(long, env = "CONCORD_LOG_FILE")]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let logging_config = LoggingConfig {
        level: args.log_level.clone(),
        format: args.log_format.clone(),
        file_path: args.log_file.clone(),
    };
    // Held for the process lifetime: dropping it stops the non-blocking
    // writer thread and would silently truncate trailing log lines.
    let _log_guard = logging::init_logging(&logging_config).context("failed to initialize logging")?;

    let tls_config = TlsConfig {
        cert_path: args.tls_cert.clone(),
        key_path: args.tls_key.clone(),
        ca_path: args.tls_ca.clone(),
        insecure_skip_verify: args.insecure,
        reload_period_secs: 600,
    };
    let keepalive = KeepaliveConfig::default();

    let endpoint = PeerEndpoint::new();
    let cert_reload_cancel = CancellationToken::new();

    // Keep the in-memory identity fresh so a long-running peer can rotate
    // certificates without a restart. tonic's `Server`/`Endpoint` builders
    // only accept a TLS config at construction time, so this does not yet
    // hot-swap the live transport's credentials; it keeps the on-disk
    // keypair and the process's view of it from drifting apart, ready for
    // whichever transport-reload hook lands first.
    if let (Some(cert_path), Some(key_path)) = (args.tls_cert.clone(), args.tls_key.clone()) {
        let loader = Arc::new(PeriodicCertLoader::new(
            cert_path,
            key_path,
            Duration::from_secs(tls_config.reload_period_secs),
        )?);
        tokio::spawn(loader.run(cert_reload_cancel.clone()));
    }

    match args.role {
        Role::Server => {
            let listen_addr = args
                .listen_addr
                .parse()
                .context("invalid --listen-addr")?;
            let server_tls = tls::server_tls_config(&tls_config)?;

            info!(addr = %args.listen_addr, "accepting connections");
            tokio::select! {
                result = endpoint.clone().serve(listen_addr, args.context_token, server_tls, &keepalive) => {
                    if let Err(err) = result {
                        error!(%err, "server exited with error");
                        return Err(err.into());
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("received shutdown signal");
                    endpoint.shutdown();
                    cert_reload_cancel.cancel();
                }
            }
        }
        Role::Client => {
            let peer_addr = args
                .peer_addr
                .context("--peer-addr is required in client role")?;
            let client_tls = tls::client_tls_config(&tls_config)?;

            info!(addr = %peer_addr, "dialing peer");
            tokio::select! {
                result = endpoint.clone().dial(peer_addr, args.resource_url, args.context_token, client_tls, &keepalive) => {
                    if let Err(err) = result {
                        error!(%err, "client stream exited with error");
                        return Err(err.into());
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("received shutdown signal");
                    endpoint.shutdown();
                    cert_reload_cancel.cancel();
                }
            }
        }
    }

    info!("concord peer shutting down");
    Ok(())
}
