#![forbid(unsafe_code)]

//! Axum server exposing `/YTdown`.
//!
//! Lookups are answered live from the configured upstreams; nothing is cached
//! or stored between requests.

use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use ytdown::{
    config::{RuntimeConfig, RuntimeOverrides, resolve_runtime_config},
    orchestrator::Extractor,
    server::{AppState, router},
};

#[derive(Debug, Parser)]
#[command(name = "server", about = "YouTube metadata and download-link lookup API")]
struct ServerArgs {
    /// Address to listen on (overrides YTDOWN_HOST).
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides YTDOWN_PORT).
    #[arg(long)]
    port: Option<u16>,

    /// Mirror API base URL; repeat to build an ordered list.
    #[arg(long = "mirror", value_name = "URL")]
    mirrors: Vec<String>,

    /// Base URL for embed-page lookups.
    #[arg(long, value_name = "URL")]
    embed_base: Option<String>,

    /// Per-request upstream timeout.
    #[arg(long, value_name = "SECONDS")]
    timeout_secs: Option<u64>,

    /// Alternate `.env` file.
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,
}

impl ServerArgs {
    fn into_overrides(self) -> RuntimeOverrides {
        RuntimeOverrides {
            host: self.host,
            port: self.port,
            mirror_instances: (!self.mirrors.is_empty()).then_some(self.mirrors),
            embed_base: self.embed_base,
            timeout_secs: self.timeout_secs,
            env_path: self.env_file,
        }
    }
}

fn parse_host(value: &str) -> Result<IpAddr> {
    value
        .parse::<IpAddr>()
        .context("expected a valid IPv4 or IPv6 address for --host/YTDOWN_HOST")
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ytdown=info,server=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let RuntimeConfig {
        host,
        port,
        sources,
    } = resolve_runtime_config(ServerArgs::parse().into_overrides())
        .context("loading configuration")?;
    let host = parse_host(&host)?;

    info!(
        mirrors = sources.mirror_instances.len(),
        embed_base = %sources.embed_base,
        timeout_secs = sources.request_timeout.as_secs(),
        "configured upstream sources"
    );
    let app = router(AppState::new(Extractor::from_config(&sources)));

    let addr = SocketAddr::new(host, port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {}", addr))?;
    info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running API server")?;

    Ok(())
}

async fn shutdown_signal() {
    // Only graceful shutdown depends on this; Ctrl+C still ends the process.
    if let Err(err) = signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_args(extra: &[&str]) -> ServerArgs {
        ServerArgs::try_parse_from(std::iter::once("server").chain(extra.iter().copied()))
            .unwrap()
    }

    #[test]
    fn no_flags_leave_overrides_empty() {
        let overrides = parse_args(&[]).into_overrides();
        assert!(overrides.host.is_none());
        assert!(overrides.port.is_none());
        assert!(overrides.mirror_instances.is_none());
        assert!(overrides.env_path.is_none());
    }

    #[test]
    fn repeated_mirrors_keep_order() {
        let overrides = parse_args(&[
            "--mirror",
            "http://one.test",
            "--mirror=http://two.test",
            "--port",
            "9191",
            "--timeout-secs",
            "3",
        ])
        .into_overrides();
        assert_eq!(
            overrides.mirror_instances,
            Some(vec!["http://one.test".to_string(), "http://two.test".to_string()])
        );
        assert_eq!(overrides.port, Some(9191));
        assert_eq!(overrides.timeout_secs, Some(3));
    }

    #[test]
    fn rejects_unknown_flags_and_bad_ports() {
        assert!(ServerArgs::try_parse_from(["server", "--nope"]).is_err());
        assert!(ServerArgs::try_parse_from(["server", "--port", "70000"]).is_err());
    }

    #[test]
    fn host_must_be_an_ip_address() {
        assert!(parse_host("0.0.0.0").is_ok());
        assert!(parse_host("::1").is_ok());
        assert!(parse_host("localhost").is_err());
    }
}
