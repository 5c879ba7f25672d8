// # ddnsd - Cloudflare DDNS Daemon
//
// Thin integration layer: reads the environment, installs logging, wires the
// HTTP IP-echo source and the Cloudflare provider into the engine, and runs
// it until SIGTERM or SIGINT.
//
// ## Configuration
//
// ### Required
// - `CLOUDFLARE_ZONE`: Zone name, e.g. `example.com`
// - `CLOUDFLARE_RECORD`: A record to maintain, e.g. `home.example.com`
// - `CLOUDFLARE_TOKEN`: API token with DNS edit permission
//
// ### Optional
// - `IP_URL`: IP-echo endpoint (default `https://checkip.amazonaws.com`)
// - `INTERVAL_MINS`: Minutes between checks (default 5)
// - `CLOUDFLARE_DNS_TTL`: TTL sent with every write (default 1, automatic)
// - `LOG_LEVEL`: trace, debug, info, warn or error (default info)
// - `HTTP_TIMEOUT_SECS`: Per-request timeout (default 30)
// - `IP_FILE`: Path mirroring the last applied address
// - `DRY_RUN`: When true, look records up but never write them
// - `CLOUDFLARE_API_URL`: Override the API base URL
//
// ## Example
//
// ```bash
// export CLOUDFLARE_ZONE=example.com
// export CLOUDFLARE_RECORD=home.example.com
// export CLOUDFLARE_TOKEN=your_token
// export INTERVAL_MINS=10
//
// ddnsd
// ```

use anyhow::{Context, Result};
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use ddns_core::{DdnsConfig, DdnsEngine, EngineEvent};
use ddns_ip_http::HttpIpSource;
use ddns_provider_cloudflare::CloudflareProvider;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let (config, warnings) = match DdnsConfig::from_env() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    for warning in &warnings {
        warn!("{}", warning);
    }

    for line in banner() {
        info!("{}", line);
    }
    info!("Running every {} minutes", config.engine.interval.as_secs() / 60);
    debug!("Configuration: {:?}", config);

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => DdnsExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                exit_code_for(&e)
            }
        }
    });

    result.into()
}

fn banner() -> [&'static str; 3] {
    [
        "=========================",
        " Cloudflare DDNS Updater ",
        "=========================",
    ]
}

/// Startup failures caused by bad configuration exit with 1, anything else with 2
fn exit_code_for(e: &anyhow::Error) -> DdnsExitCode {
    match e.downcast_ref::<ddns_core::Error>() {
        Some(inner) if inner.is_fatal() => DdnsExitCode::ConfigError,
        _ => DdnsExitCode::RuntimeError,
    }
}

/// Run the daemon
async fn run_daemon(config: DdnsConfig) -> Result<()> {
    let ip_source = HttpIpSource::new(&config.ip_source)?;
    let provider = CloudflareProvider::new(&config.provider)?;

    info!("IP source: {}", ip_source.url());
    info!("Managing record: {}", config.provider.record);

    let (mut engine, mut events) =
        DdnsEngine::new(Box::new(ip_source), Box::new(provider), config.engine).await?;

    tokio::spawn(async move {
        let mut announced = false;
        while let Some(event) = events.recv().await {
            debug!("Engine event: {:?}", event);
            if !announced {
                if let Some(address) = resolved_address(&event) {
                    info!("Current IP: {}", address);
                    announced = true;
                }
            }
        }
    });

    let shutdown = shutdown_signal().context("Failed to install signal handlers")?;
    engine.run_until(shutdown).await?;

    info!("Shutting down daemon");
    Ok(())
}

/// The address a cycle resolved, for events that carry one
fn resolved_address(event: &EngineEvent) -> Option<&str> {
    match event {
        EngineEvent::UpdateSkipped { address } | EngineEvent::UpdateStarted { address, .. } => {
            Some(address)
        }
        _ => None,
    }
}

/// Build a future that completes on SIGTERM or SIGINT
///
/// Handlers are installed eagerly so a setup failure surfaces before the
/// engine starts.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl std::future::Future<Output = ()>> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!("Received shutdown signal: {}", name);
    })
}

/// Fallback for non-Unix platforms: SIGINT (ctrl-c) only
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl std::future::Future<Output = ()>> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal: SIGINT"),
            Err(e) => {
                error!("Failed to wait for CTRL-C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    })
}
