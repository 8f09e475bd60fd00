// # dnsrec - DNS record reconciler
//
// Thin integration layer. All reconciliation logic lives in dnsrec-core;
// this binary only:
// 1. Reads configuration from environment variables
// 2. Initializes logging and the runtime
// 3. Registers the provider and record source
// 4. Runs one reconciliation pass and prints the exported values
//
// ## Configuration
//
// ### DNS Provider
// - `DNSREC_PROVIDER_TYPE`: Provider type (cloudflare)
// - `DNSREC_PROVIDER_API_TOKEN`: API token (required)
// - `DNSREC_ZONE_ID`: Zone ID (required)
// - `DNSREC_ACCOUNT_ID`: Account ID (optional)
// - `DNSREC_MODE`: `live` (default) or `dry-run`
//
// ### Records
// - `DNSREC_SOURCE_DIR`: Directory of `<type>.yaml` files (default `./records`)
// - `DNSREC_RECORD_TYPES`: Comma-separated record-type keys (default `arecord,cname`)
//
// ### Engine
// - `DNSREC_MAX_ATTEMPTS`: Create attempts per record, 1-10 (default 3)
// - `DNSREC_BACKOFF_UNIT_SECS`: Backoff unit, 0-300 (default 5)
// - `DNSREC_EXISTENCE_CHECK`: filter, composite_key or disabled (default filter)
//
// ### Output
// - `DNSREC_OUTPUT_PATH`: Also write the exported JSON here (optional)
// - `DNSREC_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export DNSREC_PROVIDER_API_TOKEN=your_token
// export DNSREC_ZONE_ID=023e105f4ecef8ad9ca31a8372d0c353
// export DNSREC_SOURCE_DIR=./records
//
// dnsrec > outputs.json
// ```

mod config;

use anyhow::{Context, Result};
use dnsrec_core::engine::ReconcileEvent;
use dnsrec_core::{BatchRunner, ProviderRegistry, Reconciler, RunReport};
use std::process::ExitCode;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Run completed, nothing failed
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
/// - 3: Run completed, at least one record failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DnsrecExitCode {
    /// Every record was created, skipped or absent from the source
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
    /// The run finished but some records were not reconciled
    RecordFailures = 3,
}

impl From<DnsrecExitCode> for ExitCode {
    fn from(code: DnsrecExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl DnsrecExitCode {
    fn for_report(report: &RunReport) -> Self {
        if report.cancelled || report.has_failures() {
            DnsrecExitCode::RecordFailures
        } else {
            DnsrecExitCode::Success
        }
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DnsrecExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DnsrecExitCode::ConfigError.into();
    }

    // Initialize tracing on stderr; stdout carries the exported values
    let log_level = match config.log_level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration validation error: {:#}", e);
            return DnsrecExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DnsrecExitCode::ConfigError.into();
    }

    info!("Starting dnsrec");
    debug!("Configuration: {:?}", config);

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DnsrecExitCode::RuntimeError.into();
        }
    };

    let output_path = config.output_path.clone();
    let report = match rt.block_on(run(config)) {
        Ok(report) => report,
        Err(e) => {
            error!("Run failed: {:#}", e);
            return DnsrecExitCode::RuntimeError.into();
        }
    };

    if let Err(e) = emit_exports(&report, output_path.as_deref()) {
        error!("Failed to write exported values: {:#}", e);
        return DnsrecExitCode::RuntimeError.into();
    }

    DnsrecExitCode::for_report(&report).into()
}

/// Run one reconciliation pass
async fn run(config: Config) -> Result<RunReport> {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "cloudflare")]
    {
        info!("Registering Cloudflare provider");
        dnsrec_provider_cloudflare::register(&registry, config.dry_run)?;
    }

    #[cfg(feature = "yaml")]
    {
        info!("Registering YAML record source");
        dnsrec_source_yaml::register(&registry)?;
    }

    let reconcile_config = config.reconcile_config();
    let provider = registry
        .create_provider(&reconcile_config.provider)
        .context("failed to create DNS provider")?;
    let source = registry
        .create_source(&reconcile_config.source)
        .context("failed to create record source")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (reconciler, events) =
        Reconciler::new(provider, reconcile_config.zone_id.clone(), &reconcile_config.engine)?;
    let reconciler = reconciler.with_shutdown(shutdown_rx);

    let event_task = tokio::spawn(log_events(events));
    let signal_task = tokio::spawn(async move {
        match wait_for_shutdown_signal().await {
            Ok(signal) => {
                warn!("Received {}, stopping after the in-flight request", signal);
                let _ = shutdown_tx.send(true);
            }
            Err(e) => error!("Signal handling unavailable: {}", e),
        }
    });

    let runner = BatchRunner::new(source, reconciler, reconcile_config.record_types.clone());
    let report = runner.run().await;

    signal_task.abort();
    // Dropping the runner closes the event channel and ends the logger
    drop(runner);
    if let Err(e) = event_task.await {
        warn!("Event logger ended abnormally: {}", e);
    }

    if report.cancelled {
        warn!("Run was interrupted; remaining records were not reconciled");
    }

    Ok(report)
}

/// Forward reconcile events to the debug log
async fn log_events(mut events: mpsc::Receiver<ReconcileEvent>) {
    while let Some(event) = events.recv().await {
        debug!("Reconcile event: {:?}", event);
    }
}

/// Print the exported values to stdout and optionally to a file
fn emit_exports(report: &RunReport, output_path: Option<&std::path::Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(&report.exports())?;
    println!("{}", json);

    if let Some(path) = output_path {
        std::fs::write(path, format!("{}\n", json))
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Exported values written to {}", path.display());
    }

    Ok(())
}

/// Wait for a shutdown signal (SIGTERM, SIGINT)
///
/// # Returns
///
/// The name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for a shutdown signal (Ctrl-C only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
