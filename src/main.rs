//! location-share - replay a recorded track through the sharing controller
//!
//! Useful for exercising a backend with realistic movement, or with `--dry-run`
//! for checking which fixes the update policy would send.

use clap::Parser;
use location_sharing::logging::init_logging;
use location_sharing::source::LocationSource;
use location_sharing::transport::{HttpLocationSubmitter, LocationSubmitter, MockSubmitter, RestClient};
use location_sharing::{ConfigurationManager, ReplaySource, SessionAuthGate, SharingController};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "location-share")]
#[command(about = "Share a recorded location track with the backend", long_about = None)]
struct Args {
    /// JSON configuration file (defaults are used when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON array of location fixes to replay
    #[arg(long)]
    track: PathBuf,

    /// Bearer token for the backend
    #[arg(long, env = "LOCATION_SHARE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Record submissions locally instead of calling the backend
    #[arg(long)]
    dry_run: bool,

    /// Replay speed multiplier; 0 replays without delays
    #[arg(long, default_value = "1.0")]
    speedup: f64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let manager = match &args.config {
        Some(path) => match ConfigurationManager::from_file(path) {
            Ok(manager) => manager,
            Err(e) => {
                eprintln!("Error loading configuration: {}", e);
                process::exit(1);
            }
        },
        None => ConfigurationManager::new(),
    };
    let config = manager.config().clone();
    init_logging(config.debug_logging);

    if !(args.speedup.is_finite() && args.speedup >= 0.0) {
        error!(speedup = args.speedup, "speedup must be zero or a positive number");
        process::exit(1);
    }

    let source = match ReplaySource::from_file(&args.track) {
        Ok(source) => source.with_speedup(args.speedup),
        Err(e) => {
            error!(error = %e, "cannot load track");
            process::exit(1);
        }
    };

    let auth = Arc::new(match &args.token {
        Some(token) => SessionAuthGate::authenticated(token.clone()),
        None if args.dry_run => SessionAuthGate::authenticated("dry-run"),
        None => {
            error!("no token given; pass --token or set LOCATION_SHARE_TOKEN");
            process::exit(1);
        }
    });

    let dry_run = args.dry_run.then(MockSubmitter::immediate);
    let submitter: Arc<dyn LocationSubmitter> = match &dry_run {
        Some(mock) => Arc::new(mock.clone()),
        None => match RestClient::new(&config.api) {
            Ok(client) => Arc::new(HttpLocationSubmitter::new(client, config.api.location_path.clone())),
            Err(e) => {
                error!(error = %e, "cannot create HTTP client");
                process::exit(1);
            }
        },
    };

    let controller = SharingController::new(config.policy, auth, submitter);

    let events = match source.subscribe(&config.location_request) {
        Ok(events) => events,
        Err(e) => {
            error!(error = %e, "cannot subscribe to track");
            process::exit(1);
        }
    };
    let forwarder = controller.attach_source(events);
    controller.on_map_ready();

    if let Err(e) = forwarder.await {
        error!(error = %e, "track replay ended abnormally");
    }
    if let Err(e) = controller.flush().await {
        error!(error = %e, "controller closed before the track finished");
    }
    let mut updates = controller.subscribe();
    let timed_out = tokio::time::timeout(
        Duration::from_secs(config.api.timeout_secs),
        updates.wait_for(|status| !status.is_submitting()),
    )
    .await
    .is_err();
    if timed_out {
        error!("last submission did not finish in time");
    }

    let status = controller.status();
    info!(
        state = ?status.state,
        sent = status.sent_count,
        failed = status.failed_count,
        last_error = ?status.last_error,
        "replay finished"
    );
    if let Some(mock) = &dry_run {
        for fix in mock.submitted_fixes() {
            println!("{:.6},{:.6},{}", fix.latitude, fix.longitude, fix.timestamp_ms);
        }
    }

    controller.shutdown().await;
}
