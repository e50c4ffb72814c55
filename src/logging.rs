//! Logging setup.
//!
//! Structured console logging through `tracing`. `RUST_LOG` overrides the
//! default level chosen from the configuration.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default filter directive for the given debug flag
pub fn default_directive(debug_logging: bool) -> &'static str {
    if debug_logging {
        "location_sharing=debug,location_share=debug,info"
    } else {
        "info"
    }
}

/// Install the global subscriber.
///
/// Returns false if a subscriber was already installed, which is harmless and
/// happens when embedding applications set up their own.
pub fn init_logging(debug_logging: bool) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug_logging)));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init()
        .is_ok()
}
