//! Subscriber setup for binaries embedding the engine.

use std::env;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding an `EnvFilter` directive string.
pub const LOG_ENV: &str = "INVITELIST_LOG";
/// Environment variable selecting `compact` (default) or `json` output.
pub const LOG_FORMAT_ENV: &str = "INVITELIST_LOG_FORMAT";

const fn default_directives(debug: bool) -> &'static str {
    if debug {
        "invitelist=debug,info"
    } else {
        "invitelist=info,warn"
    }
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed, which happens
/// when several tests or embedders race to initialise logging.
#[must_use]
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directives(env::var("DEBUG").is_ok())));

    let format = env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_ansi(false))
            .try_init()
            .is_ok(),
        _ => registry.with(fmt::layer().compact()).try_init().is_ok(),
    }
}
