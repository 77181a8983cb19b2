use crate::error::CommentaryResult;
pub use tracing::instrument;
pub use tracing::{debug, error, info, trace, warn};
use tracing_error::ErrorLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Default filter used when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber: fmt output filtered by `RUST_LOG`, plus the
/// error layer that lets `CommentaryError` capture span traces.
pub fn init_tracing() -> CommentaryResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| crate::err!("Failed to initialise tracing: {}", e))
}
