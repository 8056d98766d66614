//! Log initialization for `wolochaind`

use anyhow::{anyhow, bail, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub const FORMAT_PLAIN: &str = "plain";
pub const FORMAT_JSON: &str = "json";

/// Install the global subscriber. `RUST_LOG` wins over `level` when set.
/// Logs go to stderr so that command output on stdout stays machine readable.
pub fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = match format {
        FORMAT_PLAIN => builder.try_init(),
        FORMAT_JSON => builder.json().try_init(),
        other => bail!("unknown log format {other:?}, expected {FORMAT_PLAIN} or {FORMAT_JSON}"),
    };
    if let Err(e) = installed {
        // Commands run in-process (tests, embedding) find a subscriber already set.
        if tracing::dispatcher::has_been_set() {
            debug!("Keeping the existing log subscriber: {e}");
        } else {
            return Err(anyhow!("failed to install log subscriber: {e}"));
        }
    }
    Ok(())
}
