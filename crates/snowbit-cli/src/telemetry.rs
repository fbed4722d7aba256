//! Log output for the `snowbit` binary.
//!
//! Identifiers go to stdout; logs go to stderr so the two can be piped
//! separately. The filter is read from `RUST_LOG` and defaults to `warn`:
//!
//! ```bash
//! RUST_LOG=snowbit=debug snowbit generate -n 5000
//! ```

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339()),
        )
        .try_init()?;
    Ok(())
}
