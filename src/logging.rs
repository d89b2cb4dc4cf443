use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Directive for a `-v` count: warn, info, debug, then trace.
pub fn level_for(verbosity: u8) -> &'static str {
  match verbosity {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  }
}

/// Install the global subscriber on stderr.
///
/// `RUST_LOG` wins over the `-v` count when set.
pub fn setup_logging(verbosity: u8) {
  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));

  let stderr_layer = fmt::layer()
    .with_writer(std::io::stderr)
    .with_target(false)
    .compact();

  let _ = tracing_subscriber::registry()
    .with(filter)
    .with(stderr_layer)
    .try_init();
}
