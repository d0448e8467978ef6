//! Logger setup for the command-line tool.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Initializes the global logger.
///
/// `verbose` enables debug output, including every spawned command line.
/// Otherwise step progress is shown at info level. `RUST_LOG` overrides
/// both.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let env = Env::default().default_filter_or(level.to_string());
    let mut builder = Builder::from_env(env);
    builder.format_timestamp(None).format_target(false);

    // A second call is a no-op so tests can initialise freely.
    let _ = builder.try_init();
}
