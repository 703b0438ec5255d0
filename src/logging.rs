// Logs go to stderr; stdout carries only the tool output.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Maps `--verbosity` onto a level: 0 warn, 1 info, 2 debug, 3 and up trace.
pub fn level_for(verbosity: u8, debug: bool) -> LevelFilter {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    if debug {
        level.max(LevelFilter::DEBUG)
    } else {
        level
    }
}

/// Installs the global subscriber. `RUST_LOG`, when set, takes precedence.
pub fn init(level: LevelFilter) {
    let filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();
    // a subscriber may already be installed when called more than once in a process
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
