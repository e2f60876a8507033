//! Tracing subscriber setup for binaries and manual runs.

use tracing_subscriber::EnvFilter;

/// Install a stderr `fmt` subscriber. `RUST_LOG` wins over `verbosity`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(verbosity: u8) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => EnvFilter::new(filter_for(verbosity)),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .try_init();
}

fn filter_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn,llm_auth_router=info",
        1 => "info,llm_auth_router=debug",
        _ => "debug,llm_auth_router=trace",
    }
}
