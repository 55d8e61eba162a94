//! Log output for the binary.
//!
//! Library code logs through the `log` macros; records are forwarded into a
//! `tracing-subscriber` formatter on stderr so they never mix with the
//! interactive output on stdout.
//!
//! Filter priority: `CONTACT_BOOK_LOG`, then `RUST_LOG`, then the verbosity
//! default (`warn`, or `debug` with `--verbose`).

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "CONTACT_BOOK_LOG";

fn build_env_filter(verbose: bool) -> EnvFilter {
    for var in [LOG_ENV, "RUST_LOG"] {
        if let Ok(directives) = std::env::var(var)
            && let Ok(filter) = EnvFilter::try_new(&directives)
        {
            return filter;
        }
    }
    EnvFilter::new(if verbose { "contact_book=debug,warn" } else { "warn" })
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(verbose: bool) {
    let stderr_is_tty = std::io::IsTerminal::is_terminal(&std::io::stderr());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(verbose))
        .with_writer(std::io::stderr)
        .with_ansi(stderr_is_tty)
        .with_target(true)
        .without_time()
        .compact()
        .try_init();
}
