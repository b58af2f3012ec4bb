//! Structured logging for the rowmend binary.
//!
//! - `RUST_LOG` filter, default `rowmend=info`
//! - JSON lines when `RUST_LOG_FORMAT=json`
//! - Always on stderr; stdout carries the run summary

use tracing_subscriber::EnvFilter;

/// Default filter directive
pub(crate) const DEFAULT_FILTER: &str = "rowmend=info";

/// Initialize the global tracing subscriber; later calls are no-ops.
pub(crate) fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let is_json = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if is_json {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_repeatable() {
        init();
        init();
    }

    #[test]
    fn default_filter_parses() {
        let filter = EnvFilter::new(DEFAULT_FILTER);
        assert!(format!("{filter:?}").contains("rowmend"));
    }
}
