//! Logging initialization for embedders of the linking engine.
//!
//! Library code only emits `tracing` events; hosts that have no subscriber of
//! their own can call [`init_logging`] once at startup.

/// Initialize a global tracing subscriber.
///
/// The filter comes from `RUST_LOG` when set, otherwise from the provided
/// default level. `TERRACE_LOG_FORMAT=json` switches the output to one JSON
/// object per line.
///
/// Calling this more than once is harmless; later calls are ignored.
///
/// # Arguments
///
/// * `level` - Default log level (trace, debug, info, warn, error)
///
/// # Example
///
/// ```ignore
/// init_logging("info");
/// tracing::info!("Security settings surface ready");
/// ```
pub fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(parse_level(level).to_string()));

    let json_output = std::env::var("TERRACE_LOG_FORMAT")
        .ok()
        .and_then(non_empty_env)
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let already_set = if json_output {
        builder.json().try_init().is_err()
    } else {
        builder.try_init().is_err()
    };
    if already_set {
        tracing::debug!("Tracing subscriber already installed, keeping it");
    }
}

fn non_empty_env(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
