use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Held by `main` for the lifetime of the process.
pub struct TelemetryGuard {
    _private: (),
}

/// Install the global subscriber.
///
/// Output goes to stderr: stdout carries the chat transport. `RUST_LOG`
/// overrides the default `info` level and `ISSUEBOT_LOG_FORMAT=json` switches
/// to JSON lines.
pub fn init() -> TelemetryGuard {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let json = std::env::var("ISSUEBOT_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // A second init (tests, embedding) keeps the existing subscriber.
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };

    TelemetryGuard { _private: () }
}
