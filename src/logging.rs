use tracing::level_filters::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Output goes to stderr so command output on
/// stdout stays clean. An unparseable filter falls back to `warn`.
pub(crate) fn init(filter: &str) {
    let (env_filter, rejected) = match EnvFilter::try_new(filter) {
        Ok(f) => (f, None),
        Err(e) => (EnvFilter::default().add_directive(LevelFilter::WARN.into()), Some(e)),
    };

    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(env_filter),
        )
        .try_init()
        .is_ok();

    if let (true, Some(e)) = (installed, rejected) {
        tracing::warn!(filter, error = %e, "invalid log filter, using warn");
    }
}
