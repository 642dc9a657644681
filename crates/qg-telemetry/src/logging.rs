use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

/// `RUST_LOG` when set and valid, otherwise `fallback` (e.g. `"info"` or
/// `"qg_daemon=debug,warn"`).
fn filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Human-readable logs on stdout.
///
/// Only the first initialisation in a process takes effect.
pub fn init_logging(service_name: &str, default_level: &str) {
    let installed = fmt()
        .with_env_filter(filter(default_level))
        .with_target(false)
        .compact()
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(service = service_name, format = "text", "logging ready");
    }
}

/// One JSON object per line. Each event carries its innermost span, and span
/// closes are logged with their duration.
pub fn init_logging_json(service_name: &str, default_level: &str) {
    let installed = fmt()
        .json()
        .with_env_filter(filter(default_level))
        .with_current_span(true)
        .with_span_list(false)
        .with_span_events(FmtSpan::CLOSE)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(service = service_name, format = "json", "logging ready");
    }
}

pub fn init(service_name: &str, default_level: &str, json: bool) {
    if json {
        init_logging_json(service_name, default_level);
    } else {
        init_logging(service_name, default_level);
    }
}
