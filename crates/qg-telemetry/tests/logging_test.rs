use qg_telemetry::{logging, spans};

#[test]
fn test_init_logging_human() {
    // A second call leaves the first subscriber in place.
    logging::init_logging("test-service", "debug");
    logging::init_logging("test-service", "info");

    tracing::info!(key = "value", "human-readable log line");
}

#[test]
fn test_init_logging_json() {
    // The global subscriber may already be set by another test; this no-ops then.
    logging::init_logging_json("test-service-json", "info");

    tracing::info!(key = "value", "json log line");
}

#[test]
fn test_init_by_flag() {
    logging::init("flag-test", "warn", true);
    logging::init("flag-test", "warn", false);
}

#[test]
fn spans_can_be_entered() {
    logging::init_logging("span-test", "debug");
    let cycle = spans::cycle_span(3);
    let _c = cycle.enter();
    let unit = spans::unit_span(42);
    let _u = unit.enter();
    spans::check_span("lint", false).in_scope(|| tracing::debug!("inside check"));
}
