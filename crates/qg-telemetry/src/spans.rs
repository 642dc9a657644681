use tracing::Span;

/// Span wrapping one scheduler cycle.
pub fn cycle_span(cycle: u64) -> Span {
    tracing::info_span!("cycle", cycle)
}

/// Span wrapping the processing of one change unit.
pub fn unit_span(number: u64) -> Span {
    tracing::info_span!("unit", unit = number)
}

/// Span wrapping one harness check.
pub fn check_span(name: &str, critical: bool) -> Span {
    tracing::debug_span!("check", check = %name, critical)
}
