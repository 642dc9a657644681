use std::time::Duration;

use crate::config::ConfigError;

/// Parse a schedule expression into a fixed tick interval.
///
/// Accepted forms:
/// - plain seconds: `"900"`
/// - suffixed: `"45s"`, `"30m"`, `"2h"`
/// - cron minute step: `"*/30 * * * *"` (every N minutes)
pub fn parse_interval(expr: &str) -> Result<Duration, ConfigError> {
    let expr = expr.trim();
    let invalid = || ConfigError::Validation(format!("unsupported schedule expression: {expr:?}"));

    let duration = if expr.contains(' ') {
        parse_cron_step(expr).ok_or_else(invalid)?
    } else if let Ok(secs) = expr.parse::<u64>() {
        Duration::from_secs(secs)
    } else {
        let (value, unit) = expr.split_at(expr.len().saturating_sub(1));
        let value: u64 = value.parse().map_err(|_| invalid())?;
        match unit {
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value * 60),
            "h" => Duration::from_secs(value * 3600),
            _ => return Err(invalid()),
        }
    };

    if duration.is_zero() {
        return Err(ConfigError::Validation(
            "schedule interval must be greater than zero".into(),
        ));
    }
    Ok(duration)
}

fn parse_cron_step(expr: &str) -> Option<Duration> {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    if fields.len() != 5 || fields[1..].iter().any(|f| *f != "*") {
        return None;
    }
    let minutes = match fields[0] {
        "*" => 1,
        step => step.strip_prefix("*/")?.parse::<u64>().ok()?,
    };
    Some(Duration::from_secs(minutes * 60))
}
