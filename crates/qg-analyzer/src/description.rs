//! Body text for an automated-fix change unit.

use std::fmt::Write;

use qg_core::types::{Severity, Suggestion};

const FIXES_NOTE: &str = "Automatic fixes applied: code formatting and lint auto-fixes. \
The suggestions above were not changed automatically and need manual review.";

/// Render the description of the remediation unit for `unit`.
///
/// Suggestions are grouped by severity, highest first; empty groups are
/// omitted. Within a group the input order is kept.
pub fn render(unit: u64, suggestions: &[Suggestion]) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "## Automated fixes for #{unit}");
    let _ = writeln!(body);
    let _ = writeln!(
        body,
        "This change was generated by the quality gate for #{unit}."
    );

    for severity in [Severity::High, Severity::Medium, Severity::Low] {
        let group: Vec<&Suggestion> = suggestions.iter().filter(|s| s.severity == severity).collect();
        if group.is_empty() {
            continue;
        }
        let _ = writeln!(body);
        let _ = writeln!(body, "### {} Priority", title(severity));
        let _ = writeln!(body);
        for s in group {
            let _ = writeln!(body, "- {}{}: {}", location(s), s.message, s.remediation);
        }
    }

    let _ = writeln!(body);
    let _ = writeln!(body, "{FIXES_NOTE}");
    body
}

fn title(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "High",
        Severity::Medium => "Medium",
        Severity::Low => "Low",
    }
}

fn location(s: &Suggestion) -> String {
    match (&s.file, s.line) {
        (Some(file), Some(line)) => format!("[{file}:{line}] "),
        (Some(file), None) => format!("[{file}] "),
        _ => String::new(),
    }
}
