//! Classification of lint tool output.
//!
//! Linters commonly exit non-zero for warnings alone. A check running under
//! `OutputPolicy::WarningsTolerated` asks [`classify`] whether the output
//! actually reports error-severity findings.

use serde_json::Value;

/// ESLint message severity for errors.
const ESLINT_ERROR_SEVERITY: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintVerdict {
    /// Output was present and reported no errors.
    Clean,
    /// Output reported this many errors.
    Errors(usize),
    /// Nothing to classify.
    NoOutput,
}

/// Classify tool output, trying in order: an ESLint-style JSON report, an
/// `N error(s)` summary line, then any line mentioning an error.
pub fn classify(output: &str) -> LintVerdict {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return LintVerdict::NoOutput;
    }

    let count = json_error_count(trimmed)
        .or_else(|| summary_error_count(trimmed))
        .unwrap_or_else(|| error_line_count(trimmed));

    if count == 0 {
        LintVerdict::Clean
    } else {
        LintVerdict::Errors(count)
    }
}

/// Error count from an ESLint `--format json` report.
///
/// Uses the per-file `errorCount` when present, otherwise counts messages
/// with severity 2.
pub fn json_error_count(text: &str) -> Option<usize> {
    let start = text.find('[')?;
    let files: Vec<Value> = serde_json::from_str(&text[start..]).ok()?;

    let total = files
        .iter()
        .map(|file| match file.get("errorCount").and_then(Value::as_u64) {
            Some(n) => n as usize,
            None => file
                .get("messages")
                .and_then(Value::as_array)
                .map(|msgs| {
                    msgs.iter()
                        .filter(|m| {
                            m.get("severity").and_then(Value::as_u64)
                                == Some(ESLINT_ERROR_SEVERITY)
                        })
                        .count()
                })
                .unwrap_or(0),
        })
        .sum();
    Some(total)
}

/// Sum of `N error` / `N errors` phrases, if any appear.
fn summary_error_count(text: &str) -> Option<usize> {
    let mut found = false;
    let mut total = 0;
    for line in text.lines() {
        let words: Vec<String> = line.split_whitespace().map(clean_word).collect();
        for pair in words.windows(2) {
            if let (Ok(n), true) = (pair[0].parse::<usize>(), is_error_word(&pair[1])) {
                found = true;
                total += n;
            }
        }
    }
    found.then_some(total)
}

fn error_line_count(text: &str) -> usize {
    text.lines()
        .filter(|line| {
            line.split(|c: char| !c.is_ascii_alphanumeric())
                .any(|w| is_error_word(&w.to_ascii_lowercase()))
        })
        .count()
}

fn clean_word(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_ascii_lowercase()
}

fn is_error_word(word: &str) -> bool {
    word == "error" || word == "errors"
}
