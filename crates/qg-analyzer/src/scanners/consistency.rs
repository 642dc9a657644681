use qg_core::types::{Severity, Suggestion, SuggestionKind};
use regex::Regex;

use crate::analyzer::{ScanError, Scanner, SourceFile};

/// Project-wide style mix detection: quotes, semicolons, indentation.
pub struct ConsistencyScanner {
    single: Regex,
    double: Regex,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct StyleCounts {
    single_quotes: usize,
    double_quotes: usize,
    with_semicolon: usize,
    without_semicolon: usize,
    space_indent: usize,
    tab_indent: usize,
}

impl ConsistencyScanner {
    pub fn new() -> Result<Self, ScanError> {
        Ok(Self {
            single: Regex::new(r"'[^'\n]*'")?,
            double: Regex::new(r#""[^"\n]*""#)?,
        })
    }

    fn count(&self, files: &[SourceFile]) -> StyleCounts {
        let mut counts = StyleCounts::default();

        for file in files {
            for line in file.content.lines() {
                let code = line.trim();
                if code.is_empty() || is_comment(code) {
                    continue;
                }

                counts.single_quotes += self.single.find_iter(code).count();
                counts.double_quotes += self.double.find_iter(code).count();

                if is_statement(code) {
                    if code.ends_with(';') {
                        counts.with_semicolon += 1;
                    } else {
                        counts.without_semicolon += 1;
                    }
                }

                match line.chars().next() {
                    Some(' ') => counts.space_indent += 1,
                    Some('\t') => counts.tab_indent += 1,
                    _ => {}
                }
            }
        }

        counts
    }
}

fn is_comment(code: &str) -> bool {
    code.starts_with("//") || code.starts_with("/*") || code.starts_with('*')
}

/// Lines that would end a statement, excluding block and list punctuation.
fn is_statement(code: &str) -> bool {
    !code.starts_with('<')
        && !code.ends_with(['{', '}', '(', '[', ',', ':', '>', '|', '&', '+', '=', '.'])
}

fn mixed(
    first: (usize, &str),
    second: (usize, &str),
    what: &str,
) -> Option<Suggestion> {
    if first.0 == 0 || second.0 == 0 {
        return None;
    }
    let majority = if first.0 >= second.0 { first.1 } else { second.1 };
    Some(Suggestion::new(
        SuggestionKind::Consistency,
        Severity::Low,
        format!(
            "Mixed {what}: {} {} vs {} {}",
            first.0, first.1, second.0, second.1
        ),
        format!("Standardise on {majority} (the majority style) and enforce it with the formatter"),
    ))
}

impl Scanner for ConsistencyScanner {
    fn name(&self) -> &'static str {
        "consistency"
    }

    fn scan(&self, files: &[SourceFile]) -> Result<Vec<Suggestion>, ScanError> {
        let c = self.count(files);

        Ok([
            mixed(
                (c.single_quotes, "single quotes"),
                (c.double_quotes, "double quotes"),
                "quote styles",
            ),
            mixed(
                (c.with_semicolon, "lines with semicolons"),
                (c.without_semicolon, "lines without semicolons"),
                "statement terminators",
            ),
            mixed(
                (c.space_indent, "space-indented lines"),
                (c.tab_indent, "tab-indented lines"),
                "indentation",
            ),
        ]
        .into_iter()
        .flatten()
        .collect())
    }
}
