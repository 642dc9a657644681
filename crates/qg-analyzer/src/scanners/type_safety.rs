use qg_core::types::{Severity, Suggestion, SuggestionKind};
use regex::Regex;

use crate::analyzer::{line_of, ScanError, Scanner, SourceFile};

const TYPED_EXTENSIONS: &[&str] = &["ts", "tsx"];

/// Flags explicit `any` and unannotated parameters in TypeScript sources.
pub struct TypeSafetyScanner {
    any: Regex,
    params: Regex,
}

impl TypeSafetyScanner {
    pub fn new() -> Result<Self, ScanError> {
        Ok(Self {
            any: Regex::new(r":\s*any\b|\bas\s+any\b|<any>")?,
            params: Regex::new(r"function\s*[\w$]*\s*\((?P<params>[^)]*)\)|\((?P<arrow>[^)]*)\)\s*=>")?,
        })
    }

    /// Unannotated parameters and the offset of the first offending list.
    fn untyped_params(&self, content: &str) -> (usize, Option<usize>) {
        let mut count = 0;
        let mut first = None;

        for caps in self.params.captures_iter(content) {
            let Some(list) = caps.name("params").or_else(|| caps.name("arrow")) else {
                continue;
            };
            // destructured parameters are not split reliably
            if list.as_str().contains(['{', '[']) {
                continue;
            }
            let untyped = list
                .as_str()
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty() && !p.contains(':') && !p.contains('='))
                .count();
            if untyped > 0 {
                count += untyped;
                first.get_or_insert(list.start());
            }
        }

        (count, first)
    }
}

impl Scanner for TypeSafetyScanner {
    fn name(&self) -> &'static str {
        "type-safety"
    }

    fn scan(&self, files: &[SourceFile]) -> Result<Vec<Suggestion>, ScanError> {
        let mut out = Vec::new();

        for file in files.iter().filter(|f| f.has_extension(TYPED_EXTENSIONS)) {
            let anys: Vec<usize> = self.any.find_iter(&file.content).map(|m| m.start()).collect();
            if let Some(&pos) = anys.first() {
                out.push(
                    Suggestion::new(
                        SuggestionKind::Improvement,
                        Severity::Low,
                        format!("{} explicit `any` type(s)", anys.len()),
                        "Replace `any` with a specific type or `unknown`",
                    )
                    .at(&file.path, Some(line_of(&file.content, pos))),
                );
            }

            let (untyped, first) = self.untyped_params(&file.content);
            if let Some(pos) = first {
                out.push(
                    Suggestion::new(
                        SuggestionKind::Improvement,
                        Severity::Low,
                        format!("{untyped} parameter(s) without a type annotation"),
                        "Annotate function parameters with explicit types",
                    )
                    .at(&file.path, Some(line_of(&file.content, pos))),
                );
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(path: &str, content: &str) -> Vec<Suggestion> {
        TypeSafetyScanner::new()
            .unwrap()
            .scan(&[SourceFile::new(path, content)])
            .unwrap()
    }

    #[test]
    fn counts_any_forms() {
        let content = "let a: any = 1;\nconst b = x as any;\nconst c = <any>y;\nconst d: Company = z;\n";
        let found = scan("src/a.ts", content);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "3 explicit `any` type(s)");
        assert_eq!(found[0].line, Some(1));
        assert_eq!(found[0].severity, Severity::Low);
    }

    #[test]
    fn counts_untyped_parameters() {
        let content = "function ok(a: number, b = 2) {}\n\nfunction bad(a, b) {}\nconst f = (x) => x;\n";
        let found = scan("src/b.ts", content);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "3 parameter(s) without a type annotation");
        assert_eq!(found[0].line, Some(3));
    }

    #[test]
    fn fully_typed_file_is_clean() {
        let content = "export function sum(a: number, b: number): number { return a + b; }\nconst id = (v: string) => v;\n";
        assert!(scan("src/c.tsx", content).is_empty());
    }

    #[test]
    fn javascript_files_are_ignored() {
        assert!(scan("src/d.js", "function f(a, b) { return a as any; }").is_empty());
    }
}
