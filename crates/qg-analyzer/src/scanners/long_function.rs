use qg_core::types::{Severity, Suggestion, SuggestionKind};
use regex::Regex;

use crate::analyzer::{ScanError, Scanner, SourceFile};

const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "function", "else", "do", "with",
];

/// Flags functions whose body spans more than `threshold` lines.
///
/// Tracks brace depth line by line. A declaration line opens a scope; the
/// scope closes when the depth returns to zero after the first `{`, which
/// may be on the same line.
pub struct LongFunctionScanner {
    threshold: usize,
    declarations: Vec<Regex>,
}

impl LongFunctionScanner {
    pub fn new(threshold: usize) -> Result<Self, ScanError> {
        let declarations = [
            // function name(  /  export async function* name(
            r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\*?\s+(?P<name>[A-Za-z_$][\w$]*)\s*\(",
            // const name = (..) =>  /  const name = async x =>
            r"^\s*(?:export\s+)?(?:const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)\s*(?::[^=]+)?=\s*(?:async\s+)?(?:\([^)]*\)|[A-Za-z_$][\w$]*)\s*(?::[^=]+)?=>",
            // fn name(
            r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?fn\s+(?P<name>[A-Za-z_]\w*)",
            // method shorthand: async name(..) {
            r"^\s*(?:(?:public|private|protected|static|async|get|set)\s+)*(?P<name>[A-Za-z_$][\w$]*)\s*\([^)]*\)\s*(?::[^{]+)?\{",
        ]
        .iter()
        .map(|p| Regex::new(p))
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            threshold,
            declarations,
        })
    }

    fn declaration<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.declarations.iter().find_map(|re| {
            let name = re.captures(line)?.name("name")?.as_str();
            (!CONTROL_KEYWORDS.contains(&name)).then_some(name)
        })
    }

    fn scan_file(&self, file: &SourceFile, out: &mut Vec<Suggestion>) {
        // (declaration line, name, entered body)
        let mut open: Option<(usize, String, bool)> = None;
        let mut depth: i64 = 0;

        for (idx, line) in file.content.lines().enumerate() {
            let line_no = idx + 1;

            let waiting = matches!(open, None | Some((_, _, false)));
            if waiting {
                if let Some(name) = self.declaration(line) {
                    open = Some((line_no, name.to_string(), false));
                    depth = 0;
                }
            }

            let mut opened_here = false;
            for c in line.chars() {
                match c {
                    '{' => {
                        depth += 1;
                        opened_here = true;
                    }
                    '}' => depth -= 1,
                    _ => {}
                }
            }

            let Some((start, name, entered)) = open.as_mut() else {
                continue;
            };
            if opened_here {
                *entered = true;
            }

            if *entered && depth <= 0 {
                let span = line_no - *start + 1;
                if span > self.threshold {
                    out.push(
                        Suggestion::new(
                            SuggestionKind::Refactor,
                            Severity::Medium,
                            format!(
                                "Function `{name}` is {span} lines long (limit {})",
                                self.threshold
                            ),
                            format!("Split `{name}` into smaller functions with one responsibility each"),
                        )
                        .at(&file.path, Some(*start)),
                    );
                }
                open = None;
                depth = 0;
            } else if !*entered && line.trim_end().ends_with(';') {
                // expression-bodied arrow function
                open = None;
                depth = 0;
            }
        }
    }
}

impl Scanner for LongFunctionScanner {
    fn name(&self) -> &'static str {
        "long-function"
    }

    fn scan(&self, files: &[SourceFile]) -> Result<Vec<Suggestion>, ScanError> {
        let mut out = Vec::new();
        for file in files {
            self.scan_file(file, &mut out);
        }
        Ok(out)
    }
}
