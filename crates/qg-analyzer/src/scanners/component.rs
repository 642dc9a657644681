use qg_core::types::{Severity, Suggestion, SuggestionKind};
use regex::Regex;

use crate::analyzer::{ScanError, Scanner, SourceFile};

const COMPONENT_EXTENSIONS: &[&str] = &["jsx", "tsx", "vue", "svelte"];

/// Flags UI components with too many hooks or too many lines.
pub struct ComponentScanner {
    hook_threshold: usize,
    line_threshold: usize,
    hook: Regex,
    tag: Regex,
}

impl ComponentScanner {
    pub fn new(hook_threshold: usize, line_threshold: usize) -> Result<Self, ScanError> {
        Ok(Self {
            hook_threshold,
            line_threshold,
            hook: Regex::new(r"\buse[A-Z]\w*\(")?,
            tag: Regex::new(r"<[A-Za-z]")?,
        })
    }
}

impl Scanner for ComponentScanner {
    fn name(&self) -> &'static str {
        "component"
    }

    fn scan(&self, files: &[SourceFile]) -> Result<Vec<Suggestion>, ScanError> {
        let mut out = Vec::new();

        for file in files.iter().filter(|f| f.has_extension(COMPONENT_EXTENSIONS)) {
            let hooks = self.hook.find_iter(&file.content).count();
            let tags = self.tag.find_iter(&file.content).count();
            let lines = file.content.lines().count();

            if hooks > self.hook_threshold {
                out.push(
                    Suggestion::new(
                        SuggestionKind::Improvement,
                        Severity::Medium,
                        format!(
                            "Component calls {hooks} hooks (limit {}) across {tags} element tags",
                            self.hook_threshold
                        ),
                        "Group related state and effects into a custom hook",
                    )
                    .at(&file.path, None),
                );
            }

            if lines > self.line_threshold {
                out.push(
                    Suggestion::new(
                        SuggestionKind::Refactor,
                        Severity::High,
                        format!(
                            "Component is {lines} lines long (limit {}) with {tags} element tags",
                            self.line_threshold
                        ),
                        "Split the component into smaller child components",
                    )
                    .at(&file.path, None),
                );
            }
        }

        Ok(out)
    }
}
