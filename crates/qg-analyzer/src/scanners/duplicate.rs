use ahash::AHashMap;
use qg_core::types::{Severity, Suggestion, SuggestionKind};

use crate::analyzer::{ScanError, Scanner, SourceFile};

/// Flags repeated blocks of `window` consecutive lines.
///
/// The window slides one line at a time over every file and blocks are
/// compared exactly as written. Blocks whose joined text is `min_chars` long
/// or shorter are ignored. The first occurrence is the reference; every later
/// occurrence yields one suggestion.
pub struct DuplicateScanner {
    window: usize,
    min_chars: usize,
}

impl DuplicateScanner {
    pub fn new(window: usize, min_chars: usize) -> Self {
        Self {
            window: window.max(1),
            min_chars,
        }
    }
}

impl Scanner for DuplicateScanner {
    fn name(&self) -> &'static str {
        "duplicate"
    }

    fn scan(&self, files: &[SourceFile]) -> Result<Vec<Suggestion>, ScanError> {
        let mut first_seen: AHashMap<String, (usize, usize)> = AHashMap::new();
        let mut out = Vec::new();

        for (file_idx, file) in files.iter().enumerate() {
            let lines: Vec<&str> = file.content.lines().collect();

            for (start, block) in lines.windows(self.window).enumerate() {
                let text = block.join("\n");
                if text.len() <= self.min_chars {
                    continue;
                }

                let line = start + 1;
                match first_seen.get(&text) {
                    Some(&(orig_file, orig_line)) => {
                        let origin = &files[orig_file].path;
                        out.push(
                            Suggestion::new(
                                SuggestionKind::Refactor,
                                Severity::Medium,
                                format!(
                                    "{}-line block duplicates {origin}:{orig_line}",
                                    self.window
                                ),
                                "Extract the repeated code into a shared function or module",
                            )
                            .at(&file.path, Some(line)),
                        );
                    }
                    None => {
                        first_seen.insert(text, (file_idx, line));
                    }
                }
            }
        }

        Ok(out)
    }
}
