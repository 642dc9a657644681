use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::WalkBuilder;
use qg_core::config::AnalyzerConfig;
use qg_core::process::{CommandError, CommandRunner};
use qg_core::types::Suggestion;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::scanners::{
    ComponentScanner, ConsistencyScanner, DuplicateScanner, LongFunctionScanner,
    TypeSafetyScanner, UnusedImportScanner,
};

/// Files larger than this are skipped.
pub const MAX_SOURCE_FILE_SIZE: u64 = 1024 * 1024;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid scanner pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("{scanner}: {source}")]
    Tool {
        scanner: &'static str,
        #[source]
        source: CommandError,
    },

    #[error("{scanner}: unreadable tool output: {message}")]
    Output {
        scanner: &'static str,
        message: String,
    },
}

// ---------------------------------------------------------------------------
// SourceFile / Scanner
// ---------------------------------------------------------------------------

/// A source file loaded for scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the repository root, `/`-separated.
    pub path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn extension(&self) -> Option<&str> {
        let name = self.path.rsplit('/').next()?;
        name.rsplit_once('.').map(|(_, ext)| ext)
    }

    pub fn has_extension(&self, exts: &[&str]) -> bool {
        self.extension().is_some_and(|e| exts.contains(&e))
    }
}

/// One independent heuristic.
pub trait Scanner: Send + Sync {
    fn name(&self) -> &'static str;

    fn scan(&self, files: &[SourceFile]) -> Result<Vec<Suggestion>, ScanError>;
}

/// 1-based line number of byte offset `pos` in `content`.
pub(crate) fn line_of(content: &str, pos: usize) -> usize {
    content[..pos].matches('\n').count() + 1
}

// ---------------------------------------------------------------------------
// StaticAnalyzer
// ---------------------------------------------------------------------------

pub struct StaticAnalyzer {
    root: PathBuf,
    source_dirs: Vec<String>,
    extensions: Vec<String>,
    scanners: Vec<Box<dyn Scanner>>,
}

impl StaticAnalyzer {
    /// Analyzer with the standard scanner set, in reporting order.
    pub fn from_config(
        root: impl Into<PathBuf>,
        config: &AnalyzerConfig,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self, ScanError> {
        let root = root.into();
        let scanners: Vec<Box<dyn Scanner>> = vec![
            Box::new(LongFunctionScanner::new(config.long_function_lines)?),
            Box::new(DuplicateScanner::new(
                config.duplicate_window,
                config.duplicate_min_chars,
            )),
            Box::new(ComponentScanner::new(
                config.component_hook_threshold,
                config.component_line_threshold,
            )?),
            Box::new(TypeSafetyScanner::new()?),
            Box::new(UnusedImportScanner::new(
                runner,
                root.clone(),
                config.unused_lint_command.clone(),
            )),
            Box::new(ConsistencyScanner::new()?),
        ];

        Ok(Self::with_scanners(
            root,
            config.source_dirs.clone(),
            config.extensions.clone(),
            scanners,
        ))
    }

    pub fn with_scanners(
        root: impl Into<PathBuf>,
        source_dirs: Vec<String>,
        extensions: Vec<String>,
        scanners: Vec<Box<dyn Scanner>>,
    ) -> Self {
        Self {
            root: root.into(),
            source_dirs,
            extensions,
            scanners,
        }
    }

    pub fn scanner_names(&self) -> Vec<&'static str> {
        self.scanners.iter().map(|s| s.name()).collect()
    }

    /// Walk the configured source directories and run every scanner.
    pub fn analyze(&self) -> Vec<Suggestion> {
        let files = self.collect_files();
        info!(files = files.len(), root = %self.root.display(), "static analysis started");
        let suggestions = self.analyze_files(&files);
        info!(suggestions = suggestions.len(), "static analysis finished");
        suggestions
    }

    /// Run every scanner over `files`. A failing scanner is logged and skipped.
    pub fn analyze_files(&self, files: &[SourceFile]) -> Vec<Suggestion> {
        let mut suggestions = Vec::new();
        for scanner in &self.scanners {
            match scanner.scan(files) {
                Ok(found) => {
                    debug!(scanner = scanner.name(), count = found.len(), "scanner finished");
                    suggestions.extend(found);
                }
                Err(e) => warn!(scanner = scanner.name(), error = %e, "scanner failed"),
            }
        }
        suggestions
    }

    /// Load every matching file under the source directories, sorted by path.
    pub fn collect_files(&self) -> Vec<SourceFile> {
        let mut files = Vec::new();

        for dir in &self.source_dirs {
            let start = self.root.join(dir);
            if !start.exists() {
                debug!(dir = %start.display(), "source directory missing, skipping");
                continue;
            }

            let mut builder = WalkBuilder::new(&start);
            builder.standard_filters(true);
            builder.follow_links(false);

            for entry in builder.build() {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!(error = %e, "walk error");
                        continue;
                    }
                };
                if !entry.file_type().is_some_and(|t| t.is_file()) {
                    continue;
                }
                if let Some(file) = self.load(entry.path()) {
                    files.push(file);
                }
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        files.dedup_by(|a, b| a.path == b.path);
        files
    }

    fn load(&self, path: &Path) -> Option<SourceFile> {
        let ext = path.extension()?.to_str()?;
        if !self.extensions.iter().any(|e| e == ext) {
            return None;
        }

        let size = std::fs::metadata(path).ok()?.len();
        if size > MAX_SOURCE_FILE_SIZE {
            debug!(path = %path.display(), size, "file too large, skipping");
            return None;
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "unreadable file, skipping");
                return None;
            }
        };

        Some(SourceFile::new(relative_path(&self.root, path), content))
    }
}

/// `path` relative to `root`, with `/` separators.
pub(crate) fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_of_nested_path() {
        let f = SourceFile::new("src/components/Button.test.tsx", "");
        assert_eq!(f.extension(), Some("tsx"));
        assert!(f.has_extension(&["jsx", "tsx"]));
        assert_eq!(SourceFile::new("Makefile", "").extension(), None);
    }

    #[test]
    fn line_numbers_are_one_based() {
        let text = "a\nb\nc";
        assert_eq!(line_of(text, 0), 1);
        assert_eq!(line_of(text, 2), 2);
        assert_eq!(line_of(text, 4), 3);
    }

    #[test]
    fn relative_paths_use_forward_slashes() {
        let root = Path::new("/repo");
        assert_eq!(relative_path(root, Path::new("/repo/src/a.ts")), "src/a.ts");
    }
}
