use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration loaded from `~/.qgate/config.toml`.
///
/// Credentials are never stored here: the GitHub token is read from the
/// environment variable named by [`GitHubConfig::token_env`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub harness: HarnessConfig,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub remediation: RemediationConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
}

impl Config {
    /// Load config from `~/.qgate/config.toml`, falling back to defaults
    /// when the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(path)
        } else {
            let cfg = Config::default();
            cfg.validate()?;
            Ok(cfg)
        }
    }

    /// Load from a specific path.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let cfg: Config = toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        self.validate()?;
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Semantic validation for settings that are not fully expressible via type checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.schedule.interval()?;
        self.harness.validate()?;
        self.remediation.validate()?;
        self.analyzer.validate()?;
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        expand_home("~/.qgate/config.toml")
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => PathBuf::from(path),
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(String),
    #[error("parse: {0}")]
    Parse(String),
    #[error("validation: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Section structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_project_name")]
    pub project_name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            project_name: default_project_name(),
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn default_project_name() -> String {
    "qgate".into()
}
fn default_log_level() -> String {
    "info".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Local checkout the pipeline operates on.
    #[serde(default = "default_repo_path")]
    pub path: String,
    #[serde(default = "default_baseline_branch")]
    pub baseline_branch: String,
    #[serde(default = "default_remote")]
    pub remote: String,
    /// Namespace for local unit refs and remediation branches.
    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            path: default_repo_path(),
            baseline_branch: default_baseline_branch(),
            remote: default_remote(),
            branch_prefix: default_branch_prefix(),
        }
    }
}

fn default_repo_path() -> String {
    ".".into()
}
fn default_baseline_branch() -> String {
    "main".into()
}
fn default_remote() -> String {
    "origin".into()
}
fn default_branch_prefix() -> String {
    "qgate".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    /// Name of the environment variable holding the API token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_per_page")]
    pub per_page: u8,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            token_env: default_token_env(),
            per_page: default_per_page(),
        }
    }
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".into()
}
fn default_per_page() -> u8 {
    50
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Schedule expression, see [`crate::schedule::parse_interval`].
    #[serde(default = "default_interval")]
    pub interval: String,
}

impl ScheduleConfig {
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        crate::schedule::parse_interval(&self.interval)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
        }
    }
}

fn default_interval() -> String {
    "*/30 * * * *".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_true")]
    pub test_on_new_unit: bool,
    #[serde(default = "default_true")]
    pub remediation_enabled: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            test_on_new_unit: true,
            remediation_enabled: true,
        }
    }
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Harness checks
// ---------------------------------------------------------------------------

/// How a check's process result is turned into pass/fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputPolicy {
    /// Non-zero exit fails the check.
    #[default]
    ExitCode,
    /// Non-zero exit passes when the tool's output reports no errors.
    WarningsTolerated,
}

/// One named step of the test harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSpec {
    pub name: String,
    pub command: Vec<String>,
    #[serde(default)]
    pub critical: bool,
    #[serde(default)]
    pub policy: OutputPolicy,
}

impl CheckSpec {
    pub fn critical(name: &str, command: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            command: command.iter().map(|s| s.to_string()).collect(),
            critical: true,
            policy: OutputPolicy::ExitCode,
        }
    }

    pub fn advisory(name: &str, command: &[&str]) -> Self {
        Self {
            critical: false,
            ..Self::critical(name, command)
        }
    }

    pub fn with_policy(mut self, policy: OutputPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default = "default_checks")]
    pub checks: Vec<CheckSpec>,
}

impl HarnessConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.checks.is_empty() {
            return Err(ConfigError::Validation(
                "harness.checks must declare at least one check".into(),
            ));
        }
        for check in &self.checks {
            if check.command.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "harness check {:?} has an empty command",
                    check.name
                )));
            }
        }
        Ok(())
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            checks: default_checks(),
        }
    }
}

fn default_checks() -> Vec<CheckSpec> {
    vec![
        CheckSpec::critical("install", &["npm", "ci"]),
        CheckSpec::critical("build", &["npm", "run", "build"]),
        CheckSpec::advisory("lint", &["npx", "eslint", ".", "--format", "json"])
            .with_policy(OutputPolicy::WarningsTolerated),
        CheckSpec::critical("type-check", &["npx", "tsc", "--noEmit"]),
        CheckSpec::critical("test", &["npm", "test"]),
        CheckSpec::advisory("audit", &["npm", "audit", "--audit-level=high"]),
    ]
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Directories (relative to the repository) to scan.
    #[serde(default = "default_source_dirs")]
    pub source_dirs: Vec<String>,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_long_function_lines")]
    pub long_function_lines: usize,
    #[serde(default = "default_duplicate_window")]
    pub duplicate_window: usize,
    #[serde(default = "default_duplicate_min_chars")]
    pub duplicate_min_chars: usize,
    #[serde(default = "default_hook_threshold")]
    pub component_hook_threshold: usize,
    #[serde(default = "default_component_lines")]
    pub component_line_threshold: usize,
    /// Lint command whose JSON output feeds the unused-import scanner.
    #[serde(default = "default_unused_lint_command")]
    pub unused_lint_command: Vec<String>,
}

impl AnalyzerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.duplicate_window == 0 {
            return Err(ConfigError::Validation(
                "analyzer.duplicate_window must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            source_dirs: default_source_dirs(),
            extensions: default_extensions(),
            long_function_lines: default_long_function_lines(),
            duplicate_window: default_duplicate_window(),
            duplicate_min_chars: default_duplicate_min_chars(),
            component_hook_threshold: default_hook_threshold(),
            component_line_threshold: default_component_lines(),
            unused_lint_command: default_unused_lint_command(),
        }
    }
}

fn default_source_dirs() -> Vec<String> {
    vec!["src".into()]
}
fn default_extensions() -> Vec<String> {
    ["js", "jsx", "ts", "tsx", "vue", "svelte"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_long_function_lines() -> usize {
    50
}
fn default_duplicate_window() -> usize {
    5
}
fn default_duplicate_min_chars() -> usize {
    50
}
fn default_hook_threshold() -> usize {
    8
}
fn default_component_lines() -> usize {
    300
}
fn default_unused_lint_command() -> Vec<String> {
    [
        "npx",
        "eslint",
        "src",
        "--format",
        "json",
        "--rule",
        "no-unused-vars:error",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

// ---------------------------------------------------------------------------
// Remediation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationConfig {
    #[serde(default = "default_formatter_command")]
    pub formatter_command: Vec<String>,
    #[serde(default = "default_lint_fix_command")]
    pub lint_fix_command: Vec<String>,
    /// Commit message; `{unit}` is replaced with the source unit number.
    #[serde(default = "default_commit_template")]
    pub commit_template: String,
    /// Remediation runs when more files than this changed...
    #[serde(default = "default_min_files")]
    pub min_files: usize,
    /// ...or more lines than this were added.
    #[serde(default = "default_min_additions")]
    pub min_additions: u64,
}

impl RemediationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.commit_template.contains("{unit}") {
            return Err(ConfigError::Validation(
                "remediation.commit_template must reference {unit}".into(),
            ));
        }
        Ok(())
    }

    pub fn commit_message(&self, unit: u64) -> String {
        self.commit_template.replace("{unit}", &unit.to_string())
    }
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            formatter_command: default_formatter_command(),
            lint_fix_command: default_lint_fix_command(),
            commit_template: default_commit_template(),
            min_files: default_min_files(),
            min_additions: default_min_additions(),
        }
    }
}

fn default_formatter_command() -> Vec<String> {
    ["npx", "prettier", "--write", "."]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_lint_fix_command() -> Vec<String> {
    ["npx", "eslint", ".", "--fix"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_commit_template() -> String {
    "chore: apply automated fixes for #{unit}".into()
}
fn default_min_files() -> usize {
    10
}
fn default_min_additions() -> u64 {
    200
}

// ---------------------------------------------------------------------------
// State, notifications, daemon
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: String,
    #[serde(default = "default_report_path")]
    pub report_path: String,
    /// Lookback window used when no checkpoint exists.
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: i64,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            checkpoint_path: default_checkpoint_path(),
            report_path: default_report_path(),
            lookback_hours: default_lookback_hours(),
        }
    }
}

fn default_checkpoint_path() -> String {
    "~/.qgate/last-check".into()
}
fn default_report_path() -> String {
    "~/.qgate/test-report.json".into()
}
fn default_lookback_hours() -> i64 {
    24
}

/// Notification channel toggles. Inert unless a notifier is wired in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default)]
    pub slack: bool,
    #[serde(default)]
    pub email: bool,
}

impl NotificationConfig {
    pub fn any_enabled(&self) -> bool {
        self.slack || self.email
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// How long shutdown waits for an in-flight cycle to finish.
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

fn default_drain_timeout_secs() -> u64 {
    30
}
