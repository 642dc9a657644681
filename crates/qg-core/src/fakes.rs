//! In-memory fakes for the process layer.
//!
//! [`ScriptedRunner`] answers commands from a list of prefix rules and models
//! just enough of `git` (current branch, checkout, branch creation) to verify
//! that callers always return the working tree to the baseline branch.

use std::path::Path;
use std::sync::Mutex;

use crate::process::{CommandError, CommandRunner, ToolOutput};

#[derive(Debug, Clone)]
enum Response {
    Output(ToolOutput),
    SpawnError,
}

#[derive(Debug, Clone)]
struct Rule {
    prefix: Vec<String>,
    response: Response,
}

/// Scripted [`CommandRunner`] that records every invocation.
#[derive(Debug)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    commands: Mutex<Vec<Vec<String>>>,
    branch: Mutex<String>,
}

impl ScriptedRunner {
    pub fn new(baseline: &str) -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            commands: Mutex::new(Vec::new()),
            branch: Mutex::new(baseline.to_string()),
        }
    }

    /// Answer commands starting with `prefix` (program first) with `output`.
    ///
    /// Rules are checked in insertion order; the first match wins.
    pub fn on(self, prefix: &[&str], output: ToolOutput) -> Self {
        self.push_rule(prefix, Response::Output(output));
        self
    }

    /// Make commands starting with `prefix` exit non-zero.
    pub fn fail(self, prefix: &[&str], exit_code: i32, stderr: &str) -> Self {
        let output = ToolOutput {
            exit_code,
            stdout: String::new(),
            stderr: stderr.to_string(),
        };
        self.on(prefix, output)
    }

    /// Make commands starting with `prefix` fail to spawn.
    pub fn spawn_error(self, prefix: &[&str]) -> Self {
        self.push_rule(prefix, Response::SpawnError);
        self
    }

    fn push_rule(&self, prefix: &[&str], response: Response) {
        let rule = Rule {
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            response,
        };
        lock(&self.rules).push(rule);
    }

    /// Branch the fake working tree is currently on.
    pub fn current_branch(&self) -> String {
        lock(&self.branch).clone()
    }

    /// Every command run so far, program first.
    pub fn commands(&self) -> Vec<Vec<String>> {
        lock(&self.commands).clone()
    }

    /// Number of recorded commands starting with `prefix`.
    pub fn count(&self, prefix: &[&str]) -> usize {
        lock(&self.commands)
            .iter()
            .filter(|cmd| starts_with(cmd, prefix))
            .count()
    }

    pub fn ran(&self, prefix: &[&str]) -> bool {
        self.count(prefix) > 0
    }

    fn simulate_git(&self, line: &[String]) -> ToolOutput {
        let args: Vec<&str> = line.iter().skip(1).map(String::as_str).collect();
        match args.as_slice() {
            ["rev-parse", "--abbrev-ref", "HEAD"] => ToolOutput {
                exit_code: 0,
                stdout: format!("{}\n", self.current_branch()),
                stderr: String::new(),
            },
            ["checkout", "-b", name, ..] => {
                *lock(&self.branch) = name.to_string();
                ToolOutput::with_code(0)
            }
            ["checkout", branch] => {
                *lock(&self.branch) = branch.to_string();
                ToolOutput::with_code(0)
            }
            _ => ToolOutput::with_code(0),
        }
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, _dir: &Path, program: &str, args: &[&str]) -> Result<ToolOutput, CommandError> {
        let mut line = vec![program.to_string()];
        line.extend(args.iter().map(|a| a.to_string()));
        lock(&self.commands).push(line.clone());

        let matched = lock(&self.rules)
            .iter()
            .find(|rule| {
                let prefix: Vec<&str> = rule.prefix.iter().map(String::as_str).collect();
                starts_with(&line, &prefix)
            })
            .map(|rule| rule.response.clone());

        match matched {
            Some(Response::Output(output)) => Ok(output),
            Some(Response::SpawnError) => Err(CommandError::Spawn {
                program: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted spawn failure"),
            }),
            None if program == "git" => Ok(self.simulate_git(&line)),
            None => Ok(ToolOutput::with_code(0)),
        }
    }
}

fn starts_with(line: &[String], prefix: &[&str]) -> bool {
    line.len() >= prefix.len() && line.iter().zip(prefix).all(|(a, b)| a == b)
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
