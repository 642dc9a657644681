#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qg_core::types::{ChangeUnit, ChangedFile, PipelineRun};
use qg_daemon::notifier::Notifier;
use qg_integrations::tracker::Result;
use qg_integrations::types::{NewUnit, OpenedUnit};
use qg_integrations::{TrackerError, UnitTracker};

pub fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

pub fn unit(number: u64, created_at: &str) -> ChangeUnit {
    ChangeUnit {
        number,
        title: format!("Unit {number}"),
        source_branch: format!("feature/{number}"),
        base_branch: "main".into(),
        author: "octo".into(),
        created_at: ts(created_at),
        html_url: format!("https://github.com/acme/web/pull/{number}"),
    }
}

pub fn file(path: &str, additions: u64, deletions: u64) -> ChangedFile {
    ChangedFile {
        path: path.into(),
        status: "modified".into(),
        additions,
        deletions,
    }
}

/// In-memory tracker: serves units newest first and records every write.
#[derive(Default)]
pub struct MockTracker {
    units: Vec<ChangeUnit>,
    files: HashMap<u64, Vec<ChangedFile>>,
    pub pages: Mutex<Vec<u32>>,
    pub comments: Mutex<Vec<(u64, String)>>,
    pub opened: Mutex<Vec<NewUnit>>,
    pub fail_listing: AtomicBool,
    pub fail_open: AtomicBool,
    pub fail_comment: AtomicBool,
}

impl MockTracker {
    pub fn new(mut units: Vec<ChangeUnit>) -> Self {
        units.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self {
            units,
            ..Default::default()
        }
    }

    pub fn with_files(mut self, number: u64, files: Vec<ChangedFile>) -> Self {
        self.files.insert(number, files);
        self
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        self.pages.lock().unwrap().clone()
    }

    pub fn comments(&self) -> Vec<(u64, String)> {
        self.comments.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<NewUnit> {
        self.opened.lock().unwrap().clone()
    }

    fn failure(operation: &'static str) -> TrackerError {
        TrackerError::Request {
            operation,
            message: "scripted failure".into(),
        }
    }
}

#[async_trait]
impl UnitTracker for MockTracker {
    async fn list_open_units(&self, page: u32, per_page: u8) -> Result<Vec<ChangeUnit>> {
        self.pages.lock().unwrap().push(page);
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(Self::failure("list_open_units"));
        }
        let per_page = usize::from(per_page);
        let start = (page as usize - 1) * per_page;
        Ok(self.units.iter().skip(start).take(per_page).cloned().collect())
    }

    async fn list_changed_files(&self, number: u64) -> Result<Vec<ChangedFile>> {
        Ok(self.files.get(&number).cloned().unwrap_or_default())
    }

    async fn post_comment(&self, number: u64, body: &str) -> Result<()> {
        if self.fail_comment.load(Ordering::SeqCst) {
            return Err(Self::failure("post_comment"));
        }
        self.comments.lock().unwrap().push((number, body.to_string()));
        Ok(())
    }

    async fn open_unit(&self, unit: NewUnit) -> Result<OpenedUnit> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(Self::failure("open_unit"));
        }
        let mut opened = self.opened.lock().unwrap();
        opened.push(unit);
        let number = 1000 + opened.len() as u64;
        Ok(OpenedUnit {
            number,
            html_url: format!("https://github.com/acme/web/pull/{number}"),
        })
    }
}

/// Notifier that keeps every run it was handed.
#[derive(Default)]
pub struct RecordingNotifier {
    pub runs: Mutex<Vec<PipelineRun>>,
}

impl RecordingNotifier {
    pub fn runs(&self) -> Vec<PipelineRun> {
        self.runs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, _unit: &ChangeUnit, run: &PipelineRun) {
        self.runs.lock().unwrap().push(run.clone());
    }
}
