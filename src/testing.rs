//! Deterministic in-memory implementations of every port.
//!
//! Used by unit tests, integration tests and benchmarks in place of git and
//! the real analysis tool.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::errors::{
    DocumentationError, HistoryError, ToolError, ToolMode, VcsError,
};
use crate::domain::models::{CommitRecord, LearningStoreEntry};
use crate::domain::ports::{
    AnalysisTool, CommitHistorySource, CommitOutcome, DocumentationSink, LearningStore,
    ParsedCount, ToolReport, VersionControl,
};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// History source over a fixed list of commits (newest first).
#[derive(Default)]
pub struct FakeHistorySource {
    commits: Vec<CommitRecord>,
    files: HashMap<String, Vec<String>>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl FakeHistorySource {
    pub fn new(commits: Vec<CommitRecord>) -> Self {
        Self {
            commits,
            ..Self::default()
        }
    }

    /// Every call fails with a gateway error carrying `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_files(mut self, files: HashMap<String, Vec<String>>) -> Self {
        self.files = files;
        self
    }

    /// Number of calls made against the source, across all operations.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<(), HistoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(HistoryError::Gateway(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CommitHistorySource for FakeHistorySource {
    async fn list_commits(&self, limit: usize) -> Result<Vec<CommitRecord>, HistoryError> {
        self.begin()?;
        Ok(self.commits.iter().take(limit).cloned().collect())
    }

    async fn list_commits_matching(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<CommitRecord>, HistoryError> {
        self.begin()?;
        let needle = term.to_lowercase();
        Ok(self
            .commits
            .iter()
            .filter(|c| c.message.to_lowercase().contains(&needle))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn file_changes_for(
        &self,
        hashes: &[String],
    ) -> Result<HashMap<String, Vec<String>>, HistoryError> {
        self.begin()?;
        Ok(hashes
            .iter()
            .filter_map(|h| self.files.get(h).map(|paths| (h.clone(), paths.clone())))
            .collect())
    }
}

/// Analysis tool replaying scripted counts.
///
/// Check and autocorrect each walk their own script; once a script is
/// exhausted its last element repeats.
pub struct FakeAnalysisTool {
    name: String,
    checks: Vec<ParsedCount>,
    corrections: Vec<ParsedCount>,
    unavailable: bool,
    check_calls: AtomicUsize,
    autocorrect_calls: AtomicUsize,
    latency: Duration,
}

impl FakeAnalysisTool {
    pub fn new(checks: Vec<ParsedCount>, corrections: Vec<ParsedCount>) -> Self {
        Self {
            name: "rubocop".to_string(),
            checks,
            corrections,
            unavailable: false,
            check_calls: AtomicUsize::new(0),
            autocorrect_calls: AtomicUsize::new(0),
            latency: Duration::ZERO,
        }
    }

    /// One `(findings, corrected)` pair per iteration.
    pub fn scripted(iterations: &[(u32, u32)]) -> Self {
        Self::new(
            iterations.iter().map(|(f, _)| ParsedCount::Count(*f)).collect(),
            iterations.iter().map(|(_, c)| ParsedCount::Count(*c)).collect(),
        )
    }

    /// A tool whose binary cannot be started.
    pub fn unavailable() -> Self {
        let mut tool = Self::new(Vec::new(), Vec::new());
        tool.unavailable = true;
        tool
    }

    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Reported (not slept) duration for every invocation.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn check_calls(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }

    pub fn autocorrect_calls(&self) -> usize {
        self.autocorrect_calls.load(Ordering::SeqCst)
    }

    fn next(
        &self,
        mode: ToolMode,
        script: &[ParsedCount],
        counter: &AtomicUsize,
    ) -> Result<ToolReport, ToolError> {
        let call = counter.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(ToolError::Invocation {
                program: self.name.clone(),
                mode,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
            });
        }
        let count = script
            .get(call)
            .or_else(|| script.last())
            .copied()
            .unwrap_or(ParsedCount::Unparsed);
        Ok(ToolReport {
            count,
            exit_code: Some(i32::from(count.value().unwrap_or(0) > 0)),
            duration: self.latency,
        })
    }
}

#[async_trait]
impl AnalysisTool for FakeAnalysisTool {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<ToolReport, ToolError> {
        self.next(ToolMode::Check, &self.checks, &self.check_calls)
    }

    async fn autocorrect(&self) -> Result<ToolReport, ToolError> {
        self.next(ToolMode::Autocorrect, &self.corrections, &self.autocorrect_calls)
    }
}

/// Version control that records commit messages instead of committing.
pub struct FakeVersionControl {
    dirty: bool,
    fail_commits: bool,
    messages: Mutex<Vec<String>>,
}

impl FakeVersionControl {
    /// Working tree always reports changes.
    pub fn new() -> Self {
        Self {
            dirty: true,
            fail_commits: false,
            messages: Mutex::new(Vec::new()),
        }
    }

    /// Working tree never reports changes.
    pub fn clean() -> Self {
        Self {
            dirty: false,
            ..Self::new()
        }
    }

    /// Every commit attempt fails.
    pub fn broken() -> Self {
        Self {
            fail_commits: true,
            ..Self::new()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        lock(&self.messages).clone()
    }

    pub fn commit_count(&self) -> usize {
        lock(&self.messages).len()
    }
}

impl Default for FakeVersionControl {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VersionControl for FakeVersionControl {
    async fn has_changes(&self) -> Result<bool, VcsError> {
        Ok(self.dirty)
    }

    async fn commit_all(
        &self,
        message: &str,
        allow_empty: bool,
    ) -> Result<CommitOutcome, VcsError> {
        if self.fail_commits {
            return Err(VcsError::CommandFailed {
                command: "commit".to_string(),
                stderr: "index.lock exists".to_string(),
            });
        }
        if !self.dirty && !allow_empty {
            return Ok(CommitOutcome::NothingToCommit);
        }
        let mut messages = lock(&self.messages);
        messages.push(message.to_string());
        Ok(CommitOutcome::Committed {
            hash: format!("{:040x}", messages.len()),
        })
    }
}

/// Keeps every section body written.
#[derive(Default)]
pub struct RecordingDocumentationSink {
    sections: Mutex<Vec<String>>,
}

impl RecordingDocumentationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sections(&self) -> Vec<String> {
        lock(&self.sections).clone()
    }

    pub fn last(&self) -> Option<String> {
        lock(&self.sections).last().cloned()
    }
}

#[async_trait]
impl DocumentationSink for RecordingDocumentationSink {
    async fn write_section(&self, body: &str) -> Result<(), DocumentationError> {
        lock(&self.sections).push(body.to_string());
        Ok(())
    }
}

/// Learning store held in memory, bounded like the file-backed store.
pub struct InMemoryLearningStore {
    capacity: usize,
    entries: Mutex<Vec<LearningStoreEntry>>,
}

impl InMemoryLearningStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_entries(capacity: usize, entries: Vec<LearningStoreEntry>) -> Self {
        Self {
            capacity,
            entries: Mutex::new(entries),
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryLearningStore {
    fn default() -> Self {
        Self::new(100)
    }
}

#[async_trait]
impl LearningStore for InMemoryLearningStore {
    async fn append(&self, entry: LearningStoreEntry) {
        let mut entries = lock(&self.entries);
        entries.push(entry);
        let overflow = entries.len().saturating_sub(self.capacity);
        entries.drain(..overflow);
    }

    async fn load_all(&self) -> Vec<LearningStoreEntry> {
        lock(&self.entries).clone()
    }
}
