//! Per-file accumulation of classified changes.
//!
//! A [`FileSession`] holds the unflushed counters for one open document. The
//! [`SessionStore`] owns every session keyed by path; entries are created on
//! the first change to a file and removed when the editor closes it.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::classify::{ChangeEvent, ChangeKind};
use crate::types::FilePath;

/// Maximum number of content snippets kept per session.
pub const MAX_SNIPPETS: usize = 5;

/// Maximum length of each snippet (characters) before truncation.
pub const MAX_SNIPPET_CHARS: usize = 100;

/// Unflushed editing activity for one document.
#[derive(Debug, Clone, Serialize)]
pub struct FileSession {
    pub file_path: FilePath,
    pub file_name: String,
    pub typed_lines: u64,
    pub pasted_lines: u64,
    pub deleted_lines: u64,
    /// Most recent normalized insertions, oldest first.
    content_snippets: VecDeque<String>,
    /// Line count at session start, or since the last reconciliation or
    /// confirmed flush.
    pub initial_line_count: u64,
    /// Line count from the most recent editor event.
    pub last_line_count: u64,
    pub session_start: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    /// Bumped whenever the counters change.
    pub(crate) revision: u64,
    /// Bumped on every reconciliation, which moves the baseline.
    pub(crate) reconcile_epoch: u64,
    /// Share of the counters already confirmed by a reconciliation.
    pub(crate) settled_typed: u64,
    pub(crate) settled_pasted: u64,
    pub(crate) flush_in_flight: bool,
    /// The editor closed the file; the session goes once nothing is owed.
    pub(crate) closing: bool,
}

/// How a reconciliation changed the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// The net delta was split by the tracked typed:pasted ratio.
    Redistributed { typed: u64, pasted: u64 },
    /// Nothing was tracked, so the whole delta counts as typed.
    AttributedToTyped { typed: u64 },
    /// The net delta was zero or negative; counters kept.
    Unchanged,
}

impl FileSession {
    pub fn new(file_path: FilePath, file_name: impl Into<String>, line_count: u64) -> Self {
        let now = Utc::now();
        Self {
            file_path,
            file_name: file_name.into(),
            typed_lines: 0,
            pasted_lines: 0,
            deleted_lines: 0,
            content_snippets: VecDeque::with_capacity(MAX_SNIPPETS),
            initial_line_count: line_count,
            last_line_count: line_count,
            session_start: now,
            last_activity: now,
            revision: 0,
            reconcile_epoch: 0,
            settled_typed: 0,
            settled_pasted: 0,
            flush_in_flight: false,
            closing: false,
        }
    }

    /// True iff typed or pasted lines are waiting to be flushed.
    pub const fn pending_changes(&self) -> bool {
        self.total_lines() > 0
    }

    pub const fn total_lines(&self) -> u64 {
        self.typed_lines.saturating_add(self.pasted_lines)
    }

    pub const fn flush_in_flight(&self) -> bool {
        self.flush_in_flight
    }

    pub const fn is_closing(&self) -> bool {
        self.closing
    }

    /// Marks the file closed in the editor.
    pub const fn mark_closing(&mut self) {
        self.closing = true;
    }

    pub fn snippets(&self) -> impl ExactSizeIterator<Item = &str> {
        self.content_snippets.iter().map(String::as_str)
    }

    pub fn latest_snippet(&self) -> Option<&str> {
        self.content_snippets.back().map(String::as_str)
    }

    /// Adds a classified change to the counters.
    pub fn apply(&mut self, change: &ChangeEvent) {
        let counter = match change.kind() {
            ChangeKind::Deleted => &mut self.deleted_lines,
            ChangeKind::Pasted => &mut self.pasted_lines,
            ChangeKind::Typed => &mut self.typed_lines,
        };
        *counter = counter.saturating_add(change.line_count);

        if let Some(snippet) = normalize_snippet(&change.text) {
            self.push_snippet(snippet);
        }
        self.revision = self.revision.wrapping_add(1);
        self.last_activity = Utc::now();
        // A change means the document is open again.
        self.closing = false;
    }

    /// Records the editor's latest line count without reconciling.
    pub const fn observe_line_count(&mut self, line_count: u64) {
        self.last_line_count = line_count;
    }

    /// Corrects typed/pasted counters with the editor's authoritative line
    /// count.
    ///
    /// A positive net delta replaces the heuristic part of the counters
    /// (anything counted since the last reconciliation) while keeping its
    /// typed:pasted ratio; each share is rounded on its own, so the sum may
    /// be off from the delta by one. Counts settled by an earlier
    /// reconciliation that have not been delivered yet are kept. Zero or
    /// negative deltas are already covered by the deletion path and leave the
    /// counters alone. The baseline moves to `current_line_count` in every
    /// case.
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "line counts stay far below 2^52 and rounded shares are non-negative"
    )]
    pub fn reconcile(&mut self, current_line_count: u64) -> Reconciliation {
        let delta = current_line_count.saturating_sub(self.initial_line_count);
        let heuristic_typed = self.typed_lines.saturating_sub(self.settled_typed);
        let heuristic_pasted = self.pasted_lines.saturating_sub(self.settled_pasted);
        let tracked = heuristic_typed.saturating_add(heuristic_pasted);

        let outcome = if delta == 0 {
            Reconciliation::Unchanged
        } else if tracked == 0 {
            self.typed_lines = self.settled_typed.saturating_add(delta);
            self.pasted_lines = self.settled_pasted;
            Reconciliation::AttributedToTyped {
                typed: self.typed_lines,
            }
        } else {
            let delta = delta as f64;
            let tracked = tracked as f64;
            let typed = (delta * (heuristic_typed as f64 / tracked)).round() as u64;
            let pasted = (delta * (heuristic_pasted as f64 / tracked)).round() as u64;
            self.typed_lines = self.settled_typed.saturating_add(typed);
            self.pasted_lines = self.settled_pasted.saturating_add(pasted);
            Reconciliation::Redistributed {
                typed: self.typed_lines,
                pasted: self.pasted_lines,
            }
        };

        if outcome != Reconciliation::Unchanged {
            self.settled_typed = self.typed_lines;
            self.settled_pasted = self.pasted_lines;
            self.revision = self.revision.wrapping_add(1);
        }
        self.reconcile_epoch = self.reconcile_epoch.wrapping_add(1);
        self.initial_line_count = current_line_count;
        self.last_line_count = current_line_count;
        outcome
    }

    /// Zeroes every counter and drops snippets.
    pub(crate) fn reset(&mut self) {
        self.typed_lines = 0;
        self.pasted_lines = 0;
        self.deleted_lines = 0;
        self.settled_typed = 0;
        self.settled_pasted = 0;
        self.content_snippets.clear();
    }

    fn push_snippet(&mut self, snippet: String) {
        while self.content_snippets.len() >= MAX_SNIPPETS {
            self.content_snippets.pop_front();
        }
        self.content_snippets.push_back(snippet);
    }
}

/// Collapses whitespace runs, trims, and truncates to
/// [`MAX_SNIPPET_CHARS`] characters with a `...` suffix.
///
/// Returns `None` for blank input.
pub fn normalize_snippet(text: &str) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    match collapsed.char_indices().nth(MAX_SNIPPET_CHARS) {
        Some((end, _)) => Some(format!("{}...", &collapsed[..end])),
        None => Some(collapsed),
    }
}

/// All live sessions, keyed by document path.
///
/// Mutation happens from a single event-processing task; there is no
/// internal locking.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<FilePath, FileSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session for `file_path`, creating an empty one whose
    /// baseline is `line_count` when none exists.
    pub fn get_or_create(
        &mut self,
        file_path: &FilePath,
        file_name: &str,
        line_count: u64,
    ) -> &mut FileSession {
        self.sessions.entry(file_path.clone()).or_insert_with(|| {
            tracing::debug!(path = %file_path, line_count, "starting file session");
            FileSession::new(file_path.clone(), file_name, line_count)
        })
    }

    pub fn get(&self, file_path: &FilePath) -> Option<&FileSession> {
        self.sessions.get(file_path)
    }

    pub fn get_mut(&mut self, file_path: &FilePath) -> Option<&mut FileSession> {
        self.sessions.get_mut(file_path)
    }

    pub fn remove(&mut self, file_path: &FilePath) -> Option<FileSession> {
        self.sessions.remove(file_path)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileSession> {
        self.sessions.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut FileSession> {
        self.sessions.values_mut()
    }

    /// Paths with counters waiting to be flushed, sorted for stable output.
    pub fn pending_paths(&self) -> Vec<FilePath> {
        let mut paths: Vec<FilePath> = self
            .sessions
            .values()
            .filter(|s| s.pending_changes())
            .map(|s| s.file_path.clone())
            .collect();
        paths.sort();
        paths
    }
}
