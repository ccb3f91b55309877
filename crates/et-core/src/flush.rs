//! Snapshot-and-confirm bookkeeping for flushing sessions.
//!
//! A flush first takes a [`FlushTicket`] (a snapshot of the counters) and
//! marks the session in flight. The send happens elsewhere; its result comes
//! back through [`SessionStore::finish_flush`]. Counters are only reduced on
//! confirmed delivery, so a failed send leaves everything in place for the
//! next attempt.

use crate::record::RecordDraft;
use crate::session::{FileSession, SessionStore};
use crate::types::FilePath;

/// Snapshot of one session taken when a flush starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushTicket {
    pub file_path: FilePath,
    pub revision: u64,
    pub typed_lines: u64,
    pub pasted_lines: u64,
    pub deleted_lines: u64,
    /// Editor line count when the snapshot was taken.
    pub line_count: u64,
    /// Reconciliations seen by the session before the snapshot.
    pub reconcile_epoch: u64,
    pub draft: RecordDraft,
}

/// What happened to a session when a flush result arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushResolution {
    /// Delivered with no edits since the snapshot; the session is clean.
    Cleared,
    /// Delivered, but edits arrived meanwhile; only the snapshot was
    /// subtracted.
    Reduced,
    /// Not delivered; counters untouched.
    Retained,
    /// The session was closed before the result arrived.
    Gone,
}

impl FileSession {
    /// Starts a flush.
    ///
    /// Returns `None` when there is nothing to send (no typed or pasted
    /// lines) or a previous flush of this session is still outstanding.
    pub fn begin_flush(&mut self) -> Option<FlushTicket> {
        if !self.pending_changes() || self.flush_in_flight {
            return None;
        }
        self.flush_in_flight = true;
        Some(FlushTicket {
            file_path: self.file_path.clone(),
            revision: self.revision,
            typed_lines: self.typed_lines,
            pasted_lines: self.pasted_lines,
            deleted_lines: self.deleted_lines,
            line_count: self.last_line_count,
            reconcile_epoch: self.reconcile_epoch,
            draft: RecordDraft {
                file_name: self.file_name.clone(),
                file_path: self.file_path.to_string(),
                typed_lines: self.typed_lines,
                pasted_lines: self.pasted_lines,
                deleted_lines: self.deleted_lines,
                snippet: self.latest_snippet().map(str::to_string),
            },
        })
    }

    /// Applies the result of a flush started with [`Self::begin_flush`].
    ///
    /// On delivery the baseline moves to the snapshot's line count, unless a
    /// reconciliation after the snapshot already moved it further.
    pub fn finish_flush(&mut self, ticket: &FlushTicket, delivered: bool) -> FlushResolution {
        self.flush_in_flight = false;
        if !delivered {
            return FlushResolution::Retained;
        }

        if self.reconcile_epoch == ticket.reconcile_epoch {
            self.initial_line_count = ticket.line_count;
        }
        if self.revision == ticket.revision {
            self.reset();
            FlushResolution::Cleared
        } else {
            self.typed_lines = self.typed_lines.saturating_sub(ticket.typed_lines);
            self.pasted_lines = self.pasted_lines.saturating_sub(ticket.pasted_lines);
            self.deleted_lines = self.deleted_lines.saturating_sub(ticket.deleted_lines);
            self.settled_typed = self.settled_typed.saturating_sub(ticket.typed_lines);
            self.settled_pasted = self.settled_pasted.saturating_sub(ticket.pasted_lines);
            FlushResolution::Reduced
        }
    }

    /// True once a closed file has nothing left to send or wait for.
    pub const fn is_retirable(&self) -> bool {
        self.closing && !self.flush_in_flight && !self.pending_changes()
    }
}

impl SessionStore {
    /// Starts a flush of one session.
    pub fn begin_flush(&mut self, file_path: &FilePath) -> Option<FlushTicket> {
        self.get_mut(file_path)?.begin_flush()
    }

    /// Starts a flush of every session with pending changes, in path order.
    pub fn begin_flush_all(&mut self) -> Vec<FlushTicket> {
        let mut tickets: Vec<FlushTicket> = self
            .iter_mut()
            .filter_map(FileSession::begin_flush)
            .collect();
        tickets.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        tickets
    }

    /// Removes the session if its file was closed and nothing is owed.
    ///
    /// Returns true when the session is gone, including when it never
    /// existed.
    pub fn retire_if_closed(&mut self, file_path: &FilePath) -> bool {
        match self.get(file_path) {
            Some(session) if session.is_retirable() => {
                self.remove(file_path);
                true
            }
            Some(_) => false,
            None => true,
        }
    }

    /// Applies a flush result to the session it was taken from.
    pub fn finish_flush(&mut self, ticket: &FlushTicket, delivered: bool) -> FlushResolution {
        match self.get_mut(&ticket.file_path) {
            Some(session) => session.finish_flush(ticket, delivered),
            None => FlushResolution::Gone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::event::RawChange;
    use crate::session::Reconciliation;

    fn path(p: &str) -> FilePath {
        FilePath::new(p).unwrap()
    }

    fn store_with_typing(p: &FilePath, text: &str) -> SessionStore {
        let mut store = SessionStore::new();
        let session = store.get_or_create(p, p.display_name(), 10);
        session.apply(&classify(&RawChange::insert(text), ""));
        session.observe_line_count(12);
        store
    }

    #[test]
    fn empty_session_produces_no_ticket() {
        let mut store = SessionStore::new();
        let p = path("/repo/a.rs");
        store.get_or_create(&p, "a.rs", 0);
        assert!(store.begin_flush(&p).is_none());
        assert!(!store.get(&p).unwrap().pending_changes());
        assert!(!store.get(&p).unwrap().flush_in_flight());
    }

    #[test]
    fn delete_only_session_produces_no_ticket() {
        let mut store = SessionStore::new();
        let p = path("/repo/a.rs");
        store
            .get_or_create(&p, "a.rs", 0)
            .apply(&classify(&RawChange::delete(400), ""));
        assert!(store.begin_flush(&p).is_none());
    }

    #[test]
    fn ticket_snapshots_counters() {
        let p = path("/repo/a.rs");
        let mut store = store_with_typing(&p, "a\nb");
        let ticket = store.begin_flush(&p).unwrap();
        assert_eq!(ticket.typed_lines, 2);
        assert_eq!(ticket.pasted_lines, 0);
        assert_eq!(ticket.line_count, 12);
        assert_eq!(ticket.draft.file_name, "a.rs");
        assert_eq!(ticket.draft.snippet.as_deref(), Some("a b"));
        assert!(store.get(&p).unwrap().flush_in_flight());
    }

    #[test]
    fn in_flight_session_is_not_flushed_twice() {
        let p = path("/repo/a.rs");
        let mut store = store_with_typing(&p, "x");
        assert!(store.begin_flush(&p).is_some());
        assert!(store.begin_flush(&p).is_none());
        assert!(store.begin_flush_all().is_empty());
    }

    #[test]
    fn failed_flush_leaves_counters_untouched() {
        let p = path("/repo/a.rs");
        let mut store = store_with_typing(&p, "a\nb\nc");
        let before = store.get(&p).unwrap().clone();

        let ticket = store.begin_flush(&p).unwrap();
        assert_eq!(store.finish_flush(&ticket, false), FlushResolution::Retained);

        let after = store.get(&p).unwrap();
        assert_eq!(after.typed_lines, before.typed_lines);
        assert_eq!(after.pasted_lines, before.pasted_lines);
        assert_eq!(after.deleted_lines, before.deleted_lines);
        assert_eq!(after.initial_line_count, before.initial_line_count);
        assert_eq!(after.snippets().len(), before.snippets().len());
        assert!(after.pending_changes());
        assert!(!after.flush_in_flight());
    }

    #[test]
    fn delivered_flush_clears_session() {
        let p = path("/repo/a.rs");
        let mut store = store_with_typing(&p, "hello");
        let ticket = store.begin_flush(&p).unwrap();
        assert_eq!(store.finish_flush(&ticket, true), FlushResolution::Cleared);

        let session = store.get(&p).unwrap();
        assert_eq!(session.total_lines(), 0);
        assert_eq!(session.deleted_lines, 0);
        assert_eq!(session.snippets().len(), 0);
        assert_eq!(session.initial_line_count, 12);
        assert!(!session.pending_changes());
    }

    #[test]
    fn edits_during_flush_survive_delivery() {
        let p = path("/repo/a.rs");
        let mut store = store_with_typing(&p, "one");
        let ticket = store.begin_flush(&p).unwrap();

        let session = store.get_mut(&p).unwrap();
        session.apply(&classify(&RawChange::insert("two\nthree"), ""));

        assert_eq!(store.finish_flush(&ticket, true), FlushResolution::Reduced);
        let session = store.get(&p).unwrap();
        assert_eq!(session.typed_lines, 2);
        assert!(session.pending_changes());
        assert_eq!(session.latest_snippet(), Some("two three"));
    }

    #[test]
    fn result_for_closed_session_is_ignored() {
        let p = path("/repo/a.rs");
        let mut store = store_with_typing(&p, "x");
        let ticket = store.begin_flush(&p).unwrap();
        store.remove(&p);
        assert_eq!(store.finish_flush(&ticket, true), FlushResolution::Gone);
    }

    #[test]
    fn reconcile_during_flush_keeps_remainder_and_baseline() {
        let p = path("/repo/a.rs");
        let mut store = SessionStore::new();
        store
            .get_or_create(&p, "a.rs", 100)
            .apply(&classify(&RawChange::insert("x"), ""));
        let ticket = store.begin_flush(&p).unwrap();

        store.get_mut(&p).unwrap().reconcile(115);

        assert_eq!(store.finish_flush(&ticket, true), FlushResolution::Reduced);
        let session = store.get(&p).unwrap();
        assert_eq!(ticket.typed_lines + session.typed_lines, 15);
        assert_eq!(session.initial_line_count, 115);

        // The next save at the same count must not count the lines again.
        let session = store.get_mut(&p).unwrap();
        assert_eq!(session.reconcile(115), Reconciliation::Unchanged);
        assert_eq!(session.typed_lines, 14);
    }

    #[test]
    fn closed_session_retires_only_when_nothing_is_owed() {
        let p = path("/repo/a.rs");
        let mut store = store_with_typing(&p, "x");
        let ticket = store.begin_flush(&p).unwrap();
        store.get_mut(&p).unwrap().mark_closing();
        assert!(!store.retire_if_closed(&p));

        assert_eq!(store.finish_flush(&ticket, false), FlushResolution::Retained);
        assert!(!store.retire_if_closed(&p));

        let ticket = store.begin_flush(&p).unwrap();
        assert_eq!(store.finish_flush(&ticket, true), FlushResolution::Cleared);
        assert!(store.retire_if_closed(&p));
        assert!(store.get(&p).is_none());
    }

    #[test]
    fn open_session_is_never_retired() {
        let p = path("/repo/a.rs");
        let mut store = SessionStore::new();
        store.get_or_create(&p, "a.rs", 0);
        assert!(!store.retire_if_closed(&p));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn flush_all_takes_pending_sessions_in_path_order() {
        let mut store = SessionStore::new();
        for name in ["/z.rs", "/a.rs", "/m.rs"] {
            let p = path(name);
            store
                .get_or_create(&p, p.display_name(), 0)
                .apply(&classify(&RawChange::insert("x"), ""));
        }
        store.get_or_create(&path("/idle.rs"), "idle.rs", 0);

        let tickets = store.begin_flush_all();
        let paths: Vec<&str> = tickets.iter().map(|t| t.file_path.as_str()).collect();
        assert_eq!(paths, vec!["/a.rs", "/m.rs", "/z.rs"]);
    }
}
