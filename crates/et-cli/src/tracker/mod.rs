//! The tracking engine: editor events in, activity records out.
//!
//! A [`Tracker`] is owned by one event-loop task. Editor events are handled
//! to completion in arrival order. Sends run as spawned tasks and report back
//! through the [`TrackerMessage`] channel, so counters are only touched from
//! the loop and only reset after the transport confirms delivery.

mod debounce;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use et_core::{
    ActivityRecord, ClipboardSampler, ClipboardSource, EditorEvent, FilePath, FileSession,
    FlushResolution, FlushTicket, RawChange, SessionStore, classify, is_excluded,
};
use et_transport::{Transport, TransportError};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::Config;

pub use debounce::Debouncer;

/// Upper bound on waiting for outstanding sends at shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(15);

/// Internal notifications delivered back to the event loop.
#[derive(Debug)]
pub enum TrackerMessage {
    /// The debounce window elapsed.
    FlushDue,
    /// A background send finished.
    FlushFinished {
        tickets: Vec<FlushTicket>,
        delivered: bool,
    },
}

/// Counters reported when a run ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub events: u64,
    pub changes: u64,
    pub records_sent: u64,
    pub failed_flushes: u64,
}

/// Per-process tracking state.
pub struct Tracker<T, C> {
    config: Config,
    transport: Arc<T>,
    sampler: ClipboardSampler<C>,
    sessions: SessionStore,
    debouncer: Debouncer,
    messages: UnboundedSender<TrackerMessage>,
    sends_in_flight: usize,
    report: RunReport,
}

impl<T: Transport, C: ClipboardSource> Tracker<T, C> {
    /// Creates a tracker and the receiving end of its message channel.
    ///
    /// The caller's event loop must feed every received message back into
    /// [`Self::handle_message`].
    pub fn new(
        config: Config,
        transport: T,
        clipboard: C,
    ) -> (Self, UnboundedReceiver<TrackerMessage>) {
        let (messages, receiver) = mpsc::unbounded_channel();
        let tracker = Self {
            debouncer: Debouncer::new(config.debounce_interval()),
            config,
            transport: Arc::new(transport),
            sampler: ClipboardSampler::new(clipboard),
            sessions: SessionStore::new(),
            messages,
            sends_in_flight: 0,
            report: RunReport::default(),
        };
        (tracker, receiver)
    }

    pub const fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub const fn report(&self) -> RunReport {
        self.report
    }

    /// Swaps in freshly loaded settings and the clients derived from them.
    ///
    /// Sends already in flight finish on the old transport.
    pub fn reconfigure(&mut self, config: Config, transport: T, clipboard: C) {
        if !config.enabled {
            self.debouncer.cancel();
        }
        self.debouncer.set_delay(config.debounce_interval());
        self.transport = Arc::new(transport);
        self.sampler = ClipboardSampler::new(clipboard);
        tracing::info!(enabled = config.enabled, "configuration reloaded");
        self.config = config;
    }

    /// Routes one editor event.
    ///
    /// [`EditorEvent::ConfigChanged`] is only counted here; reloading is up
    /// to the caller, which knows where configuration comes from.
    pub fn handle_event(&mut self, event: &EditorEvent) {
        self.report.events += 1;
        match event {
            EditorEvent::Change {
                file_path,
                file_name,
                line_count,
                changes,
            } => self.on_change(file_path, file_name.as_deref(), *line_count, changes),
            EditorEvent::Save {
                file_path,
                line_count,
            } => self.on_save(file_path, *line_count),
            EditorEvent::Close {
                file_path,
                line_count,
            } => self.on_close(file_path, *line_count),
            EditorEvent::ConfigChanged => {}
        }
    }

    /// Handles a content change notification.
    pub fn on_change(
        &mut self,
        file_path: &FilePath,
        file_name: Option<&str>,
        line_count: u64,
        changes: &[RawChange],
    ) {
        if !self.config.enabled {
            return;
        }
        if is_excluded(file_path.as_str()) {
            tracing::trace!(path = %file_path, "ignoring excluded path");
            return;
        }

        // Deletions never consult the clipboard.
        let clipboard = if changes.iter().any(|c| !c.text.is_empty()) {
            self.sampler.sample(Instant::now()).to_owned()
        } else {
            String::new()
        };

        let file_name = file_name.unwrap_or_else(|| file_path.display_name());
        let session = self.sessions.get_or_create(file_path, file_name, line_count);
        for raw in changes {
            let change = classify(raw, &clipboard);
            tracing::debug!(
                path = %file_path,
                kind = ?change.kind(),
                lines = change.line_count,
                "classified change"
            );
            session.apply(&change);
        }
        session.observe_line_count(line_count);
        self.report.changes += changes.len() as u64;

        self.schedule_flush();
    }

    /// Handles a save: reconcile against the editor's line count, then flush
    /// this file right away.
    ///
    /// When a flush of the file is already in flight the remainder waits for
    /// the debounce timer.
    pub fn on_save(&mut self, file_path: &FilePath, line_count: u64) {
        if !self.config.enabled {
            return;
        }
        if self.reconcile(file_path, line_count) && !self.flush_one(file_path) {
            self.schedule_if_pending(file_path);
        }
    }

    /// Handles a close: reconcile, flush, then forget the file once nothing
    /// is owed for it.
    ///
    /// A session with a send in flight or undelivered counters stays until a
    /// later flush delivers them.
    pub fn on_close(&mut self, file_path: &FilePath, line_count: u64) {
        if !self.config.enabled {
            return;
        }
        if !self.reconcile(file_path, line_count) {
            return;
        }
        if !self.flush_one(file_path) {
            self.schedule_if_pending(file_path);
        }
        if let Some(session) = self.sessions.get_mut(file_path) {
            session.mark_closing();
        }
        if self.sessions.retire_if_closed(file_path) {
            tracing::debug!(path = %file_path, "closed file session");
        } else {
            tracing::debug!(path = %file_path, "file closed; session kept until delivery");
        }
    }

    /// Re-arms the debounce timer.
    pub fn schedule_flush(&mut self) {
        self.debouncer.arm(&self.messages);
    }

    /// Flushes one session if it has anything to send. Returns whether a
    /// send was started.
    pub fn flush_one(&mut self, file_path: &FilePath) -> bool {
        let Some(ticket) = self.sessions.begin_flush(file_path) else {
            return false;
        };
        self.spawn_send(vec![ticket]);
        true
    }

    fn schedule_if_pending(&mut self, file_path: &FilePath) {
        if self
            .sessions
            .get(file_path)
            .is_some_and(FileSession::pending_changes)
        {
            self.schedule_flush();
        }
    }

    /// Flushes every session with pending changes in one batch.
    pub fn flush_all(&mut self) {
        let tickets = self.sessions.begin_flush_all();
        if !tickets.is_empty() {
            self.spawn_send(tickets);
        }
    }

    pub fn handle_message(&mut self, message: TrackerMessage) {
        match message {
            TrackerMessage::FlushDue => self.flush_all(),
            TrackerMessage::FlushFinished { tickets, delivered } => {
                self.sends_in_flight = self.sends_in_flight.saturating_sub(1);
                self.finish(&tickets, delivered);
            }
        }
    }

    /// Stops the timer, waits for outstanding sends, then flushes everything
    /// still pending and waits for that too.
    pub async fn shutdown(mut self, receiver: &mut UnboundedReceiver<TrackerMessage>) -> RunReport {
        self.debouncer.cancel();

        let drain = async {
            while self.sends_in_flight > 0 {
                match receiver.recv().await {
                    Some(TrackerMessage::FlushFinished { tickets, delivered }) => {
                        self.sends_in_flight -= 1;
                        self.finish(&tickets, delivered);
                    }
                    Some(TrackerMessage::FlushDue) => {}
                    None => break,
                }
            }
        };
        if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
            tracing::warn!("gave up waiting for in-flight sends");
        }

        let tickets = self.sessions.begin_flush_all();
        if !tickets.is_empty() {
            let records = self.build_records(&tickets);
            let delivered = deliver(self.transport.as_ref(), &records).await;
            self.finish(&tickets, delivered);
        }

        let pending = self.sessions.pending_paths();
        if !pending.is_empty() {
            tracing::warn!(files = pending.len(), "exiting with undelivered activity");
        }
        self.report
    }

    /// Returns false when there is no session for the file.
    fn reconcile(&mut self, file_path: &FilePath, line_count: u64) -> bool {
        let Some(session) = self.sessions.get_mut(file_path) else {
            return false;
        };
        let outcome = session.reconcile(line_count);
        tracing::debug!(path = %file_path, ?outcome, "reconciled line counts");
        true
    }

    fn build_records(&self, tickets: &[FlushTicket]) -> Vec<ActivityRecord> {
        let context = self.config.record_context();
        let now = Utc::now();
        tickets
            .iter()
            .map(|ticket| ActivityRecord::build(&ticket.draft, &context, now))
            .collect()
    }

    fn spawn_send(&mut self, tickets: Vec<FlushTicket>) {
        let records = self.build_records(&tickets);
        let transport = Arc::clone(&self.transport);
        let messages = self.messages.clone();
        self.sends_in_flight += 1;

        tokio::spawn(async move {
            let delivered = deliver(transport.as_ref(), &records).await;
            let _ = messages.send(TrackerMessage::FlushFinished { tickets, delivered });
        });
    }

    fn finish(&mut self, tickets: &[FlushTicket], delivered: bool) {
        if delivered {
            self.report.records_sent += tickets.len() as u64;
        } else {
            self.report.failed_flushes += 1;
        }
        for ticket in tickets {
            let resolution = self.sessions.finish_flush(ticket, delivered);
            tracing::debug!(path = %ticket.file_path, ?resolution, "flush finished");

            let closing = self
                .sessions
                .get(&ticket.file_path)
                .is_some_and(FileSession::is_closing);
            if !closing {
                continue;
            }
            // No more events will come for a closed file, so send what
            // arrived after the snapshot now. Failures wait for the next
            // flush pass.
            if resolution == FlushResolution::Reduced {
                self.flush_one(&ticket.file_path);
            }
            if self.sessions.retire_if_closed(&ticket.file_path) {
                tracing::debug!(path = %ticket.file_path, "closed file session");
            }
        }
    }
}

/// Sends one record on its own and several as a batch.
async fn deliver<T: Transport>(transport: &T, records: &[ActivityRecord]) -> bool {
    let result: Result<(), TransportError> = match records {
        [] => return true,
        [record] => transport.send(record).await,
        _ => transport.send_batch(records).await,
    };
    match result {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(%err, records = records.len(), "flush failed; will retry on next trigger");
            false
        }
    }
}
