//! Core domain logic for the edit tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Classification: deciding whether a content change was typed, pasted or
//!   deleted, and how many lines it touched
//! - Sessions: per-file counters, snippets and line-count reconciliation
//! - Flushing: snapshotting sessions into activity records and resetting them
//!   only on confirmed delivery
//! - Clipboard sampling and path exclusion

pub mod action;
pub mod classify;
pub mod clipboard;
pub mod event;
pub mod filter;
mod flush;
pub mod record;
pub mod session;
pub mod types;

pub use action::{ActionType, UnknownActionType};
pub use classify::{ChangeEvent, ChangeKind, classify};
pub use clipboard::{ClipboardError, ClipboardSampler, ClipboardSource, NoClipboard};
pub use event::{EditorEvent, RawChange};
pub use filter::is_excluded;
pub use flush::{FlushResolution, FlushTicket};
pub use record::{ActivityRecord, RecordContext, RecordDraft};
pub use session::{FileSession, Reconciliation, SessionStore};
pub use types::{FilePath, ValidationError};
