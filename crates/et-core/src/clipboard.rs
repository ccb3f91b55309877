//! Rate-limited view of the system clipboard.

use std::time::{Duration, Instant};

use thiserror::Error;

/// Minimum time between two live clipboard reads.
pub const CLIPBOARD_REFRESH_INTERVAL: Duration = Duration::from_millis(500);

/// Clipboard read failures.
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// No clipboard reader is configured on this machine.
    #[error("clipboard access is not configured")]
    Unavailable,
    /// The reader could not be run.
    #[error("failed to read clipboard: {0}")]
    Io(#[from] std::io::Error),
    /// The reader ran but reported failure.
    #[error("clipboard reader failed: {0}")]
    Reader(String),
}

/// Something that can read the live clipboard text.
///
/// Reads may block or fail; [`ClipboardSampler`] bounds how often they happen.
pub trait ClipboardSource {
    fn read_text(&mut self) -> Result<String, ClipboardError>;
}

/// Last sampled clipboard content.
#[derive(Debug, Clone, Default)]
pub struct ClipboardCache {
    pub text: String,
    pub sampled_at: Option<Instant>,
}

/// Caches clipboard reads so at most one live read happens per
/// [`CLIPBOARD_REFRESH_INTERVAL`].
#[derive(Debug)]
pub struct ClipboardSampler<S> {
    source: S,
    cache: ClipboardCache,
    refresh_interval: Duration,
}

impl<S: ClipboardSource> ClipboardSampler<S> {
    pub fn new(source: S) -> Self {
        Self::with_interval(source, CLIPBOARD_REFRESH_INTERVAL)
    }

    pub fn with_interval(source: S, refresh_interval: Duration) -> Self {
        Self {
            source,
            cache: ClipboardCache::default(),
            refresh_interval,
        }
    }

    /// Returns the clipboard text as of `now`.
    ///
    /// Never fails: when the live read errors, the previous cached value is
    /// returned. A failed read still counts as a sample, so a broken reader
    /// is not retried on every keystroke.
    pub fn sample(&mut self, now: Instant) -> &str {
        let fresh = self
            .cache
            .sampled_at
            .is_some_and(|at| now.saturating_duration_since(at) < self.refresh_interval);
        if !fresh {
            match self.source.read_text() {
                Ok(text) => self.cache.text = text,
                Err(err) => tracing::debug!(%err, "clipboard read failed, keeping cached text"),
            }
            self.cache.sampled_at = Some(now);
        }
        &self.cache.text
    }

    pub const fn cache(&self) -> &ClipboardCache {
        &self.cache
    }
}

/// A source that never has clipboard content.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClipboard;

impl ClipboardSource for NoClipboard {
    fn read_text(&mut self) -> Result<String, ClipboardError> {
        Err(ClipboardError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays scripted results and counts reads.
    struct Scripted {
        results: Vec<Result<String, ClipboardError>>,
        reads: usize,
    }

    impl Scripted {
        fn new(results: Vec<Result<String, ClipboardError>>) -> Self {
            Self { results, reads: 0 }
        }
    }

    impl ClipboardSource for Scripted {
        fn read_text(&mut self) -> Result<String, ClipboardError> {
            self.reads += 1;
            if self.results.is_empty() {
                return Err(ClipboardError::Unavailable);
            }
            self.results.remove(0)
        }
    }

    #[test]
    fn first_sample_reads_live_clipboard() {
        let mut sampler = ClipboardSampler::new(Scripted::new(vec![Ok("copied".into())]));
        assert_eq!(sampler.sample(Instant::now()), "copied");
        assert_eq!(sampler.source.reads, 1);
    }

    #[test]
    fn samples_within_interval_use_cache() {
        let mut sampler = ClipboardSampler::new(Scripted::new(vec![
            Ok("first".into()),
            Ok("second".into()),
        ]));
        let start = Instant::now();
        assert_eq!(sampler.sample(start), "first");
        assert_eq!(sampler.sample(start + Duration::from_millis(499)), "first");
        assert_eq!(sampler.source.reads, 1);

        assert_eq!(sampler.sample(start + Duration::from_millis(500)), "second");
        assert_eq!(sampler.source.reads, 2);
    }

    #[test]
    fn failed_read_keeps_previous_text() {
        let mut sampler = ClipboardSampler::new(Scripted::new(vec![
            Ok("kept".into()),
            Err(ClipboardError::Reader("exit status 1".into())),
        ]));
        let start = Instant::now();
        assert_eq!(sampler.sample(start), "kept");
        assert_eq!(sampler.sample(start + Duration::from_secs(1)), "kept");
        assert_eq!(sampler.cache().sampled_at, Some(start + Duration::from_secs(1)));
    }

    #[test]
    fn unavailable_clipboard_samples_empty() {
        let mut sampler = ClipboardSampler::new(NoClipboard);
        assert_eq!(sampler.sample(Instant::now()), "");
    }
}
