//! Which documents are worth tracking.

/// Substrings that exclude a path wherever they appear.
const EXCLUDED_FRAGMENTS: &[&str] = &["node_modules", ".git/", ".vscode", ".next"];

/// Directory names excluded only as whole path segments.
const EXCLUDED_SEGMENTS: &[&str] = &["dist/", "build/", "out/"];

/// File suffixes that are never tracked.
const EXCLUDED_SUFFIXES: &[&str] = &[".log", ".lock"];

/// Returns true if edits to `path` should be ignored entirely.
///
/// Dependency folders, VCS and editor metadata, build output, logs and lock
/// files are excluded. Backslashes are treated as separators.
pub fn is_excluded(path: &str) -> bool {
    let path = path.replace('\\', "/");

    if EXCLUDED_FRAGMENTS.iter().any(|f| path.contains(f)) {
        return true;
    }
    if EXCLUDED_SUFFIXES.iter().any(|s| path.ends_with(s)) {
        return true;
    }
    EXCLUDED_SEGMENTS
        .iter()
        .any(|segment| contains_segment(&path, segment))
}

/// Whether `segment` occurs at the start of `path` or right after a `/`.
fn contains_segment(path: &str, segment: &str) -> bool {
    path.match_indices(segment)
        .any(|(idx, _)| idx == 0 || path.as_bytes()[idx - 1] == b'/')
}
