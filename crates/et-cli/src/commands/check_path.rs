//! Check-path command for testing the exclusion rules.

use std::io::Write;

use anyhow::Result;
use et_core::{FilePath, is_excluded};

/// Prints whether `path` would be tracked. Returns true when it would.
pub fn run<W: Write>(writer: &mut W, path: &str) -> Result<bool> {
    let path = FilePath::new(path)?;
    let tracked = !is_excluded(path.as_str());
    let verdict = if tracked { "tracked" } else { "excluded" };
    writeln!(writer, "{verdict}: {} ({})", path, path.display_name())?;
    Ok(tracked)
}
