//! Classify command for checking how a single change would be counted.

use std::io::Write;

use anyhow::{Context, Result};
use et_core::{ChangeEvent, ChangeKind, RawChange, classify};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Classification<'a> {
    kind: ChangeKind,
    #[serde(flatten)]
    event: &'a ChangeEvent,
}

pub fn run<W: Write>(writer: &mut W, text: &str, range_length: u64, clipboard: &str) -> Result<()> {
    let change = RawChange {
        text: text.to_string(),
        range_length,
    };
    let event = classify(&change, clipboard);
    let output = Classification {
        kind: event.kind(),
        event: &event,
    };

    serde_json::to_writer_pretty(&mut *writer, &output)
        .context("failed to serialize classification")?;
    writeln!(writer)?;
    Ok(())
}
