//! Summary command for showing the backend's totals for one day.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use et_transport::{ActivitySummary, HttpTransport};

use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config, date: Option<&str>, json: bool) -> Result<()> {
    let missing = config.missing_fields();
    if !missing.is_empty() {
        bail!("cannot query summary; missing {}", missing.join(", "));
    }
    let date = resolve_date(date)?;

    let transport = HttpTransport::new(&config.api_endpoint, config.request_timeout())
        .context("failed to build HTTP client")?;
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    let summary = runtime
        .block_on(transport.fetch_summary(&config.username, &date))
        .context("failed to fetch activity summary")?;

    if json {
        serde_json::to_writer_pretty(&mut *writer, &summary)
            .context("failed to serialize summary")?;
        writeln!(writer)?;
    } else {
        write_summary(writer, &summary)?;
    }
    Ok(())
}

/// Validates an explicit `YYYY-MM-DD` date or falls back to today.
fn resolve_date(date: Option<&str>) -> Result<String> {
    match date {
        Some(date) => {
            let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .with_context(|| format!("invalid date: {date} (expected YYYY-MM-DD)"))?;
            Ok(parsed.format("%Y-%m-%d").to_string())
        }
        None => Ok(Local::now().format("%Y-%m-%d").to_string()),
    }
}

fn write_summary<W: Write>(writer: &mut W, summary: &ActivitySummary) -> Result<()> {
    writeln!(writer, "ACTIVITY: {} on {}", summary.username, summary.date)?;
    writeln!(writer)?;
    writeln!(writer, "  Typed:  {:>6}", summary.typed_lines)?;
    writeln!(writer, "  Pasted: {:>6}", summary.pasted_lines)?;
    writeln!(writer, "  Total:  {:>6}", summary.total_lines)?;

    if summary.files.is_empty() {
        return Ok(());
    }

    writeln!(writer)?;
    writeln!(writer, "BY FILE")?;
    writeln!(writer, "───────")?;
    for file in &summary.files {
        writeln!(
            writer,
            "  {:<28}{:>6} typed {:>6} pasted",
            file.file_name, file.typed_lines, file.pasted_lines
        )?;
    }
    Ok(())
}
