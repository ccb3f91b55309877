//! Config command for printing the effective configuration.

use std::io::Write;

use anyhow::{Context, Result};

use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let fields: [(&str, serde_json::Value); 8] = [
        ("username", config.username.clone().into()),
        ("api_endpoint", config.api_endpoint.clone().into()),
        ("enabled", config.enabled.into()),
        ("track_content_snippets", config.track_content_snippets.into()),
        ("debounce_interval_ms", config.debounce_interval_ms.into()),
        ("editor_version", config.editor_version.clone().into()),
        (
            "clipboard_command",
            serde_json::to_value(&config.clipboard_command)
                .context("failed to render clipboard command")?,
        ),
        ("request_timeout_secs", config.request_timeout_secs.into()),
    ];
    for (key, value) in fields {
        writeln!(writer, "{key} = {value}")?;
    }

    let missing = config.missing_fields();
    if !missing.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "# missing: {}", missing.join(", "))?;
    }
    Ok(())
}
