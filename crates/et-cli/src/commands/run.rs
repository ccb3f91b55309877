//! Run command: track editor events read from stdin.
//!
//! Each input line is one JSON-encoded [`EditorEvent`]. The loop ends at EOF
//! or on Ctrl-C, after which everything still pending is flushed.

use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use et_core::EditorEvent;
use et_transport::HttpTransport;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::clipboard::SystemClipboard;
use crate::config::warn_if_incomplete;
use crate::tracker::{RunReport, Tracker};
use crate::Config;

pub fn run(config: Config, config_path: Option<&Path>) -> Result<RunReport> {
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    runtime.block_on(async {
        let stdin = BufReader::new(tokio::io::stdin());
        let interrupted = async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        track(stdin, config, config_path.map(Path::to_path_buf), interrupted).await
    })
}

/// Drives a tracker from `input` until EOF or `interrupted` completes.
pub async fn track<R, F>(
    input: R,
    config: Config,
    config_path: Option<PathBuf>,
    interrupted: F,
) -> Result<RunReport>
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = ()>,
{
    warn_if_incomplete(&config);
    let transport = build_transport(&config)?;
    let clipboard = SystemClipboard::from_command(&config.clipboard_command);
    let (mut tracker, mut messages) = Tracker::new(config, transport, clipboard);

    let mut lines = input.lines();
    let mut skipped = 0u64;
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read editor events")? else {
                    tracing::debug!("input closed");
                    break;
                };
                if !handle_line(&mut tracker, &line, config_path.as_deref()) {
                    skipped += 1;
                }
            }
            Some(message) = messages.recv() => tracker.handle_message(message),
            () = &mut interrupted => {
                tracing::info!("interrupted");
                break;
            }
        }
    }

    let report = tracker.shutdown(&mut messages).await;
    tracing::info!(
        events = report.events,
        skipped,
        changes = report.changes,
        records_sent = report.records_sent,
        failed_flushes = report.failed_flushes,
        "tracking stopped"
    );
    Ok(report)
}

/// Returns false when the line was not a valid event.
fn handle_line(
    tracker: &mut Tracker<HttpTransport, SystemClipboard>,
    line: &str,
    config_path: Option<&Path>,
) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return true;
    }
    let event = match EditorEvent::from_line(line) {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!(%err, "skipping malformed event");
            return false;
        }
    };

    if matches!(event, EditorEvent::ConfigChanged) {
        reload(tracker, config_path);
    }
    tracker.handle_event(&event);
    true
}

/// Re-reads configuration and swaps it into the tracker. A failed reload
/// keeps the current settings.
fn reload(tracker: &mut Tracker<HttpTransport, SystemClipboard>, config_path: Option<&Path>) {
    let loaded = Config::load_from(config_path)
        .context("failed to load configuration")
        .and_then(|config| Ok((build_transport(&config)?, config)));
    match loaded {
        Ok((transport, config)) => {
            warn_if_incomplete(&config);
            let clipboard = SystemClipboard::from_command(&config.clipboard_command);
            tracker.reconfigure(config, transport, clipboard);
        }
        Err(err) => tracing::warn!(error = %format!("{err:#}"), "keeping previous configuration"),
    }
}

fn build_transport(config: &Config) -> Result<HttpTransport> {
    HttpTransport::new(&config.api_endpoint, config.request_timeout())
        .context("failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use mockito::Matcher;
    use serde_json::json;

    use super::*;

    fn config(endpoint: &str) -> Config {
        Config {
            username: "ada".to_string(),
            api_endpoint: endpoint.to_string(),
            clipboard_command: Vec::new(),
            editor_version: "1.96.0".to_string(),
            ..Config::default()
        }
    }

    fn input(lines: &[&str]) -> Vec<u8> {
        lines.join("\n").into_bytes()
    }

    #[tokio::test]
    async fn eof_flushes_pending_activity() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/activities")
            .match_body(Matcher::PartialJson(json!({
                "username": "ada",
                "fileName": "main.rs",
                "filePath": "/repo/main.rs",
                "actionType": "typing",
                "typedLines": 2,
                "pastedLines": 0,
                "editorVersion": "1.96.0",
            })))
            .with_status(201)
            .expect(1)
            .create_async()
            .await;

        let events = input(&[
            r#"{"event":"change","file_path":"/repo/main.rs","line_count":10,"changes":[{"text":"a","range_length":0}]}"#,
            r#"{"event":"change","file_path":"/repo/main.rs","line_count":10,"changes":[{"text":"b","range_length":0}]}"#,
        ]);
        let report = track(
            events.as_slice(),
            config(&server.url()),
            None,
            std::future::pending(),
        )
        .await
        .unwrap();

        mock.assert_async().await;
        assert_eq!(report.events, 2);
        assert_eq!(report.records_sent, 1);
    }

    #[tokio::test]
    async fn malformed_and_blank_lines_are_skipped() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/activities")
            .with_status(201)
            .expect(1)
            .create_async()
            .await;

        let events = input(&[
            "not json",
            "",
            r#"{"event":"teleport"}"#,
            r#"{"event":"change","file_path":"/repo/lib.rs","line_count":1,"changes":[{"text":"x","range_length":0}]}"#,
        ]);
        let report = track(
            events.as_slice(),
            config(&server.url()),
            None,
            std::future::pending(),
        )
        .await
        .unwrap();

        mock.assert_async().await;
        assert_eq!(report.events, 1);
    }

    #[tokio::test]
    async fn excluded_files_never_reach_backend() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let events = input(&[
            r#"{"event":"change","file_path":"/repo/node_modules/x.js","line_count":1,"changes":[{"text":"x","range_length":0}]}"#,
            r#"{"event":"save","file_path":"/repo/node_modules/x.js","line_count":1}"#,
        ]);
        track(
            events.as_slice(),
            config(&server.url()),
            None,
            std::future::pending(),
        )
        .await
        .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn failed_delivery_is_reported_not_fatal() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/activities")
            .with_status(503)
            .with_body(r#"{"error":"maintenance"}"#)
            .create_async()
            .await;

        let events = input(&[
            r#"{"event":"change","file_path":"/repo/main.rs","line_count":3,"changes":[{"text":"x","range_length":0}]}"#,
        ]);
        let report = track(
            events.as_slice(),
            config(&server.url()),
            None,
            std::future::pending(),
        )
        .await
        .unwrap();

        mock.assert_async().await;
        assert_eq!(report.records_sent, 0);
        assert_eq!(report.failed_flushes, 1);
    }

    #[tokio::test]
    async fn config_changed_reloads_settings() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/activities")
            .match_body(Matcher::PartialJson(json!({"username": "grace"})))
            .with_status(201)
            .expect(1)
            .create_async()
            .await;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "username = \"grace\"\napi_endpoint = \"{}\"\nclipboard_command = []",
            server.url()
        )
        .unwrap();
        file.flush().unwrap();

        let events = input(&[
            r#"{"event":"config_changed"}"#,
            r#"{"event":"change","file_path":"/repo/main.rs","line_count":3,"changes":[{"text":"x","range_length":0}]}"#,
        ]);
        let report = track(
            events.as_slice(),
            config("http://127.0.0.1:9"),
            Some(file.path().to_path_buf()),
            std::future::pending(),
        )
        .await
        .unwrap();

        mock.assert_async().await;
        assert_eq!(report.events, 2);
    }

    #[tokio::test]
    async fn interruption_stops_reading_and_flushes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/activities")
            .with_status(201)
            .expect(0)
            .create_async()
            .await;

        // Input that never ends; only the interruption can stop the loop.
        let (_writer, reader) = tokio::io::duplex(64);
        let report = track(
            BufReader::new(reader),
            config(&server.url()),
            None,
            std::future::ready(()),
        )
        .await
        .unwrap();

        mock.assert_async().await;
        assert_eq!(report.events, 0);
    }
}
