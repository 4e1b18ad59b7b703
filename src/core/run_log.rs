use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum LogEvent {
    Start { detail: Option<String> },
    Success { elapsed: Duration, rows: Option<usize> },
    Failure { elapsed: Duration, error: String },
    Finish { status: &'static str, elapsed: Duration },
}

/// Append-only plain-text audit trail, one line per event. Never truncated.
pub struct RunLog<S: Storage> {
    storage: S,
    path: PathBuf,
    run_id: String,
}

impl<S: Storage> RunLog<S> {
    pub fn new(storage: S, path: PathBuf, run_id: impl Into<String>) -> Self {
        Self {
            storage,
            path,
            run_id: run_id.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn format_line(&self, at: DateTime<Utc>, scope: &str, event: &LogEvent) -> String {
        let mut line = format!(
            "{} run_id={} stage={}",
            at.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.run_id,
            scope
        );

        match event {
            LogEvent::Start { detail } => {
                line.push_str(" event=start");
                if let Some(detail) = detail {
                    line.push(' ');
                    line.push_str(detail);
                }
            }
            LogEvent::Success { elapsed, rows } => {
                line.push_str(&format!(" event=success elapsed_ms={}", elapsed.as_millis()));
                if let Some(rows) = rows {
                    line.push_str(&format!(" rows={}", rows));
                }
            }
            LogEvent::Failure { elapsed, error } => {
                line.push_str(&format!(
                    " event=failure elapsed_ms={} error={:?}",
                    elapsed.as_millis(),
                    error
                ));
            }
            LogEvent::Finish { status, elapsed } => {
                line.push_str(&format!(
                    " event=finish status={} elapsed_ms={}",
                    status,
                    elapsed.as_millis()
                ));
            }
        }

        line.push('\n');
        line
    }

    pub async fn record(&self, scope: &str, event: LogEvent) -> Result<()> {
        let line = self.format_line(Utc::now(), scope, &event);
        self.storage
            .append(&self.path, line.as_bytes())
            .await
            .map_err(|e| EtlError::LogWriteError {
                message: format!("{}: {}", self.path.display(), e),
            })
    }
}
