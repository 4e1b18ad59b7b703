use crate::core::report::{build_report, ReportInputs};
use crate::core::run_log::{LogEvent, RunLog};
use crate::domain::model::{
    Dataset, RunPaths, RunState, RunStatus, RunSummary, Stage, TransformResult,
};
use crate::domain::ports::{Pipeline, Storage};
use crate::utils::error::{EtlError, Result};
use crate::utils::monitor::SystemMonitor;
use chrono::Utc;
use std::future::Future;
use std::time::{Duration, Instant};

/// Final summary plus the fatal error, if the run ended in `Failed`.
#[derive(Debug)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub error: Option<EtlError>,
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        self.error
            .as_ref()
            .map(|e| e.exit_code().max(1))
            .unwrap_or(0)
    }
}

/// Drives a pipeline through `Started -> ... -> Done`, stopping at the first
/// fatal stage error.
pub struct EtlEngine<P: Pipeline, S: Storage> {
    pipeline: P,
    run_log: RunLog<S>,
    monitor: SystemMonitor,
}

impl<P: Pipeline, S: Storage> EtlEngine<P, S> {
    pub fn new(pipeline: P, run_log: RunLog<S>) -> Self {
        Self::new_with_monitoring(pipeline, run_log, false)
    }

    pub fn new_with_monitoring(pipeline: P, run_log: RunLog<S>, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            run_log,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&mut self) -> RunOutcome {
        let mut run = RunTracker::new(&self.run_log, &mut self.monitor);
        run.paths.input_file = Some(self.pipeline.input_path().display().to_string());
        run.paths.log_file = Some(self.run_log.path().display().to_string());

        tracing::info!(
            run_id = self.pipeline.run_id(),
            "Starting migration run '{}'",
            self.pipeline.run_name()
        );
        run.log(
            "run",
            LogEvent::Start {
                detail: Some(format!("run_name={:?}", self.pipeline.run_name())),
            },
        )
        .await;

        let source = match run
            .step(Stage::Extract, self.pipeline.extract(), |d: &Dataset| Some(d.len()))
            .await
        {
            Ok(dataset) => dataset,
            Err(e) => return run.finish(Some(e)).await,
        };
        run.input_rows = source.len();

        let validation = match run
            .step(Stage::Validate, async { self.pipeline.validate(&source) }, |_| None)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => return run.finish(Some(e)).await,
        };

        let transformed = match run
            .step(Stage::Transform, self.pipeline.transform(&source), |r: &TransformResult| {
                Some(r.dataset.len())
            })
            .await
        {
            Ok(result) => result,
            Err(e) => return run.finish(Some(e)).await,
        };
        run.paths.staging_file = Some(transformed.staging_path.display().to_string());

        let output_rows = transformed.dataset.len();
        let output_path = match run
            .step(Stage::Load, self.pipeline.load(&transformed), |_| Some(output_rows))
            .await
        {
            Ok(path) => path,
            Err(e) => return run.finish(Some(e)).await,
        };
        run.output_rows = output_rows;
        run.paths.output_file = Some(output_path.display().to_string());

        let input_path = self.pipeline.input_path();
        let report = build_report(ReportInputs {
            run_name: self.pipeline.run_name(),
            run_id: self.pipeline.run_id(),
            input_file: &input_path,
            output_file: &output_path,
            source: &source,
            validation: &validation,
            transformed: &transformed,
            timestamp: Utc::now(),
        });
        if let Some(path) = run
            .best_effort(Stage::Report, self.pipeline.report(&report))
            .await
        {
            run.paths.report_file = Some(path.display().to_string());
        }

        run.finish(None).await
    }
}

/// Summary for a run that never got past loading its configuration.
pub fn config_failure_summary(error: &EtlError, elapsed: Duration) -> RunSummary {
    RunSummary {
        status: RunStatus::Failed,
        run_id: None,
        stages_completed: Vec::new(),
        failed_stage: Some(Stage::Config),
        error: Some(error.to_string()),
        input_rows: 0,
        output_rows: 0,
        elapsed_seconds: round_secs(elapsed),
        paths: RunPaths::default(),
        notes: Vec::new(),
    }
}

/// Records a configuration failure in the run log once the log location is
/// known. Returns the summary notes for any log lines that could not be written.
pub async fn log_config_failure<S: Storage>(
    run_log: &RunLog<S>,
    error: &EtlError,
    elapsed: Duration,
) -> Vec<String> {
    let events = [
        (
            Stage::Config.as_str(),
            LogEvent::Failure {
                elapsed,
                error: error.to_string(),
            },
        ),
        (
            "run",
            LogEvent::Finish {
                status: "failed",
                elapsed,
            },
        ),
    ];

    let mut notes = Vec::new();
    for (scope, event) in events {
        if let Err(e) = run_log.record(scope, event).await {
            tracing::warn!("{}", e);
            let note = e.to_string();
            if !notes.contains(&note) {
                notes.push(note);
            }
        }
    }
    notes
}

fn round_secs(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0).round() / 1000.0
}

struct RunTracker<'a, S: Storage> {
    run_log: &'a RunLog<S>,
    monitor: &'a mut SystemMonitor,
    state: RunState,
    started: Instant,
    stages_completed: Vec<Stage>,
    input_rows: usize,
    output_rows: usize,
    paths: RunPaths,
    notes: Vec<String>,
}

impl<'a, S: Storage> RunTracker<'a, S> {
    fn new(run_log: &'a RunLog<S>, monitor: &'a mut SystemMonitor) -> Self {
        Self {
            run_log,
            monitor,
            state: RunState::Started,
            started: Instant::now(),
            stages_completed: Vec::new(),
            input_rows: 0,
            output_rows: 0,
            paths: RunPaths::default(),
            notes: Vec::new(),
        }
    }

    // Log write failures never stop the run; they surface once in the summary.
    async fn log(&mut self, scope: &str, event: LogEvent) {
        if let Err(e) = self.run_log.record(scope, event).await {
            tracing::warn!("{}", e);
            let note = e.to_string();
            if !self.notes.contains(&note) {
                self.notes.push(note);
            }
        }
    }

    async fn attempt<T, F>(
        &mut self,
        stage: Stage,
        fut: F,
        count_rows: impl Fn(&T) -> Option<usize>,
    ) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        debug_assert_eq!(self.state.pending_stage(), Some(stage));
        tracing::debug!(stage = stage.as_str(), "Stage started");
        self.log(stage.as_str(), LogEvent::Start { detail: None }).await;

        let stage_started = Instant::now();
        let result = fut.await;
        let elapsed = stage_started.elapsed();

        match &result {
            Ok(value) => {
                let rows = count_rows(value);
                match rows {
                    Some(rows) => tracing::info!(
                        stage = stage.as_str(),
                        rows,
                        "Stage succeeded in {:?}",
                        elapsed
                    ),
                    None => tracing::info!(
                        stage = stage.as_str(),
                        "Stage succeeded in {:?}",
                        elapsed
                    ),
                }
                self.log(stage.as_str(), LogEvent::Success { elapsed, rows }).await;
                self.stages_completed.push(stage);
                self.monitor.log_stage(stage.as_str());
            }
            Err(e) => {
                self.log(
                    stage.as_str(),
                    LogEvent::Failure {
                        elapsed,
                        error: e.to_string(),
                    },
                )
                .await;
            }
        }
        result
    }

    async fn step<T, F>(
        &mut self,
        stage: Stage,
        fut: F,
        count_rows: impl Fn(&T) -> Option<usize>,
    ) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let result = self.attempt(stage, fut, count_rows).await;
        self.state = match result {
            Ok(_) => self.state.advance(),
            Err(_) => self.state.fail(stage),
        };
        result
    }

    /// Runs a stage whose failure is recorded as a note instead of failing the run.
    async fn best_effort<T, F>(&mut self, stage: Stage, fut: F) -> Option<T>
    where
        F: Future<Output = Result<T>>,
    {
        let result = self.attempt(stage, fut, |_| None).await;
        self.state = self.state.advance();
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(stage = stage.as_str(), "{} (continuing)", e);
                self.notes.push(format!("{} stage skipped: {}", stage, e));
                None
            }
        }
    }

    async fn finish(mut self, error: Option<EtlError>) -> RunOutcome {
        if error.is_none() {
            self.state = self.state.advance();
        }
        let elapsed = self.started.elapsed();

        let (status, failed_stage) = match self.state {
            RunState::Done => (RunStatus::Success, None),
            RunState::Failed { stage } => (RunStatus::Failed, Some(stage)),
            other => {
                tracing::error!("Run finished in non-terminal state {:?}", other);
                (RunStatus::Failed, other.pending_stage())
            }
        };

        match (&error, failed_stage) {
            (Some(e), Some(stage)) => tracing::error!(
                stage = stage.as_str(),
                category = ?e.category(),
                severity = ?e.severity(),
                "Migration failed: {}",
                e
            ),
            _ => tracing::info!(
                input_rows = self.input_rows,
                output_rows = self.output_rows,
                "Migration completed in {:?}",
                elapsed
            ),
        }

        let status_label = match status {
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
        };
        self.log(
            "run",
            LogEvent::Finish {
                status: status_label,
                elapsed,
            },
        )
        .await;
        self.monitor.log_final_stats();

        let summary = RunSummary {
            status,
            run_id: Some(self.run_log.run_id().to_string()),
            stages_completed: self.stages_completed,
            failed_stage,
            error: error.as_ref().map(|e| e.to_string()),
            input_rows: self.input_rows,
            output_rows: self.output_rows,
            elapsed_seconds: round_secs(elapsed),
            paths: self.paths,
            notes: self.notes,
        };

        RunOutcome { summary, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_failure_summary() {
        let error = EtlError::config("bad toml");
        let summary = config_failure_summary(&error, Duration::from_micros(1_234_567));

        assert_eq!(summary.status, RunStatus::Failed);
        assert_eq!(summary.failed_stage, Some(Stage::Config));
        assert!(summary.stages_completed.is_empty());
        assert!(summary.run_id.is_none());
        assert_eq!(summary.elapsed_seconds, 1.235);
        assert!(summary.error.unwrap().contains("bad toml"));
    }

    #[tokio::test]
    async fn test_config_failure_is_written_to_run_log() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("migration_run.log");
        let run_log = RunLog::new(crate::adapters::LocalStorage::new("."), path.clone(), "run-9");
        let error = EtlError::config("paths.staging_dir is not writable");

        let notes = log_config_failure(&run_log, &error, Duration::from_millis(3)).await;

        assert!(notes.is_empty());
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("run_id=run-9 stage=config event=failure"));
        assert!(lines[0].contains("paths.staging_dir is not writable"));
        assert!(lines[1].contains("stage=run event=finish status=failed"));
    }

    #[tokio::test]
    async fn test_config_failure_log_error_becomes_one_note() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        // a directory where the log file should be
        let path = temp_dir.path().join("taken");
        std::fs::create_dir(&path).unwrap();
        let run_log = RunLog::new(crate::adapters::LocalStorage::new("."), path, "run-9");

        let notes =
            log_config_failure(&run_log, &EtlError::config("bad"), Duration::ZERO).await;

        assert_eq!(notes.len(), 1);
        assert!(notes[0].contains("Run log write failed"));
    }

    #[test]
    fn test_outcome_exit_codes() {
        let ok = RunOutcome {
            summary: config_failure_summary(&EtlError::config("x"), Duration::ZERO),
            error: None,
        };
        assert_eq!(ok.exit_code(), 0);

        let conflict = RunOutcome {
            error: Some(EtlError::LoadConflictError {
                path: "out.csv".to_string(),
            }),
            ..ok
        };
        assert_eq!(conflict.exit_code(), 2);
    }
}
