use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, serde_json::Value>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&serde_json::Value> {
        self.data.get(column)
    }

    /// Cell rendered the way it is written back to a delimited file.
    pub fn text(&self, column: &str) -> String {
        match self.data.get(column) {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Ordered header plus rows; every record carries exactly `columns`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ValidationOutcome {
    pub missing: Vec<String>,
    pub extra: Vec<String>,
}

impl ValidationOutcome {
    pub fn passed(&self) -> bool {
        self.missing.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub dataset: Dataset,
    pub staging_path: PathBuf,
    pub rows_filtered: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Config,
    Extract,
    Validate,
    Transform,
    Load,
    Report,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Config => "config",
            Stage::Extract => "extract",
            Stage::Validate => "validate",
            Stage::Transform => "transform",
            Stage::Load => "load",
            Stage::Report => "report",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Started,
    Extracted,
    Validated,
    Transformed,
    Loaded,
    Reported,
    Done,
    Failed { stage: Stage },
}

impl RunState {
    /// The stage that moves the run out of this state, if any.
    pub fn pending_stage(&self) -> Option<Stage> {
        match self {
            RunState::Started => Some(Stage::Extract),
            RunState::Extracted => Some(Stage::Validate),
            RunState::Validated => Some(Stage::Transform),
            RunState::Transformed => Some(Stage::Load),
            RunState::Loaded => Some(Stage::Report),
            RunState::Reported | RunState::Done | RunState::Failed { .. } => None,
        }
    }

    pub fn advance(self) -> RunState {
        match self {
            RunState::Started => RunState::Extracted,
            RunState::Extracted => RunState::Validated,
            RunState::Validated => RunState::Transformed,
            RunState::Transformed => RunState::Loaded,
            RunState::Loaded => RunState::Reported,
            RunState::Reported => RunState::Done,
            terminal @ (RunState::Done | RunState::Failed { .. }) => terminal,
        }
    }

    pub fn fail(self, stage: Stage) -> RunState {
        match self {
            RunState::Done | RunState::Failed { .. } => self,
            _ => RunState::Failed { stage },
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QcReport {
    pub run_name: String,
    pub run_id: String,
    pub input_file: String,
    pub staging_file: String,
    pub output_file: String,
    pub input_rows: usize,
    pub output_rows: usize,
    pub rows_filtered: usize,
    pub row_count_conserved: bool,
    pub source_columns: Vec<String>,
    pub columns: Vec<String>,
    pub validation_passed: bool,
    pub missing_columns: Vec<String>,
    pub extra_columns: Vec<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunPaths {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staging_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub stages_completed: Vec<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub input_rows: usize,
    pub output_rows: usize,
    pub elapsed_seconds: f64,
    pub paths: RunPaths,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_state_walks_every_stage_in_order() {
        let mut state = RunState::Started;
        let mut stages = Vec::new();
        while let Some(stage) = state.pending_stage() {
            stages.push(stage);
            state = state.advance();
        }
        assert_eq!(
            stages,
            vec![
                Stage::Extract,
                Stage::Validate,
                Stage::Transform,
                Stage::Load,
                Stage::Report
            ]
        );
        assert_eq!(state, RunState::Reported);
        assert_eq!(state.advance(), RunState::Done);
    }

    #[test]
    fn test_failed_is_terminal() {
        let failed = RunState::Validated.fail(Stage::Transform);
        assert_eq!(
            failed,
            RunState::Failed {
                stage: Stage::Transform
            }
        );
        assert!(failed.is_terminal());
        assert_eq!(failed.advance(), failed);
        assert_eq!(failed.fail(Stage::Load), failed);
    }

    #[test]
    fn test_record_text_renders_scalars() {
        let mut data = HashMap::new();
        data.insert("id".to_string(), serde_json::json!("P001"));
        data.insert("age".to_string(), serde_json::json!(34));
        data.insert("score".to_string(), serde_json::json!(1.5));
        data.insert("note".to_string(), serde_json::Value::Null);
        let record = Record { data };

        assert_eq!(record.text("id"), "P001");
        assert_eq!(record.text("age"), "34");
        assert_eq!(record.text("score"), "1.5");
        assert_eq!(record.text("note"), "");
        assert_eq!(record.text("absent"), "");
    }

    #[test]
    fn test_summary_serializes_status_lowercase() {
        let summary = RunSummary {
            status: RunStatus::Failed,
            run_id: None,
            stages_completed: vec![Stage::Extract],
            failed_stage: Some(Stage::Validate),
            error: Some("missing".to_string()),
            input_rows: 3,
            output_rows: 0,
            elapsed_seconds: 0.1,
            paths: RunPaths::default(),
            notes: Vec::new(),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["failed_stage"], "validate");
        assert_eq!(json["stages_completed"][0], "extract");
        assert!(json.get("notes").is_none());
    }
}
