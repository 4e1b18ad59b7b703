use crate::config::ReportPolicy;
use crate::domain::model::{Dataset, QcReport, TransformResult, ValidationOutcome};
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::{Path, PathBuf};

pub struct ReportInputs<'a> {
    pub run_name: &'a str,
    pub run_id: &'a str,
    pub input_file: &'a Path,
    pub output_file: &'a Path,
    pub source: &'a Dataset,
    pub validation: &'a ValidationOutcome,
    pub transformed: &'a TransformResult,
    pub timestamp: DateTime<Utc>,
}

pub fn build_report(inputs: ReportInputs<'_>) -> QcReport {
    let input_rows = inputs.source.len();
    let output_rows = inputs.transformed.dataset.len();

    QcReport {
        run_name: inputs.run_name.to_string(),
        run_id: inputs.run_id.to_string(),
        input_file: inputs.input_file.display().to_string(),
        staging_file: inputs.transformed.staging_path.display().to_string(),
        output_file: inputs.output_file.display().to_string(),
        input_rows,
        output_rows,
        rows_filtered: inputs.transformed.rows_filtered,
        row_count_conserved: input_rows == output_rows + inputs.transformed.rows_filtered,
        source_columns: inputs.source.columns.clone(),
        columns: inputs.transformed.dataset.columns.clone(),
        validation_passed: inputs.validation.passed(),
        missing_columns: inputs.validation.missing.clone(),
        extra_columns: inputs.validation.extra.clone(),
        timestamp: inputs.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}

/// Under the timestamped policy `migration_report.json` becomes
/// `migration_report_20260101T120000123Z_<run_id>.json`, unique per run.
pub fn report_path(
    dir: &Path,
    file_name: &str,
    policy: ReportPolicy,
    at: DateTime<Utc>,
    run_id: &str,
) -> PathBuf {
    match policy {
        ReportPolicy::Overwrite => dir.join(file_name),
        ReportPolicy::Timestamped => {
            let path = Path::new(file_name);
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| file_name.to_string());
            let stamp = format!("{}_{}", at.format("%Y%m%dT%H%M%S%3fZ"), run_id);
            let name = match path.extension() {
                Some(ext) => format!("{}_{}.{}", stem, stamp, ext.to_string_lossy()),
                None => format!("{}_{}", stem, stamp),
            };
            dir.join(name)
        }
    }
}

pub fn render(report: &QcReport) -> Result<Vec<u8>> {
    let mut json = serde_json::to_vec_pretty(report).map_err(|e| EtlError::ReportError {
        message: format!("cannot serialize QC report: {}", e),
    })?;
    json.push(b'\n');
    Ok(json)
}
