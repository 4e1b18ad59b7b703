use crate::config::MigrationConfig;
use crate::core::csv_codec::{parse_delimited, write_csv};
use crate::core::report::{render, report_path};
use crate::core::schema::validate_columns;
use crate::core::transform::{apply_rules, RunStamp};
use crate::domain::model::{Dataset, QcReport, TransformResult, ValidationOutcome};
use crate::domain::ports::{Pipeline, Storage};
use crate::utils::error::{EtlError, Result};
use chrono::{SecondsFormat, Utc};
use std::path::PathBuf;

/// Raw -> staging -> output migration driven by a `MigrationConfig`.
pub struct MigrationPipeline<S: Storage> {
    pub(crate) storage: S,
    pub(crate) config: MigrationConfig,
    stamp: RunStamp,
    delimiter: u8,
}

impl<S: Storage> MigrationPipeline<S> {
    pub fn new(storage: S, config: MigrationConfig) -> Result<Self> {
        Self::with_run_id(storage, config, uuid::Uuid::new_v4().to_string())
    }

    pub fn with_run_id(
        storage: S,
        config: MigrationConfig,
        run_id: impl Into<String>,
    ) -> Result<Self> {
        let delimiter = config.delimiter_byte()?;
        Ok(Self {
            storage,
            config,
            stamp: RunStamp {
                run_id: run_id.into(),
                migrated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            },
            delimiter,
        })
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for MigrationPipeline<S> {
    fn run_id(&self) -> &str {
        &self.stamp.run_id
    }

    fn run_name(&self) -> &str {
        &self.config.run.name
    }

    fn input_path(&self) -> PathBuf {
        self.config.input_path()
    }

    async fn extract(&self) -> Result<Dataset> {
        let path = self.config.input_path();
        let label = path.display().to_string();
        tracing::debug!("Reading source file {}", label);

        if !self.storage.exists(&path).await {
            return Err(EtlError::extract(label, "source file not found"));
        }

        let data = self
            .storage
            .read_file(&path)
            .await
            .map_err(|e| EtlError::extract(label.clone(), format!("unreadable: {}", e)))?;

        parse_delimited(&data, self.delimiter, &label)
    }

    fn validate(&self, dataset: &Dataset) -> Result<ValidationOutcome> {
        validate_columns(dataset, &self.config.inputs.expected_columns)
    }

    async fn transform(&self, dataset: &Dataset) -> Result<TransformResult> {
        let output = apply_rules(dataset, &self.config.transform, &self.stamp)?;

        // Only a fully transformed dataset reaches the staging directory.
        let staging_path = self.config.staging_path();
        let bytes = write_csv(&output.dataset)?;
        self.storage
            .write_file(&staging_path, &bytes)
            .await
            .map_err(|e| EtlError::write(staging_path.display().to_string(), e.to_string()))?;
        tracing::debug!(
            "Staged {} rows ({} bytes) at {}",
            output.dataset.len(),
            bytes.len(),
            staging_path.display()
        );

        Ok(TransformResult {
            dataset: output.dataset,
            staging_path,
            rows_filtered: output.rows_filtered,
        })
    }

    async fn load(&self, result: &TransformResult) -> Result<PathBuf> {
        let output_path = self.config.output_path();
        let conflict = || EtlError::LoadConflictError {
            path: output_path.display().to_string(),
        };

        let bytes = write_csv(&result.dataset)?;

        if self.config.outputs.allow_overwrite {
            if self.storage.exists(&output_path).await {
                tracing::warn!("Overwriting existing output {}", output_path.display());
            }
            self.storage
                .write_file(&output_path, &bytes)
                .await
                .map_err(|e| EtlError::write(output_path.display().to_string(), e.to_string()))?;
        } else {
            if self.storage.exists(&output_path).await {
                return Err(conflict());
            }
            // Exclusive create also catches a file that appeared after the check.
            self.storage
                .create_new(&output_path, &bytes)
                .await
                .map_err(|e| match e {
                    EtlError::IoError(io) if io.kind() == std::io::ErrorKind::AlreadyExists => {
                        conflict()
                    }
                    other => {
                        EtlError::write(output_path.display().to_string(), other.to_string())
                    }
                })?;
        }

        tracing::debug!("Wrote {} bytes to {}", bytes.len(), output_path.display());
        Ok(output_path)
    }

    async fn report(&self, report: &QcReport) -> Result<PathBuf> {
        let path = report_path(
            &self.config.paths.reports_dir,
            &self.config.outputs.report_file,
            self.config.outputs.report_policy,
            Utc::now(),
            &report.run_id,
        );
        let bytes = render(report)?;

        self.storage
            .write_file(&path, &bytes)
            .await
            .map_err(|e| EtlError::ReportError {
                message: format!("{}: {}", path.display(), e),
            })?;
        Ok(path)
    }
}
