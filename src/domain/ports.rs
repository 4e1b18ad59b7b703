use crate::domain::model::{Dataset, QcReport, TransformResult, ValidationOutcome};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub trait Storage: Send + Sync {
    fn exists(&self, path: &Path) -> impl std::future::Future<Output = bool> + Send;
    fn read_file(&self, path: &Path) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    /// Replaces `path` with `data`; readers never observe a half-written file.
    fn write_file(
        &self,
        path: &Path,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Writes `data` only if `path` does not exist yet (`ErrorKind::AlreadyExists` otherwise).
    fn create_new(
        &self,
        path: &Path,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn append(&self, path: &Path, data: &[u8])
        -> impl std::future::Future<Output = Result<()>> + Send;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    fn run_id(&self) -> &str;
    fn run_name(&self) -> &str;
    fn input_path(&self) -> PathBuf;

    async fn extract(&self) -> Result<Dataset>;
    fn validate(&self, dataset: &Dataset) -> Result<ValidationOutcome>;
    async fn transform(&self, dataset: &Dataset) -> Result<TransformResult>;
    async fn load(&self, result: &TransformResult) -> Result<PathBuf>;
    async fn report(&self, report: &QcReport) -> Result<PathBuf>;
}
