pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;

pub use adapters::LocalStorage;
pub use app::pipelines::MigrationPipeline;
pub use config::MigrationConfig;
pub use core::etl::{EtlEngine, RunOutcome};
pub use core::run_log::RunLog;
pub use domain::model::{QcReport, RunStatus, RunSummary, Stage};
pub use utils::error::{EtlError, Result};
