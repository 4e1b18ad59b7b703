pub mod migration_pipeline;

pub use migration_pipeline::MigrationPipeline;
