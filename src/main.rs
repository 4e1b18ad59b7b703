use anyhow::Context;
use clap::Parser;
use migrate_etl::core::etl::{config_failure_summary, log_config_failure};
use migrate_etl::domain::ports::Pipeline;
use migrate_etl::utils::{logger, validation::Validate};
use migrate_etl::{
    CliArgs, EtlEngine, EtlError, LocalStorage, MigrationConfig, MigrationPipeline, RunLog,
    RunSummary,
};
use std::path::Path;
use std::time::{Duration, Instant};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Loading configuration from {}", args.config.display());
    let exit_code = run(&args).await?;

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}

async fn run(args: &CliArgs) -> anyhow::Result<i32> {
    let started = Instant::now();

    let pipeline = match prepare(&args.config) {
        Ok(prepared) => prepared,
        Err((config, e)) => {
            report_failure(&e);
            let mut summary = config_failure_summary(&e, started.elapsed());
            if let Some(config) = config {
                log_to_run_log(&config, &e, started.elapsed(), &mut summary).await;
            }
            emit(&summary)?;
            return Ok(e.exit_code().max(1));
        }
    };
    tracing::debug!("Migration config: {:?}", pipeline.config());
    if args.monitor {
        tracing::info!("System monitoring enabled");
    }

    let run_log = RunLog::new(
        LocalStorage::new("."),
        pipeline.config().log_path(),
        pipeline.run_id().to_string(),
    );
    let mut engine = EtlEngine::new_with_monitoring(pipeline, run_log, args.monitor);
    let outcome = engine.run().await;

    if let Some(e) = &outcome.error {
        report_failure(e);
    }
    emit(&outcome.summary)?;

    Ok(outcome.exit_code())
}

// The parsed config travels with the error so a failure after parsing can
// still reach the run log.
fn prepare(
    path: &Path,
) -> Result<MigrationPipeline<LocalStorage>, (Option<MigrationConfig>, EtlError)> {
    let config = MigrationConfig::from_file(path).map_err(|e| (None, e))?;
    if let Err(e) = config.validate().and_then(|_| config.prepare_directories()) {
        return Err((Some(config), e));
    }
    tracing::info!("Configuration loaded and validated for run '{}'", config.run.name);

    MigrationPipeline::new(LocalStorage::new("."), config.clone()).map_err(|e| (Some(config), e))
}

// Only an existing logs directory is used; a rejected config creates nothing.
async fn log_to_run_log(
    config: &MigrationConfig,
    error: &EtlError,
    elapsed: Duration,
    summary: &mut RunSummary,
) {
    if !config.paths.logs_dir.is_dir() {
        return;
    }
    let run_id = uuid::Uuid::new_v4().to_string();
    let run_log = RunLog::new(LocalStorage::new("."), config.log_path(), run_id.clone());

    summary.notes = log_config_failure(&run_log, error, elapsed).await;
    summary.paths.log_file = Some(run_log.path().display().to_string());
    summary.run_id = Some(run_id);
}

fn report_failure(e: &EtlError) {
    tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
}

// The summary is the only thing this binary writes to stdout.
fn emit(summary: &RunSummary) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(summary).context("failed to serialize run summary")?;
    println!("{}", json);
    Ok(())
}
