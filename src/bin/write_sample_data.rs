use anyhow::{bail, Context};
use clap::Parser;
use migrate_etl::utils::logger;
use std::fs;
use std::path::PathBuf;

const SITES: [&str; 5] = ["NY", "MI", "CA", "TX", "WA"];

#[derive(Parser)]
#[command(name = "write_sample_data")]
#[command(about = "Seed a raw directory with a sample patients CSV")]
struct Args {
    /// Raw directory to write into (created if missing)
    #[arg(long)]
    raw_dir: PathBuf,

    #[arg(long, default_value = "patients.csv")]
    file: String,

    #[arg(long, default_value = "5")]
    rows: usize,

    /// Replace the file if it already exists
    #[arg(long)]
    force: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(false);

    fs::create_dir_all(&args.raw_dir)
        .with_context(|| format!("cannot create {}", args.raw_dir.display()))?;

    let path = args.raw_dir.join(&args.file);
    if path.exists() && !args.force {
        bail!("{} already exists (use --force to replace it)", path.display());
    }

    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("cannot open {}", path.display()))?;
    writer.write_record(["patient_id", "age", "site"])?;
    for i in 1..=args.rows {
        let age = 18 + (i * 7) % 60;
        writer.write_record([
            format!("P{:03}", i),
            age.to_string(),
            SITES[(i - 1) % SITES.len()].to_string(),
        ])?;
    }
    writer.flush()?;

    tracing::info!("Wrote {} sample rows to {}", args.rows, path.display());
    println!("{}", path.display());
    Ok(())
}
