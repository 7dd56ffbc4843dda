//! Label the degraded late life of each engine in a run-to-failure log
//!
//! Usage: cargo run --bin detect_degradation -- train_FD001.txt --clean-out clean_rows.csv

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use engine_degradation::{
    load_whitespace_table,
    DegradationDetector,
    DetectorConfig,
    EntityKey,
    EntityStatus,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Detect late-life degradation in engine sensor logs")]
struct Args {
    /// Whitespace-separated log (`.gz` accepted)
    input: PathBuf,

    /// JSON file with detector configuration overrides
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fraction of each engine's life treated as late stage
    #[arg(long)]
    late_fraction: Option<f64>,

    /// Required mean shift in baseline standard deviations
    #[arg(long)]
    mean_sigma: Option<f64>,

    /// Write unlabeled rows here (CSV)
    #[arg(long)]
    clean_out: Option<PathBuf>,

    /// Write labeled rows here (CSV)
    #[arg(long)]
    degraded_out: Option<PathBuf>,

    /// Write run summary and per-engine verdicts here (JSON)
    #[arg(long)]
    summary_out: Option<PathBuf>,

    /// Print the series of one engine (requires --sensor)
    #[arg(long, requires = "sensor")]
    engine: Option<f64>,

    /// Sensor column for --engine
    #[arg(long)]
    sensor: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let mut config = match &args.config {
        Some(path) => DetectorConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => DetectorConfig::default(),
    };
    if let Some(late_fraction) = args.late_fraction {
        config.late_fraction = late_fraction;
    }
    if let Some(mean_sigma) = args.mean_sigma {
        config.mean_sigma = mean_sigma;
    }

    let detector = DegradationDetector::new(config)?;
    let schema = detector.config().schema.clone();

    println!("Degradation Detection");
    println!("=====================");
    println!("Input: {}", args.input.display());
    println!("Late fraction: {:.2}", detector.config().late_fraction);
    println!("Mean sigma: {:.2}", detector.config().mean_sigma);
    println!();

    let (table, stats) = load_whitespace_table(&args.input)
        .with_context(|| format!("loading {}", args.input.display()))?;
    if stats.unparseable_cells > 0 {
        println!("Coerced {} unparseable values to missing", stats.unparseable_cells);
    }

    let labeled = detector.label(table)?;
    let summary = labeled.summary();

    println!("Results:");
    println!("  Total rows:    {}", summary.rows_total);
    println!("  Clean rows:    {}", summary.rows_clean);
    println!("  Degraded rows: {}", summary.rows_degraded);
    println!(
        "  Engines:       {} ({} degraded)",
        summary.entities_total, summary.entities_degraded
    );

    println!("\n{:>8} {:>6} {:>6}  {}", "Engine", "Rows", "Split", "Status");
    println!("{}", "-".repeat(50));
    let mut verdicts: Vec<_> = labeled.verdicts().iter().collect();
    verdicts.sort_by_key(|v| v.entity);
    for verdict in verdicts {
        let status = match &verdict.status {
            EntityStatus::InsufficientHistory => "insufficient history".to_string(),
            EntityStatus::Stable => "stable".to_string(),
            EntityStatus::Degraded { sensor, sigmas } => {
                format!("DEGRADED ({} shifted {:.2}σ)", sensor, sigmas)
            }
        };
        println!(
            "{:>8} {:>6} {:>6}  {}",
            verdict.entity.to_string(),
            verdict.n_rows,
            verdict.split_index,
            status
        );
    }

    if let Some(path) = &args.clean_out {
        let n = labeled.write_clean_csv(path)?;
        println!("\nWrote {} clean rows to {}", n, path.display());
    }
    if let Some(path) = &args.degraded_out {
        let n = labeled.write_degraded_csv(path)?;
        println!("Wrote {} degraded rows to {}", n, path.display());
    }
    if let Some(path) = &args.summary_out {
        labeled.write_summary_json(path)?;
        println!("Wrote summary to {}", path.display());
    }

    if let (Some(engine), Some(sensor)) = (args.engine, &args.sensor) {
        let key = EntityKey::from_value(engine).context("engine id must be a number")?;
        let view = labeled.entity_sensor_view(&schema.entity_column, &schema.cycle_column, key, sensor)?;

        println!("\nEngine {} / {}:", key, sensor);
        println!("{:>8} {:>12}  {}", "Cycle", "Value", "Degraded");
        for point in view {
            println!(
                "{:>8} {:>12.4}  {}",
                point.cycle,
                point.value,
                if point.is_degraded { "*" } else { "" }
            );
        }
    }

    Ok(())
}
