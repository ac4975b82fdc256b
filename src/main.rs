//! rhythmeval - batch rhythm evaluation CLI
//!
//! Evaluates every student folder under the student root against the teacher
//! reference directory and writes one CSV score report per student.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rhythmeval::{BatchEvaluator, EvalConfig, OnsetDetector, ReportWriter, RhythmScorer, SymphoniaLoader};

#[derive(Parser, Debug)]
#[command(name = "rhythmeval", version, about = "Score student recordings against teacher references by rhythmic similarity")]
struct Cli {
    /// Directory holding one teacher reference recording per track type
    teacher_dir: PathBuf,

    /// Root directory holding one subdirectory per student
    student_dir: PathBuf,

    /// Output directory for per-student CSV reports
    #[arg(short, long, default_value = "scores")]
    output: PathBuf,

    /// Optional TOML config (track types, analysis parameters)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Worker threads for student folders (defaults to core count)
    #[arg(short, long)]
    jobs: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting rhythmeval");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Teacher directory: {}", cli.teacher_dir.display());
    info!("Student root: {}", cli.student_dir.display());

    if let Some(jobs) = cli.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("Failed to configure worker pool")?;
    }

    let config = EvalConfig::load(cli.config.as_deref())?;
    info!(
        track_types = config.track_types.len(),
        sample_rate = config.reference_sample_rate,
        hop_length = config.hop_length,
        "Configuration loaded"
    );

    let loader = SymphoniaLoader::new(config.reference_sample_rate, config.max_duration_secs);
    let detector = OnsetDetector::new(config.fft_size, config.hop_length)
        .context("Invalid onset detection parameters")?;
    let scorer = RhythmScorer::new(Box::new(loader), detector);

    let writer = ReportWriter::new(&cli.output);
    writer.ensure_output_dir()?;

    let evaluator = BatchEvaluator::new(config, scorer);
    let reports = evaluator.run(&cli.teacher_dir, &cli.student_dir)?;

    let mut written = 0usize;
    for report in &reports {
        match writer.write(report) {
            Ok(path) => {
                written += 1;
                tracing::debug!(path = %path.display(), "Report written");
            }
            Err(e) => tracing::warn!(student = %report.student, error = %e, "Report not written"),
        }
    }

    info!(
        students = reports.len(),
        reports_written = written,
        output = %cli.output.display(),
        "Batch evaluation done"
    );

    Ok(())
}
