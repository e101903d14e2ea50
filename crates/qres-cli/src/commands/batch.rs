//! Batch processing command for multiple results documents.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use qres_core::models::{ExtractionResult, MetricsRecord, PdfConfig, Status};
use qres_core::statement::StatementParser;

use super::{company_name, is_supported, load_config, open_source, ModeArg, StrategyArg};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of input files
    #[arg(required = true)]
    input: String,

    /// Summary CSV path
    #[arg(short, long, default_value = "summary.csv")]
    output: PathBuf,

    /// Also write one JSON result per document into this directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Per-document time limit in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Statement to read when both are present
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Value selection strategy
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    result: Option<ExtractionResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_supported(p))
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut parser = StatementParser::from_config(config.clone());
    if let Some(mode) = args.mode {
        parser = parser.with_mode(mode.into());
    }
    if let Some(strategy) = args.strategy {
        parser = parser.with_strategy(strategy.into());
    }
    let parser = Arc::new(parser);
    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));
    let timeout = args.timeout.map(Duration::from_secs);

    let mut handles = Vec::with_capacity(files.len());
    for path in files {
        let permit = semaphore.clone().acquire_owned().await?;
        let parser = Arc::clone(&parser);
        let pdf = config.pdf.clone();

        handles.push(tokio::spawn(process_single_file(
            path, parser, pdf, timeout, permit,
        )));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        let result = handle.await?;
        overall_pb.inc(1);

        if let Some(error_msg) = &result.error {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", result.path.display(), error_msg);
            } else {
                error!("Failed to process {}: {}", result.path.display(), error_msg);
                anyhow::bail!("Processing failed: {}", error_msg);
            }
        }
        results.push(result);
    }

    overall_pb.finish_with_message("Complete");

    if let Some(output_dir) = &args.output_dir {
        for (path, result) in results
            .iter()
            .filter_map(|r| r.result.as_ref().map(|res| (&r.path, res)))
        {
            let output_path = output_dir.join(format!("{}.json", company_name(path)));
            fs::write(&output_path, serde_json::to_string_pretty(result)?)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    write_summary(&args.output, &results)?;
    println!(
        "{} Summary written to {}",
        style("✓").green(),
        args.output.display()
    );

    let count = |status: Status| {
        results
            .iter()
            .filter(|r| r.result.as_ref().is_some_and(|res| res.status == status))
            .count()
    };
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} success, {} partial, {} no metrics, {} errors",
        style(count(Status::Success)).green(),
        style(count(Status::Partial)).yellow(),
        style(count(Status::Failed)).red(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

async fn process_single_file(
    path: PathBuf,
    parser: Arc<StatementParser>,
    pdf: PdfConfig,
    timeout: Option<Duration>,
    permit: OwnedSemaphorePermit,
) -> ProcessResult {
    let start = Instant::now();
    let task_path = path.clone();
    let work = spawn_with_permit(permit, move || extract_file(&task_path, &parser, &pdf));

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, work).await {
            Ok(joined) => joined,
            Err(_) => {
                return ProcessResult {
                    path,
                    result: None,
                    error: Some(format!("timed out after {}s", limit.as_secs())),
                    processing_time_ms: start.elapsed().as_millis() as u64,
                };
            }
        },
        None => work.await,
    };

    let outcome = joined.map_err(anyhow::Error::from).and_then(|r| r);
    let processing_time_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(result) => ProcessResult {
            path,
            result: Some(result),
            error: None,
            processing_time_ms,
        },
        Err(e) => ProcessResult {
            path,
            result: None,
            error: Some(e.to_string()),
            processing_time_ms,
        },
    }
}

/// Run blocking work that holds `permit` until it returns.
///
/// Timing out the returned handle does not stop the work, so the permit
/// stays taken until the work itself is done.
fn spawn_with_permit<T, F>(permit: OwnedSemaphorePermit, work: F) -> JoinHandle<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let _permit = permit;
        work()
    })
}

fn extract_file(path: &Path, parser: &StatementParser, pdf: &PdfConfig) -> anyhow::Result<ExtractionResult> {
    let source = open_source(path, pdf)?;
    Ok(parser.extract_named(source.as_ref(), &company_name(path))?)
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header: Vec<&str> = MetricsRecord::HEADERS.to_vec();
    header.extend(["Status", "ProcessingTimeMs", "Error"]);
    wtr.write_record(&header)?;

    for result in results {
        let time = result.processing_time_ms.to_string();
        match &result.result {
            Some(res) => {
                let mut row = res.record().to_row();
                row.extend([res.status.to_string(), time, String::new()]);
                wtr.write_record(&row)?;
            }
            None => {
                let mut row = vec![company_name(&result.path)];
                row.resize(MetricsRecord::HEADERS.len(), String::new());
                row.extend([
                    "Error".to_string(),
                    time,
                    result.error.clone().unwrap_or_default(),
                ]);
                wtr.write_record(&row)?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
