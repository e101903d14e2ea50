//! Process command - extract metrics from a single results document.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use qres_core::models::{ExtractionResult, MetricKey, MetricsRecord};
use qres_core::statement::{StatementExtractor, StatementParser};

use super::{company_name, load_config, open_source, ModeArg, StrategyArg};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or JSON page dump)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Statement to read when both are present
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Value selection strategy
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Company name (default: file stem)
    #[arg(long)]
    company: Option<String>,

    /// Include priorities, pages and warnings in JSON output
    #[arg(long)]
    details: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Reading document...");

    let source = open_source(&args.input, &config.pdf)?;

    let mut parser = StatementParser::from_config(config);
    if let Some(mode) = args.mode {
        parser = parser.with_mode(mode.into());
    }
    if let Some(strategy) = args.strategy {
        parser = parser.with_strategy(strategy.into());
    }

    pb.set_message("Extracting metrics...");
    let company = args
        .company
        .clone()
        .unwrap_or_else(|| company_name(&args.input));
    let result = parser.extract(source.as_ref())?.with_company(company);
    pb.finish_and_clear();

    let output = format_result(&result, args.format, args.details)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    for warning in &result.warnings {
        eprintln!("{} {}", style("!").yellow(), warning);
    }

    debug!("Total processing time: {:?}", start.elapsed());
    Ok(())
}

/// Render a result in the requested format.
pub fn format_result(
    result: &ExtractionResult,
    format: OutputFormat,
    details: bool,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json if details => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&result.record())?),
        OutputFormat::Csv => format_csv(&[result.record()]),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

/// Records as CSV with a header row.
pub fn format_csv(records: &[MetricsRecord]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(MetricsRecord::HEADERS)?;
    for record in records {
        wtr.write_record(record.to_row())?;
    }
    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_text(result: &ExtractionResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Company: {}\n", result.company));
    if let Some(mode) = result.mode {
        output.push_str(&format!("Statement: {}\n", mode));
    }
    output.push_str(&format!("Status: {}\n", result.status));
    if !result.pages.is_empty() {
        let pages: Vec<String> = result.pages.iter().map(|p| p.to_string()).collect();
        output.push_str(&format!("Pages: {}\n", pages.join(", ")));
    }
    output.push('\n');

    let shown = [
        MetricKey::Sales,
        MetricKey::Expenses,
        MetricKey::OperatingProfit,
        MetricKey::OperatingMargin,
        MetricKey::Pbt,
        MetricKey::Pat,
        MetricKey::Eps,
    ];
    for key in shown {
        let line = match result.metrics.get(&key) {
            Some(v) => format!("  {:<18} {:>12.2}  ({:?})\n", key.name(), v.value, v.priority),
            None => format!("  {:<18} {:>12}\n", key.name(), "-"),
        };
        output.push_str(&line);
    }

    output
}
