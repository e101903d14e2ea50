//! Inspect command - show how a document is read.

use std::path::PathBuf;

use clap::Args;
use console::style;

use qres_core::statement::{PageReport, StatementParser};

use super::{load_config, open_source, ModeArg};

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Input file (PDF or JSON page dump)
    #[arg(required = true)]
    input: PathBuf,

    /// Inspect this page instead of the selected candidates
    #[arg(short, long)]
    page: Option<u32>,

    /// Also list rows that match no metric
    #[arg(long)]
    all_rows: bool,

    /// Statement to read when both are present
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
}

pub async fn run(args: InspectArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let source = open_source(&args.input, &config.pdf)?;
    let mut parser = StatementParser::from_config(config);
    if let Some(mode) = args.mode {
        parser = parser.with_mode(mode.into());
    }

    let inspection = parser.inspect(source.as_ref(), args.page)?;

    println!("{} {}", style("Statement:").bold(), inspection.mode);
    match inspection.document_unit {
        Some(unit) => println!("{} {}", style("Document unit:").bold(), unit),
        None => println!("{} none stated", style("Document unit:").bold()),
    }

    println!();
    println!("{}", style("Page scores").bold());
    for score in &inspection.scores {
        let marker = if score.auditor {
            style("auditor").red()
        } else if score.qualifies {
            style("candidate").green()
        } else {
            style("-").dim()
        };
        println!("  page {:>3}  {:>4}  {}", score.page, score.score, marker);
    }

    if inspection.pages.is_empty() {
        println!();
        println!("{} No results page found", style("!").yellow());
    }

    for page in &inspection.pages {
        print_page(page, args.all_rows);
    }

    Ok(())
}

fn print_page(page: &PageReport, all_rows: bool) {
    println!();
    println!(
        "{} page {} ({}, {} from {:?}, {:?} rows)",
        style("▶").cyan(),
        page.page,
        page.mode,
        page.scale.unit,
        page.scale.source,
        page.layout
    );
    match &page.anchor {
        Some(anchor) => println!("  period column at x={:.1} ({})", anchor.x0, anchor.year),
        None => println!("  no period column"),
    }

    for row in &page.rows {
        let Some(class) = &row.classification else {
            if all_rows {
                println!("  {}", style(&row.text).dim());
            }
            continue;
        };

        let pick = match &row.pick {
            Some(pick) if pick.anchored => format!("{} (anchored)", pick.value),
            Some(pick) => format!("{} (of {})", pick.value, pick.candidates),
            None => "no value".to_string(),
        };
        let outcome = match &row.outcome {
            Some(Ok(value)) => style(format!("{:.2}", value)).green(),
            Some(Err(e)) => style(e.to_string()).red(),
            None => style("-".to_string()).dim(),
        };
        println!(
            "  {:<16} {:<40} {} -> {}",
            class.key.name(),
            truncate(&row.text, 40),
            pick,
            outcome
        );
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
