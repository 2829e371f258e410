use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use visitas::prelude::*;

#[derive(Parser)]
#[command(name = "visitas-cli")]
#[command(about = "Aggregate field visit records against the CIIU classification", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build all reports and export them
    Report(ReportArgs),
    /// Extract geolocated visit points as JSON
    Points(PointsArgs),
    /// Print a summary of the datasets and diagnostics
    Stats(StatsArgs),
}

#[derive(Args)]
struct DataArgs {
    /// Path to the primary visit dataset (CSV)
    #[arg(short, long)]
    visits: PathBuf,
    /// Path to the CIIU reference dataset (CSV)
    #[arg(short, long)]
    reference: PathBuf,
    /// Inclusive range start (YYYY-MM-DD); defaults to the earliest valid date
    #[arg(long)]
    start: Option<String>,
    /// Inclusive range end (YYYY-MM-DD); defaults to the latest valid date
    #[arg(long)]
    end: Option<String>,
}

#[derive(Args)]
struct ReportArgs {
    #[command(flatten)]
    data: DataArgs,
    /// Output path: a file for JSON, a directory for CSV
    #[arg(short, long)]
    output: PathBuf,
    /// Export format
    #[arg(long, value_enum, default_value_t = ExportFormatOpt::Json)]
    format: ExportFormatOpt,
}

#[derive(Args)]
struct PointsArgs {
    #[command(flatten)]
    data: DataArgs,
    /// Output file; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct StatsArgs {
    #[command(flatten)]
    data: DataArgs,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum ExportFormatOpt {
    Json,
    Csv,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Report(args) => cmd_report(args),
        Commands::Points(args) => cmd_points(args),
        Commands::Stats(args) => cmd_stats(args),
    }
}

fn parse_bound(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| VisitasError::date_parse_with_format(raw, "YYYY-MM-DD"))
}

fn run_bundle(data: &DataArgs) -> anyhow::Result<ReportBundle> {
    let config = visitas::config::global_config();

    let builder = ReportInputsBuilder::new()
        .visits(&data.visits)
        .reference(&data.reference);
    #[cfg(feature = "progress")]
    let builder = builder.show_progress(config.enable_progress_bar);
    let inputs = builder.load().context("failed to load input datasets")?;

    let window = match (&data.start, &data.end) {
        (Some(start), Some(end)) => {
            Some(DateWindow::new(parse_bound(start)?, parse_bound(end)?))
        }
        (None, None) => None,
        _ => anyhow::bail!("--start and --end must be given together"),
    };

    let options = ReportOptions { window, top_codes: config.top_codes };
    Ok(inputs.reports(options))
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    if diagnostics.invalid_classification_rows > 0 {
        eprintln!(
            "Warning: {} rows had no usable CIIU code and were kept without a category",
            diagnostics.invalid_classification_rows
        );
    }
    if diagnostics.no_valid_dates {
        eprintln!("Warning: no record carries a parseable visit date; date-scoped reports are empty");
    } else if diagnostics.empty_date_range {
        eprintln!("Warning: no visit falls inside the requested date range");
    }
    if diagnostics.invalid_coordinate_rows > 0 {
        eprintln!(
            "Warning: {} rows had missing or malformed coordinates",
            diagnostics.invalid_coordinate_rows
        );
    }
    if diagnostics.no_valid_coordinates {
        eprintln!("Warning: no valid coordinates; there is nothing to map");
    }
}

fn cmd_report(args: ReportArgs) -> anyhow::Result<()> {
    let bundle = run_bundle(&args.data)?;
    print_diagnostics(&bundle.diagnostics);

    match args.format {
        ExportFormatOpt::Json => JsonExporter::new().export(&bundle, &args.output),
        ExportFormatOpt::Csv => CsvExporter::new().export(&bundle, &args.output),
    }
    .with_context(|| format!("failed to export to {}", args.output.display()))?;

    println!("Exported reports to {}", args.output.display());
    Ok(())
}

fn cmd_points(args: PointsArgs) -> anyhow::Result<()> {
    let bundle = run_bundle(&args.data)?;
    print_diagnostics(&bundle.diagnostics);

    let json = serde_json::to_string_pretty(&bundle.geo_points)?;
    match args.output {
        Some(path) => {
            std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {} points to {}", bundle.geo_points.len(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_stats(args: StatsArgs) -> anyhow::Result<()> {
    let bundle = run_bundle(&args.data)?;

    println!("=== Visit Report Summary ===");
    if let Some(window) = bundle.window {
        println!("Date range: {} to {}", window.start, window.end);
    } else {
        println!("Date range: (no valid dates)");
    }
    println!("Categories:");
    for count in &bundle.category_counts {
        println!(
            "  {}: {}",
            count.category.as_deref().unwrap_or("(sin categoría)"),
            count.count
        );
    }
    println!("Top codes:");
    for top in &bundle.top_codes {
        println!(
            "  {} | {} | {}",
            top.code,
            top.count,
            top.description.as_deref().unwrap_or("")
        );
    }
    println!("Professionals: {}", bundle.professional_totals.len());
    for (professional, count) in &bundle.professional_totals {
        println!("  {}: {}", professional, count);
    }
    println!("Months observed: {}", bundle.pivot.months.join(", "));
    println!("Mappable points: {}", bundle.geo_points.len());
    print_diagnostics(&bundle.diagnostics);
    Ok(())
}
