// Library entry and high-level flow.
//
// The pipeline is strictly linear:
// load -> normalize -> resolve missing -> detect duplicates -> derive totals,
// after which the three reports read the finished table independently.
pub mod clean;
pub mod cli;
pub mod error;
pub mod loader;
pub mod output;
pub mod reports;
pub mod types;
pub mod util;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};

use crate::cli::Cli;
use crate::clean::{NormalizeReport, ResolveReport};
use crate::reports::{CustomerSegmentation, UNDERPERFORMER_COUNT};
use crate::types::{CategoryProfit, DuplicateRecord, ProductSales, RawRow, SalesRecord, SummaryStats};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("sales_report", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeOptions {
    pub drop_duplicates: bool,
}

/// Everything the pipeline produces from one raw table.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub records: Vec<SalesRecord>,
    pub normalize_report: NormalizeReport,
    pub resolve_report: ResolveReport,
    pub duplicates: Vec<DuplicateRecord>,
    pub segmentation: CustomerSegmentation,
    pub category_profit: Vec<CategoryProfit>,
    pub underperformers: Vec<ProductSales>,
    pub summary: SummaryStats,
}

/// Run the cleaning pipeline and all three reports over raw rows.
///
/// Fails only when missing values survive resolution; no report is produced
/// in that case.
pub fn analyze(rows: Vec<RawRow>, options: AnalyzeOptions) -> error::Result<Analysis> {
    let (typed, normalize_report) = clean::normalize(rows);
    let (mut clean_rows, resolve_report) = clean::resolve_missing(typed)?;

    let duplicates = clean::detect_duplicates(&clean_rows);
    if options.drop_duplicates {
        clean_rows = clean::drop_duplicates(clean_rows);
    }
    let records = clean::derive_total_sales(clean_rows);

    let segmentation = reports::segment_customers(&records);
    let category_profit = reports::profit_by_category(&records);
    let underperformers = reports::underperformers(&records, UNDERPERFORMER_COUNT);
    let summary = reports::generate_summary(&records, &segmentation, duplicates.len());

    Ok(Analysis {
        records,
        normalize_report,
        resolve_report,
        duplicates,
        segmentation,
        category_profit,
        underperformers,
        summary,
    })
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    info!("Loading '{}'", cli.input.display());
    let (rows, load_report) = loader::load_rows(&cli.input)
        .with_context(|| format!("Loading sales data from {:?}", cli.input))?;
    println!(
        "Processing dataset... ({} rows loaded)",
        util::format_int(load_report.loaded_rows)
    );
    if load_report.skipped_rows > 0 {
        println!(
            "Note: {} rows skipped due to decode errors.",
            util::format_int(load_report.skipped_rows)
        );
    }

    let analysis = analyze(
        rows,
        AnalyzeOptions {
            drop_duplicates: cli.drop_duplicates,
        },
    )
    .context("Cleaning sales data")?;

    print_duplicates(&analysis.duplicates, cli.show_duplicates);
    print_reports(&analysis);

    if let Some(dir) = &cli.export_dir {
        export(dir, &analysis).with_context(|| format!("Exporting reports to {:?}", dir))?;
        println!("(Reports exported to {})", dir.display());
    }
    Ok(())
}

fn print_duplicates(duplicates: &[DuplicateRecord], limit: usize) {
    if duplicates.is_empty() {
        println!("No duplicate records found.");
        return;
    }
    println!(
        "Found {} records sharing Customer Name, Date and Product Name.",
        util::format_int(duplicates.len())
    );
    if limit > 0 {
        println!("{}\n", output::render_table(duplicates, limit));
    }
}

fn print_reports(analysis: &Analysis) {
    let thresholds = format!(
        "Low <= {}, Medium <= {}",
        util::format_number(analysis.segmentation.low_thresh, 2),
        util::format_number(analysis.segmentation.high_thresh, 2)
    );
    output::print_report(
        "Total Spend by Customer Segment",
        Some(thresholds.as_str()),
        &analysis.segmentation.segments,
    );
    output::print_report(
        "Total Profit per Product Category",
        None,
        &analysis.category_profit,
    );
    let bottom = format!("Bottom {} by total sales", UNDERPERFORMER_COUNT);
    output::print_report(
        "Underperforming Products (Lowest Sales)",
        Some(bottom.as_str()),
        &analysis.underperformers,
    );
}

fn export(dir: &Path, analysis: &Analysis) -> error::Result<()> {
    std::fs::create_dir_all(dir)?;
    output::write_csv(&dir.join("segment_spend.csv"), &analysis.segmentation.segments)?;
    output::write_csv(&dir.join("customer_spend.csv"), &analysis.segmentation.customers)?;
    output::write_csv(&dir.join("category_profit.csv"), &analysis.category_profit)?;
    output::write_csv(&dir.join("underperformers.csv"), &analysis.underperformers)?;
    output::write_json(&dir.join("summary.json"), &analysis.summary)?;
    info!("Wrote 5 report files to {}", dir.display());
    Ok(())
}
