use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Clean a messy sales CSV and report spend segments, category profit and weak products",
    long_about = None
)]
pub struct Cli {
    /// Input CSV file with a header row
    #[arg(short, long, default_value = "messy_sales_data.csv")]
    pub input: PathBuf,
    /// Remove records identical in every field before reporting
    #[arg(long)]
    pub drop_duplicates: bool,
    /// Number of duplicate-group records to preview (0 hides the preview)
    #[arg(long, default_value_t = 10)]
    pub show_duplicates: usize,
    /// Directory to export report CSVs and summary.json into
    #[arg(short, long)]
    pub export_dir: Option<PathBuf>,
}
