use crate::error::{PipelineError, Result};
use crate::types::{RawRow, REQUIRED_COLUMNS};
use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub skipped_rows: usize,
}

/// Load the raw sales table from a comma-separated file with a header row.
pub fn load_rows(path: &Path) -> Result<(Vec<RawRow>, LoadReport)> {
    let file = File::open(path)?;
    debug!("Opened {}", path.display());
    read_rows(file)
}

/// Read raw rows from any CSV source. Rows that cannot be decoded are skipped
/// and counted rather than aborting the load.
pub fn read_rows<R: Read>(source: R) -> Result<(Vec<RawRow>, LoadReport)> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(source);

    let headers = rdr.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(PipelineError::MissingColumn {
                column: column.to_string(),
            });
        }
    }

    let mut report = LoadReport::default();
    let mut rows: Vec<RawRow> = Vec::new();
    for (idx, result) in rdr.deserialize::<RawRow>().enumerate() {
        report.total_rows += 1;
        match result {
            Ok(r) => rows.push(r),
            Err(e) => {
                // Header is line 1, so data row `idx` sits on line idx + 2.
                warn!("Skipping line {}: {}", idx + 2, e);
                report.skipped_rows += 1;
            }
        }
    }
    report.loaded_rows = rows.len();
    Ok((rows, report))
}
