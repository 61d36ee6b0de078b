use thiserror::Error;

use crate::types::Field;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Input is missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("There are still missing values in the dataset: {missing} in column '{field}'")]
    UnresolvedMissingValue { field: Field, missing: usize },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
