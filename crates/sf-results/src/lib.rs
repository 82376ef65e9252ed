//! sf-results: text reports and JSON summaries.

pub mod report;
pub mod summary;

pub use report::{Column, InitialConditions, Report, zone_report};
pub use summary::{CjSummary, ShockSummary, ZoneSummary, load_json, save_json, to_json};

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Column {column} has {got} rows, expected {expected}")]
    RaggedColumns {
        column: String,
        expected: usize,
        got: usize,
    },
}
