use polars::error::PolarsError;
use std::io::Error as IoError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] IoError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No <table> found in page {0}")]
    TableNotFound(String),

    #[error("Table has {rows} rows, header row {header_row} is out of range")]
    HeaderRowMissing { header_row: usize, rows: usize },

    #[error("Missing column, expected one of: {}", .0.join(", "))]
    MissingColumn(Vec<String>),

    #[error("Chart service error for {ticker}: {message}")]
    ChartPayload { ticker: String, message: String },

    #[error("Drawing error: {0}")]
    Drawing(String),
}
