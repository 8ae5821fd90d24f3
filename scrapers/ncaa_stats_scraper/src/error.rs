use std::path::PathBuf;
use thiserror::Error;

use crate::types::TableKind;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Connection to {url} failed after {attempts} attempts")]
    ConnectionExhausted {
        url: String,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// The table no longer looks like a sports-reference stats table.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("Table has no header row")]
    MissingHeaderRow,

    #[error("No season row with data above the summary row")]
    NoSeasonFound,

    #[error("Season row has {found} stat cells but the header names {expected} columns")]
    ColumnMismatch { expected: usize, found: usize },

    #[error("Invalid number {value:?} in column {field}")]
    InvalidNumber { field: String, value: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to replace checkpoint file: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Bad record in {path:?} line {line}: {source}")]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unreadable checkpoint manifest {path:?}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to open player list: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read player list: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors that stop a scrape run.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to extract {kind} for {player}: {source}")]
    Extraction {
        player: String,
        kind: TableKind,
        #[source]
        source: ExtractionError,
    },

    #[error("Checkpoint failed: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
