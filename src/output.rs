//! Output writers: CSV and JSON. Consume the collected record list and write
//! one file, creating or overwriting the destination.

use crate::model::{BookRecord, CSV_COLUMNS};
use std::fs::File;
use std::path::Path;
use thiserror::Error;

/// Output format selector for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

/// Errors from the output writers.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to write output: {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write CSV: {path}: {source}")]
    Csv {
        path: std::path::PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write JSON: {path}: {source}")]
    Json {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Write records in the selected format.
pub fn write_records(
    records: &[BookRecord],
    format: OutputFormat,
    path: &Path,
) -> Result<(), WriteError> {
    match format {
        OutputFormat::Csv => write_csv(records, path),
        OutputFormat::Json => write_json(records, path),
    }
}

/// Write CSV: fixed column order, header row, one row per record. An absent
/// url becomes an empty cell.
pub fn write_csv(records: &[BookRecord], path: &Path) -> Result<(), WriteError> {
    let path = path.to_path_buf();
    let file = File::create(&path).map_err(|e| WriteError::Io {
        path: path.clone(),
        source: e,
    })?;
    let mut writer = csv::Writer::from_writer(file);
    writer
        .write_record(CSV_COLUMNS)
        .map_err(|e| WriteError::Csv {
            path: path.clone(),
            source: e,
        })?;
    for record in records {
        writer
            .write_record([
                record.title.as_str(),
                record.author.as_str(),
                record.price.as_str(),
                record.rating.as_str(),
                record.url.as_deref().unwrap_or(""),
            ])
            .map_err(|e| WriteError::Csv {
                path: path.clone(),
                source: e,
            })?;
    }
    writer.flush().map_err(|e| WriteError::Io {
        path: path.clone(),
        source: e,
    })
}

/// Write JSON: pretty-printed array of flat objects, insertion order preserved.
pub fn write_json(records: &[BookRecord], path: &Path) -> Result<(), WriteError> {
    let path = path.to_path_buf();
    let file = File::create(&path).map_err(|e| WriteError::Io {
        path: path.clone(),
        source: e,
    })?;
    serde_json::to_writer_pretty(file, records).map_err(|e| WriteError::Json {
        path: path.clone(),
        source: e,
    })
}
