//! Tolerant CSV reading.
//!
//! Source files are comma separated with `"` quoting. Rows with missing
//! fields, extra fields or unknown headers are still read; a row that cannot
//! be decoded at all is reported and skipped instead of aborting the file.

use std::fs::File;
use std::path::Path;

use ::csv::{Reader, ReaderBuilder, Trim};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Result of decoding one data row.
#[derive(Debug)]
pub enum RowOutcome<T> {
    Row(T),
    /// The row could not be decoded; `line` is 1-based in the source file.
    Malformed { line: u64, reason: String },
}

/// Opens a CSV file with the tolerant reader settings.
pub fn open_reader(path: &Path) -> Result<Reader<File>, AppError> {
    let file = File::open(path).map_err(|e| AppError::io(path, e))?;
    Ok(builder().from_reader(file))
}

fn builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder
        .delimiter(b',')
        .quote(b'"')
        .has_headers(true)
        .flexible(true)
        .trim(Trim::None);
    builder
}

/// Iterates the data rows of a reader, decoding each into `T`.
///
/// Header handling is by name, so column order does not matter and unknown
/// columns are ignored. Rows shorter than the header are padded with empty
/// fields, which decode as absent.
pub fn read_rows<T, R>(mut reader: Reader<R>) -> Result<impl Iterator<Item = RowOutcome<T>>, AppError>
where
    T: DeserializeOwned,
    R: std::io::Read,
{
    let headers = reader.headers()?.clone();
    Ok(reader.into_records().map(move |result| match result {
        Ok(mut record) => {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            while record.len() < headers.len() {
                record.push_field("");
            }
            match record.deserialize::<T>(Some(&headers)) {
                Ok(row) => RowOutcome::Row(row),
                Err(err) => RowOutcome::Malformed {
                    line,
                    reason: err.to_string(),
                },
            }
        }
        Err(err) => RowOutcome::Malformed {
            line: err.position().map(|p| p.line()).unwrap_or(0),
            reason: err.to_string(),
        },
    }))
}

/// Builds a reader over in-memory CSV text. Used by tests and small inputs.
pub fn reader_from_str(text: &str) -> Reader<&[u8]> {
    builder().from_reader(text.as_bytes())
}
