//! Record sources: lazy sequences of flat, string-keyed rows.

use log::info;
use polars::prelude::*;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// A single untyped row: column name → raw cell text.
pub type RawRecord = HashMap<String, String>;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error reading CSV data from '{0}'")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to buffer CSV data")]
    Buffer(#[source] std::io::Error),

    #[error("Failed to parse CSV data from '{0}'")]
    Parse(PathBuf, #[source] PolarsError),

    #[error("Column '{0}' is not a text column")]
    ColumnType(String, #[source] PolarsError),
}

/// Reads a headered CSV file into [`RawRecord`]s, one per row.
///
/// Every column is read as text so that the [`crate::FieldBinder`] alone decides
/// how values are parsed. Empty cells are left out of the record.
///
/// ```no_run
/// use climatestore::CsvSource;
///
/// # fn run() -> Result<(), climatestore::SourceError> {
/// let rows = CsvSource::from_path("zurich.csv", b';')?;
/// for row in rows {
///     println!("{:?}", row.get("Date"));
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CsvSource {
    columns: Vec<(String, StringChunked)>,
    height: usize,
    row: usize,
}

impl CsvSource {
    pub fn from_path(path: impl AsRef<Path>, separator: u8) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();
        let frame = CsvReadOptions::default()
            .with_has_header(true)
            // All columns as String; the binder does the typing.
            .with_infer_schema_length(Some(0))
            .map_parse_options(|options| options.with_separator(separator))
            .try_into_reader_with_file_path(Some(path.clone()))
            .map_err(|e| SourceError::Parse(path.clone(), e))?
            .finish()
            .map_err(|e| SourceError::Parse(path.clone(), e))?;
        info!(
            "Read {} CSV rows with {} columns from {}",
            frame.height(),
            frame.width(),
            path.display()
        );
        Self::from_frame(frame)
    }

    /// Reads CSV held in memory, e.g. a downloaded response body.
    pub fn from_bytes(bytes: &[u8], separator: u8) -> Result<Self, SourceError> {
        let mut temp_file = NamedTempFile::new().map_err(SourceError::Buffer)?;
        temp_file.write_all(bytes).map_err(SourceError::Buffer)?;
        temp_file.flush().map_err(SourceError::Buffer)?;
        // `temp_file` must outlive the read below.
        Self::from_path(temp_file.path(), separator)
    }

    fn from_frame(frame: DataFrame) -> Result<Self, SourceError> {
        let columns = frame
            .get_columns()
            .iter()
            .map(|column| {
                let name = column.name().to_string();
                column
                    .str()
                    .map(|values| (name.clone(), values.clone()))
                    .map_err(|e| SourceError::ColumnType(name, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            columns,
            height: frame.height(),
            row: 0,
        })
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }
}

impl Iterator for CsvSource {
    type Item = RawRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.row >= self.height {
            return None;
        }
        let row = self.row;
        self.row += 1;
        Some(
            self.columns
                .iter()
                .filter_map(|(name, values)| {
                    values
                        .get(row)
                        .filter(|cell| !cell.is_empty())
                        .map(|cell| (name.clone(), cell.to_string()))
                })
                .collect(),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.height.saturating_sub(self.row);
        (remaining, Some(remaining))
    }
}
