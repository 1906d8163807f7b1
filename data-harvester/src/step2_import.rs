use crate::step1_fetch::{BatchSource, FetchStepOutput};
use log::debug;
use polars::frame::DataFrame;
use polars::io::SerReader;
use polars::prelude::{CsvReadOptions, ParquetReader};
use std::fmt::Display;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::{fmt, io};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum BatchFormat {
    Parquet,
    Csv,
}

impl BatchFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_string_lossy().to_ascii_lowercase();
        match extension.as_str() {
            "parquet" => Some(BatchFormat::Parquet),
            "csv" => Some(BatchFormat::Csv),
            _ => None,
        }
    }
}

/// Reads a fetched batch into memory. CSV columns are all read as strings; the normalizers
/// coerce them.
pub fn import_batch(
    FetchStepOutput { source, path, file_name }: FetchStepOutput
) -> Result<ImportStepOutput, ImportError> {
    // The cache file carries the name of the remote file, so both kinds resolve the same way
    let format = BatchFormat::from_path(Path::new(&file_name))
        .ok_or_else(|| ImportError::UnsupportedFormat(path.clone()))?;

    let frame = match format {
        BatchFormat::Parquet => ParquetReader::new(File::open(&path)?).finish()?,
        BatchFormat::Csv => CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(path.clone()))?
            .finish()?,
    };

    debug!(target: "import", "Read {} rows from {}", frame.height(), path.display());

    Ok(ImportStepOutput { source, source_file: file_name, frame })
}

#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    File(#[from] io::Error),
    Polars(#[from] polars::error::PolarsError),
    UnsupportedFormat(PathBuf),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let err: &dyn Display = match self {
            ImportError::File(err) => err,
            ImportError::Polars(err) => err,
            ImportError::UnsupportedFormat(path) => {
                return write!(f, "Unsupported batch format of {}, expected .parquet or .csv", path.display())
            }
        };
        write!(f, "{}", err)
    }
}

pub struct ImportStepOutput {
    pub source: BatchSource,
    pub source_file: String,
    pub frame: DataFrame,
}
