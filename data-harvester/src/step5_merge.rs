use common::types::tables::{CanonicalTable, SOURCE_FILE};
use log::debug;
use polars::frame::DataFrame;
use polars::prelude::{concat, lit, IntoLazy, UnionArgs};
use std::fmt;
use std::fmt::Display;

/// Canonical rows produced from one raw batch
pub struct NormalizedBatch {
    pub source_file: String,
    pub tables: Vec<(CanonicalTable, DataFrame)>,
}

/// Concatenates the batches of a dataset into one frame per canonical table. Every row is
/// tagged with the file it came from.
pub fn merge(batches: Vec<NormalizedBatch>) -> Result<DatasetMergeOutput, MergeError> {
    if batches.is_empty() {
        return Err(MergeError::NoData);
    }

    let mut tables = vec![];
    for table in CanonicalTable::ALL {
        let frames: Vec<_> = batches.iter()
            .flat_map(|batch| batch.tables.iter()
                .filter(|(produced, _)| *produced == table)
                .map(|(_, frame)| frame.clone().lazy()
                    .with_column(lit(batch.source_file.clone()).alias(SOURCE_FILE))))
            .collect();

        if frames.is_empty() {
            continue;
        }

        let merged = table.conform(concat(frames, UnionArgs::default())?.collect()?)?;
        debug!(target: "merge", "Merged {} rows into {}", merged.height(), table);
        tables.push((table, merged));
    }

    Ok(DatasetMergeOutput { tables })
}

pub struct DatasetMergeOutput {
    pub tables: Vec<(CanonicalTable, DataFrame)>,
}

impl DatasetMergeOutput {
    pub fn table(&self, table: CanonicalTable) -> Option<&DataFrame> {
        self.tables.iter()
            .find(|(candidate, _)| *candidate == table)
            .map(|(_, frame)| frame)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum MergeError {
    Polars(#[from] polars::error::PolarsError),
    NoData,
}

impl Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MergeError::Polars(err) => err.fmt(f),
            MergeError::NoData => write!(f, "No batch of the dataset could be processed"),
        }
    }
}
