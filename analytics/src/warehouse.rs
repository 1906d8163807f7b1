use common::types::tables::CanonicalTable;
use log::{debug, info};
use polars::frame::DataFrame;
use polars::prelude::{concat, IntoLazy, LazyFrame, ParquetReader, ParquetWriter, ScanArgsParquet, SerReader, UnionArgs};
use std::fmt;
use std::fmt::Display;
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A directory with one Parquet file per canonical table
pub struct Warehouse {
    dir: PathBuf,
}

impl Warehouse {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, WarehouseError> {
        let dir = dir.into();
        create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn table_path(&self, table: CanonicalTable) -> PathBuf {
        self.dir.join(format!("{}.parquet", table.name()))
    }

    /// Writes an empty table for every canonical table that does not exist yet
    pub fn create_tables(&self) -> Result<(), WarehouseError> {
        for table in CanonicalTable::ALL {
            let path = self.table_path(table);
            if path.exists() {
                debug!(target: "warehouse", "Table {} already exists", table);
                continue;
            }

            let mut empty = DataFrame::empty_with_schema(&table.schema());
            self.replace(&path, &mut empty)?;
            info!(target: "warehouse", "Created table {} at {}", table, path.display());
        }
        Ok(())
    }

    /// Conforms the rows to the table's schema and appends them. Returns the number of rows
    /// the table has afterwards.
    pub fn append(&self, table: CanonicalTable, rows: DataFrame) -> Result<usize, WarehouseError> {
        let path = self.table_path(table);
        if !path.exists() {
            return Err(WarehouseError::MissingTable(table));
        }

        let existing = ParquetReader::new(File::open(&path)?).finish()?;
        let rows = table.conform(rows)?;
        let appended = rows.height();

        let mut combined = concat([existing.lazy(), rows.lazy()], UnionArgs::default())?.collect()?;
        self.replace(&path, &mut combined)?;

        debug!(target: "warehouse", "Appended {} rows to {}, {} in total", appended, table, combined.height());
        Ok(combined.height())
    }

    pub fn scan(&self, table: CanonicalTable) -> Result<LazyFrame, WarehouseError> {
        let path = self.table_path(table);
        if !path.exists() {
            return Err(WarehouseError::MissingTable(table));
        }
        Ok(LazyFrame::scan_parquet(&path, ScanArgsParquet::default())?)
    }

    pub fn read(&self, table: CanonicalTable) -> Result<DataFrame, WarehouseError> {
        Ok(self.scan(table)?.collect()?)
    }

    // Readers never see a half written table
    fn replace(&self, path: &Path, frame: &mut DataFrame) -> Result<(), WarehouseError> {
        let mut file = NamedTempFile::new_in(&self.dir)?;
        ParquetWriter::new(&mut file).finish(frame)?;
        file.persist(path)?;
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum WarehouseError {
    IO(#[from] std::io::Error),
    Persist(#[from] tempfile::PersistError),
    Polars(#[from] polars::error::PolarsError),
    MissingTable(CanonicalTable),
}

impl Display for WarehouseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WarehouseError::IO(err) => err.fmt(f),
            WarehouseError::Persist(err) => err.fmt(f),
            WarehouseError::Polars(err) => err.fmt(f),
            WarehouseError::MissingTable(table) => {
                write!(f, "Table {} does not exist, it has to be created before it is written", table)
            }
        }
    }
}
