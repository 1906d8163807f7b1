use crate::sources::{resolve_sources, SourceError};
use crate::step1_fetch::{fetch_or_load, BatchSource, FetchError};
use crate::step2_import::{import_batch, ImportError};
use crate::step3_sample::{sample_batch, SampleError};
use crate::step4_normalize::{normalizers_for, NormalizeContext, NormalizeError};
use crate::step5_merge::{merge, DatasetMergeOutput, MergeError, NormalizedBatch};
use crate::zones::ZoneTable;
use common::types::dataset::{Dataset, DatasetKind};
use common::types::region::RegionConfig;
use common::types::sampling::SamplingConfig;
use futures::StreamExt;
use log::{error, info, warn};
use std::fmt;
use std::fmt::Display;
use std::path::Path;

/// Everything a dataset run reads but never changes
pub struct HarvestContext<'a> {
    pub zones: &'a ZoneTable,
    pub regions: &'a RegionConfig,
    pub sampling: &'a SamplingConfig,
    pub cache_dir: &'a Path,
}

pub async fn harvest_dataset(
    dataset: &Dataset,
    context: &HarvestContext<'_>,
) -> Result<DatasetMergeOutput, HarvestError> {
    let sources = resolve_sources(dataset).await?;
    if sources.is_empty() {
        warn!(target: "harvest", "Dataset '{}' has no batches", dataset.id);
    }

    Ok(process_all(sources, dataset.kind, dataset.is_sampled(), context).await?)
}

/// Fetches, samples and normalizes the batches one after another. A failing batch is logged
/// and skipped; only if no batch succeeds the dataset fails.
pub async fn process_all(
    sources: Vec<BatchSource>,
    kind: DatasetKind,
    sampled: bool,
    context: &HarvestContext<'_>,
) -> Result<DatasetMergeOutput, MergeError> {
    let total = sources.len();

    let batches: Vec<NormalizedBatch> = futures::stream::iter(sources)
        .then(|source| async move {
            let identifier = source.to_string();
            process_batch(source, kind, sampled, context).await
                .inspect_err(|err| {
                    error!(target: "harvest", "Error in batch '{}': {}", identifier, err);
                    warn!(target: "harvest", "Skipping batch '{}'", identifier);
                })
                .ok()
        })
        .filter_map(|batch| async move { batch })
        .collect()
        .await;

    info!(target: "harvest", "Processed {} of {} batches", batches.len(), total);

    merge(batches)
}

pub async fn process_batch(
    source: BatchSource,
    kind: DatasetKind,
    sampled: bool,
    context: &HarvestContext<'_>,
) -> Result<NormalizedBatch, BatchError> {
    let fetched = fetch_or_load(source, context.cache_dir).await?;
    let imported = import_batch(fetched)?;
    let source_file = imported.source_file;

    let raw = if sampled {
        sample_batch(imported.frame, context.sampling)?
    } else {
        imported.frame
    };

    let normalize_context = NormalizeContext { zones: context.zones, regions: context.regions };
    let tables = normalizers_for(kind).iter()
        .map(|normalizer| Ok((normalizer.table(), normalizer.normalize(&raw, &normalize_context)?)))
        .collect::<Result<Vec<_>, BatchError>>()?;

    for (table, frame) in &tables {
        info!(target: "harvest", "{}: {} of {} rows kept for {}", source_file, frame.height(), raw.height(), table);
    }

    Ok(NormalizedBatch { source_file, tables })
}

#[derive(thiserror::Error, Debug)]
pub enum BatchError {
    Fetch(#[from] FetchError),
    Import(#[from] ImportError),
    Sample(#[from] SampleError),
    Normalize(#[from] NormalizeError),
}

impl Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let err: &dyn Display = match self {
            BatchError::Fetch(err) => err,
            BatchError::Import(err) => err,
            BatchError::Sample(err) => err,
            BatchError::Normalize(err) => err,
        };
        let prefix = match self {
            BatchError::Fetch(_) => "Fetching",
            BatchError::Import(_) => "Importing",
            BatchError::Sample(_) => "Sampling",
            BatchError::Normalize(_) => "Normalizing",
        };
        write!(f, "{}: {}", prefix, err)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    Source(#[from] SourceError),
    Merge(#[from] MergeError),
}

impl Display for HarvestError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let err: &dyn Display = match self {
            HarvestError::Source(err) => err,
            HarvestError::Merge(err) => err,
        };
        write!(f, "{}", err)
    }
}
