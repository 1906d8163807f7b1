use log::{debug, info};
use std::fmt;
use std::fmt::Display;
use std::fs::create_dir_all;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use url::Url;

/// One raw batch file of a dataset
#[derive(Debug, Clone, PartialEq)]
pub enum BatchSource {
    Url(Url),
    File(PathBuf),
}

impl BatchSource {
    /// Name of the batch file, which is also its cache key and provenance tag
    pub fn file_name(&self) -> Option<String> {
        match self {
            BatchSource::Url(url) => url.path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|name| !name.is_empty())
                .map(str::to_owned),
            BatchSource::File(path) => path.file_name()
                .map(|name| name.to_string_lossy().into_owned()),
        }
    }
}

impl Display for BatchSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BatchSource::Url(url) => write!(f, "{}", url),
            BatchSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Returns the local path of a batch. Remote batches are downloaded into `cache_dir` unless a
/// file with the same name is already there; local files are read in place.
pub async fn fetch_or_load(
    source: BatchSource,
    cache_dir: &Path,
) -> Result<FetchStepOutput, FetchError> {
    let file_name = source.file_name()
        .ok_or_else(|| FetchError::NoFileName(source.to_string()))?;

    match &source {
        BatchSource::File(path) => {
            if !path.is_file() {
                return Err(FetchError::MissingFile(path.clone()));
            }
            Ok(FetchStepOutput { path: path.clone(), file_name, source })
        }
        BatchSource::Url(url) => {
            let path = cache_dir.join(&file_name);

            if path.is_file() {
                debug!(target: "fetch", "Using cached batch at {}", path.display());
                return Ok(FetchStepOutput { path, file_name, source });
            }

            info!(target: "fetch", "Downloading {}", url);
            create_dir_all(cache_dir)?;

            // Written next to its final location, so the rename below does not cross filesystems
            let mut file = NamedTempFile::new_in(cache_dir)?;
            let response = reqwest::get(url.clone()).await?.error_for_status()?;
            file.write_all(&response.bytes().await?)?;
            file.persist(&path)?;

            Ok(FetchStepOutput { path, file_name, source })
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    Reqwest(#[from] reqwest::Error),
    File(#[from] std::io::Error),
    Persist(#[from] tempfile::PersistError),
    NoFileName(String),
    MissingFile(PathBuf),
}

impl Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FetchError::Reqwest(err) => err.fmt(f),
            FetchError::File(err) => err.fmt(f),
            FetchError::Persist(err) => err.fmt(f),
            FetchError::NoFileName(source) => write!(f, "Cannot derive a file name from '{}'", source),
            FetchError::MissingFile(path) => write!(f, "File {} does not exist", path.display()),
        }
    }
}

pub struct FetchStepOutput {
    pub source: BatchSource,
    pub path: PathBuf,
    pub file_name: String,
}
