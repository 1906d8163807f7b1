use crate::bootstrap_config::BootstrapConfig;
use common::types::config::Config;
use log::info;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::path::{Path, PathBuf};

pub(super) fn load_config(bootstrap_config: &BootstrapConfig) -> Result<Config, ConfigError> {
    let path: &Path = &bootstrap_config.config_file;

    let config_file = File::open(path)
        .map_err(|err| ConfigError::File(path.to_path_buf(), err))?;
    let config: Config = serde_yml::from_reader(config_file)
        .map_err(|err| ConfigError::Parse(path.to_path_buf(), err))?;

    let Config::Version1 { datasets, .. } = &config;
    if datasets.is_empty() {
        return Err(ConfigError::NoDatasets);
    }

    info!(target: "main", "Config read successfully from '{path:?}'");

    Ok(config)
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    File(PathBuf, std::io::Error),
    Parse(PathBuf, serde_yml::Error),
    NoDatasets,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::File(path, err) => write!(f, "Could not open config file {:?}: {}", path, err),
            ConfigError::Parse(path, err) => write!(f, "Could not read config file {:?}: {}", path, err),
            ConfigError::NoDatasets => write!(f, "No datasets specified. Add at least one under `datasets:`"),
        }
    }
}
