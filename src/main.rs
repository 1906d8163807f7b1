pub mod bootstrap_config;
mod config;
mod ingest;

use crate::config::load_config;
use analytics::queries::QueryError;
use analytics::warehouse::WarehouseError;
use bootstrap_config::BootstrapConfig;
use common::types::config::Config;
use common::util::logging;
use data_harvester::zones::ZoneLoadError;
use ingest::{ingest, IngestInput};
use log::{debug, error, info};
use std::fmt::{Display, Formatter};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(target: "main", "{}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), RidesError> {
    let bootstrap_config = BootstrapConfig::read();

    if let Err(err) = logging::initialize_logging(bootstrap_config.log_level.into()) {
        eprintln!("Could not initialize logging: {}", err);
    }
    print_startup_message();

    debug!(target: "main", "Reading config from {}", bootstrap_config.config_file.display());
    let Config::Version1 { datasets, zones, paths, sampling, regions, queries } = load_config(&bootstrap_config)?;

    let input = IngestInput { datasets, zones, paths, sampling, regions, queries };
    ingest(input, bootstrap_config.skip_queries).await
}

fn print_startup_message() {
    info!("\n  _ __  _   _  ___   _ __(_) __| | ___  ___ \n | '_ \\| | | |/ __| | '__| |/ _` |/ _ \\/ __|\n | | | | |_| | (__  | |  | | (_| |  __/\\__ \\\n |_| |_|\\__, |\\___| |_|  |_|\\__,_|\\___||___/\n        |___/                              \n T A X I   &   W E A T H E R   H A R V E S T E R\n");
}

#[derive(thiserror::Error, Debug)]
pub enum RidesError {
    Config(#[from] config::ConfigError),
    Zones(#[from] ZoneLoadError),
    Warehouse(#[from] WarehouseError),
    Query(#[from] QueryError),
    IO(#[from] std::io::Error),
    NoData,
}

impl Display for RidesError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let err: &dyn Display = match self {
            RidesError::Config(err) => err,
            RidesError::Zones(err) => err,
            RidesError::Warehouse(err) => err,
            RidesError::Query(err) => err,
            RidesError::IO(err) => err,
            RidesError::NoData => &"no dataset could be harvested, see the errors above",
        };
        let prefix = match self {
            RidesError::Config(_) => "Reading config file",
            RidesError::Zones(_) => "Loading taxi zones",
            RidesError::Warehouse(_) => "Writing warehouse",
            RidesError::Query(_) => "Running queries",
            RidesError::IO(_) => "Error during IO",
            RidesError::NoData => "Harvesting datasets",
        };
        write!(f, "{}: {}", prefix, err)
    }
}
