use log::LevelFilter;
use clap::Parser;
use std::path::PathBuf;

/// Harvests NYC taxi, Uber and weather records into a warehouse and answers queries over it
#[derive(Parser, Clone)]
#[command(version, about)]
pub struct BootstrapConfig {
    /// YAML file listing the datasets, the zone file and the output paths
    #[clap(short('c'), long("config"), env("NYC_RIDES_CONFIG"), default_value_os = "config.yaml")]
    pub config_file: PathBuf,
    /// Verbosity of the log, `RUST_LOG` refines it per target
    #[clap(short('l'), long("log-level"), env("NYC_RIDES_LOG_LEVEL"), default_value_t, value_enum)]
    pub log_level: LogLevel,
    /// Only fill the warehouse, don't answer the queries
    #[clap(long("skip-queries"))]
    pub skip_queries: bool,
}

impl BootstrapConfig {
    pub fn read() -> Self {
        BootstrapConfig::parse()
    }
}


#[derive(clap::ValueEnum, Clone, Copy, Default)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Off => Self::Off,
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}
