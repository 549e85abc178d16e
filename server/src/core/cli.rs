use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_CONFIG, ENV_DB_FILE, ENV_HOST, ENV_MERGE_POLICY, ENV_PORT, ENV_RETENTION_DAYS,
    ENV_STATIC_DIR, ENV_TOPIC_AIR_QUALITY, ENV_TOPIC_HUMIDITY, ENV_TOPIC_STATUS,
    ENV_TOPIC_TEMPERATURE,
};
use crate::domain::readings::MergePolicy;

#[derive(Parser)]
#[command(name = "sensorhub")]
#[command(version, about = "Environmental sensor ingestion and query server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// SQLite database file (defaults to the data directory)
    #[arg(long, global = true, env = ENV_DB_FILE)]
    pub db_file: Option<PathBuf>,

    /// Topic carrying temperature readings
    #[arg(long, global = true, env = ENV_TOPIC_TEMPERATURE)]
    pub topic_temperature: Option<String>,

    /// Topic carrying humidity readings
    #[arg(long, global = true, env = ENV_TOPIC_HUMIDITY)]
    pub topic_humidity: Option<String>,

    /// Topic carrying air-quality readings
    #[arg(long, global = true, env = ENV_TOPIC_AIR_QUALITY)]
    pub topic_air_quality: Option<String>,

    /// Topic carrying device status messages
    #[arg(long, global = true, env = ENV_TOPIC_STATUS)]
    pub topic_status: Option<String>,

    /// Correlation merge policy (latest-snapshot or reset-after-emit)
    #[arg(long, global = true, env = ENV_MERGE_POLICY, value_parser = parse_merge_policy)]
    pub merge_policy: Option<MergePolicy>,

    /// Automatically delete readings older than this many days (0 = disabled)
    #[arg(long, global = true, env = ENV_RETENTION_DAYS)]
    pub retention_days: Option<u32>,

    /// Directory with dashboard assets served at /
    #[arg(long, global = true, env = ENV_STATIC_DIR)]
    pub static_dir: Option<PathBuf>,
}

/// Parse merge policy from CLI/env string
fn parse_merge_policy(s: &str) -> Result<MergePolicy, String> {
    match s.to_lowercase().as_str() {
        "latest-snapshot" | "latest" => Ok(MergePolicy::LatestSnapshot),
        "reset-after-emit" | "reset" => Ok(MergePolicy::ResetAfterEmit),
        _ => Err(format!(
            "Invalid merge policy '{}'. Valid options: latest-snapshot, reset-after-emit",
            s
        )),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// System maintenance commands
    System {
        #[command(subcommand)]
        command: SystemCommands,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum SystemCommands {
    /// Delete stored readings older than the given age. Requires confirmation.
    Cleanup {
        /// Age threshold in days
        #[arg(short, long, default_value_t = crate::core::constants::DEFAULT_CLEANUP_DAYS)]
        days: u32,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub db_file: Option<PathBuf>,
    pub topic_temperature: Option<String>,
    pub topic_humidity: Option<String>,
    pub topic_air_quality: Option<String>,
    pub topic_status: Option<String>,
    pub merge_policy: Option<MergePolicy>,
    pub retention_days: Option<u32>,
    pub static_dir: Option<PathBuf>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        config: cli.config,
        db_file: cli.db_file,
        topic_temperature: cli.topic_temperature,
        topic_humidity: cli.topic_humidity,
        topic_air_quality: cli.topic_air_quality,
        topic_status: cli.topic_status,
        merge_policy: cli.merge_policy,
        retention_days: cli.retention_days,
        static_dir: cli.static_dir,
    };
    (config, cli.command)
}
