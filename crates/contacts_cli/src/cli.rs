use std::path::PathBuf;

use clap::Parser;
use contacts_engine::HarvestRequest;
use engine_logging::LogDestination;

/// Harvest names and Cloudflare-protected emails from a paginated listing
#[derive(Debug, Parser)]
#[command(name = "contacts", version)]
pub struct Cli {
    /// Target index in the configuration file
    #[arg(short, long, allow_negative_numbers = true)]
    pub index: i64,

    /// Output CSV file
    #[arg(short, long, default_value = "output.csv")]
    pub output: PathBuf,

    /// JSON file listing the targets
    #[arg(short, long, default_value = "subdomains.json")]
    pub config: PathBuf,

    /// Override the configured maximum number of pages
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Also write the log to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Log page progress instead of drawing a progress spinner
    #[arg(long)]
    pub no_progress: bool,
}

impl Cli {
    pub fn harvest_request(&self) -> HarvestRequest {
        HarvestRequest {
            config_path: self.config.clone(),
            index: self.index,
            output: self.output.clone(),
            max_pages: self.max_pages,
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        match &self.log_file {
            Some(path) => LogDestination::TerminalAndFile(path.clone()),
            None => LogDestination::Terminal,
        }
    }
}
