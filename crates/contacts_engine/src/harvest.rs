use std::path::{Path, PathBuf};

use contacts_core::{RunProgress, StopReason, Target};
use engine_logging::engine_info;
use thiserror::Error;

use crate::config::{load_config, ConfigError};
use crate::export::{write_csv, WriteError};
use crate::extract::{PageExtractor, SelectorExtractor};
use crate::fetch::{PageFetcher, ReqwestFetcher};
use crate::paginate::{PaginationSettings, Paginator, ProgressSink};
use crate::FetchError;

/// Fatal failures of a run. Per-entry decode failures never surface here.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// One invocation: which target to scrape and where the CSV goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestRequest {
    pub config_path: PathBuf,
    pub index: i64,
    pub output: PathBuf,
    pub max_pages: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSummary {
    pub target: String,
    pub output_path: PathBuf,
    pub records_written: usize,
    pub progress: RunProgress,
    pub stop: StopReason,
}

/// Load configuration, walk the selected target, write the CSV.
///
/// Configuration problems are reported before any request is made.
pub async fn run_harvest(
    request: &HarvestRequest,
    sink: &dyn ProgressSink,
) -> Result<HarvestSummary, HarvestError> {
    let config = load_config(&request.config_path)?;
    let target = config.target(request.index)?;
    let mut settings = config.settings().clone();
    match request.max_pages {
        Some(0) => {
            return Err(ConfigError::InvalidSetting("max pages must be at least 1".into()).into())
        }
        Some(max_pages) => settings.pagination.max_pages = max_pages,
        None => {}
    }

    let extractor = SelectorExtractor::new(&target.selectors, settings.missing_email)
        .map_err(|source| ConfigError::InvalidSelector {
            index: request.index as usize,
            source,
        })?;
    let fetcher = ReqwestFetcher::new(settings.fetch.clone())?;

    engine_info!(
        "Starting harvest of {} ({}{})",
        target.label(),
        target.subdomain,
        target.path_template
    );
    harvest_target(
        target,
        &fetcher,
        &extractor,
        settings.pagination,
        &request.output,
        sink,
    )
    .await
}

/// Paginate one target with the given collaborators and export the result.
///
/// Nothing is written when pagination fails.
pub async fn harvest_target(
    target: &Target,
    fetcher: &dyn PageFetcher,
    extractor: &dyn PageExtractor,
    settings: PaginationSettings,
    output: &Path,
    sink: &dyn ProgressSink,
) -> Result<HarvestSummary, HarvestError> {
    let harvest = Paginator::new(fetcher, extractor, settings)
        .run(target, sink)
        .await?;
    let output_path = write_csv(output, &harvest.records)?;

    Ok(HarvestSummary {
        target: target.label().to_string(),
        output_path,
        records_written: harvest.records.len(),
        progress: harvest.progress,
        stop: harvest.stop,
    })
}
