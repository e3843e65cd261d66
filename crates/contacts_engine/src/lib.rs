//! Contacts engine: configuration, fetch, extraction, pagination and CSV export.
mod charset;
mod config;
mod export;
mod extract;
mod fetch;
mod harvest;
mod paginate;
mod persist;
mod types;

pub use charset::{decode_page, DecodedPage};
pub use config::{load_config, parse_config, ConfigError, HarvestConfig, HarvestSettings};
pub use export::{write_csv, WriteError, CSV_HEADER};
pub use extract::{
    MissingEmailPolicy, PageExtraction, PageExtractor, SelectorError, SelectorExtractor,
};
pub use fetch::{FetchSettings, PageFetcher, ReqwestFetcher};
pub use harvest::{harvest_target, run_harvest, HarvestError, HarvestRequest, HarvestSummary};
pub use paginate::{
    Harvest, LogProgressSink, PaginationSettings, Paginator, ProgressSink, DEFAULT_MAX_PAGES,
};
pub use persist::{ensure_output_dir, write_atomically, PersistError};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput, PageEvent};
