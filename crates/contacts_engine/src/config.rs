use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use contacts_core::{ExtractionSelectors, Target, PAGE_PLACEHOLDER};
use engine_logging::engine_info;
use serde::Deserialize;
use thiserror::Error;

use crate::extract::{MissingEmailPolicy, SelectorError, SelectorExtractor};
use crate::fetch::FetchSettings;
use crate::paginate::PaginationSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("configuration lists no targets")]
    NoTargets,
    #[error("target {index}: {message}")]
    InvalidTarget { index: usize, message: String },
    #[error("target {index}: {source}")]
    InvalidSelector {
        index: usize,
        #[source]
        source: SelectorError,
    },
    #[error("invalid setting: {0}")]
    InvalidSetting(String),
    #[error("invalid index: {index}. Must be between 0 and {}", .len.saturating_sub(1))]
    IndexOutOfRange { index: i64, len: usize },
}

/// Run-wide settings resolved from the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HarvestSettings {
    pub pagination: PaginationSettings,
    pub fetch: FetchSettings,
    pub missing_email: MissingEmailPolicy,
}

#[derive(Debug, Clone)]
pub struct HarvestConfig {
    settings: HarvestSettings,
    targets: Vec<Target>,
}

impl HarvestConfig {
    pub fn settings(&self) -> &HarvestSettings {
        &self.settings
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Target at `index`, counting from zero in file order.
    pub fn target(&self, index: i64) -> Result<&Target, ConfigError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.targets.get(i))
            .ok_or(ConfigError::IndexOutOfRange {
                index,
                len: self.targets.len(),
            })
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    scheme: Option<String>,
    #[serde(default)]
    start_page: Option<u32>,
    #[serde(default)]
    max_pages: Option<u32>,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
    #[serde(default)]
    connect_timeout_secs: Option<u64>,
    #[serde(default)]
    request_delay_ms: Option<u64>,
    #[serde(default)]
    max_bytes: Option<u64>,
    #[serde(default)]
    user_agent: Option<String>,
    #[serde(default)]
    missing_email: MissingEmailPolicy,
    /// Host for targets that do not name their own.
    #[serde(default)]
    subdomain: Option<String>,
    #[serde(alias = "data")]
    targets: Vec<RawTarget>,
}

#[derive(Debug, Deserialize)]
struct RawTarget {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    subdomain: Option<String>,
    #[serde(alias = "path")]
    path_template: String,
    #[serde(default)]
    selectors: RawSelectors,
}

#[derive(Debug, Deserialize, Default)]
struct RawSelectors {
    entry: Option<String>,
    name: Option<String>,
    email: Option<String>,
    pagination: Option<String>,
}

impl RawSelectors {
    fn resolve(self) -> ExtractionSelectors {
        let defaults = ExtractionSelectors::default();
        ExtractionSelectors {
            entry: self.entry.unwrap_or(defaults.entry),
            name: self.name.unwrap_or(defaults.name),
            email: self.email.unwrap_or(defaults.email),
            // An empty string switches the hint off.
            pagination: match self.pagination {
                Some(raw) if raw.trim().is_empty() => None,
                Some(raw) => Some(raw),
                None => defaults.pagination,
            },
        }
    }
}

/// Read and validate the JSON configuration file.
pub fn load_config(path: &Path) -> Result<HarvestConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&text)?;
    engine_info!(
        "Loaded {} targets from {:?}",
        config.targets.len(),
        path
    );
    Ok(config)
}

pub fn parse_config(text: &str) -> Result<HarvestConfig, ConfigError> {
    let raw: RawConfig = serde_json::from_str(text)?;
    let settings = resolve_settings(&raw)?;

    if raw.targets.is_empty() {
        return Err(ConfigError::NoTargets);
    }
    let targets = raw
        .targets
        .into_iter()
        .enumerate()
        .map(|(index, target)| {
            resolve_target(index, target, raw.subdomain.as_deref(), &settings)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(HarvestConfig { settings, targets })
}

fn resolve_settings(raw: &RawConfig) -> Result<HarvestSettings, ConfigError> {
    let mut pagination = PaginationSettings::default();
    let mut fetch = FetchSettings::default();

    if let Some(scheme) = raw.scheme.as_deref() {
        let scheme = scheme.trim().to_ascii_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(ConfigError::InvalidSetting(format!(
                "scheme must be http or https, got {scheme:?}"
            )));
        }
        pagination.scheme = scheme;
    }
    if let Some(start_page) = raw.start_page {
        pagination.start_page = start_page;
    }
    match raw.max_pages {
        Some(0) => {
            return Err(ConfigError::InvalidSetting(
                "max_pages must be at least 1".to_string(),
            ))
        }
        Some(max_pages) => pagination.max_pages = max_pages,
        None => {}
    }
    if let Some(ms) = raw.request_delay_ms {
        pagination.request_delay = Duration::from_millis(ms);
    }

    if let Some(secs) = raw.request_timeout_secs {
        fetch.request_timeout = positive_secs("request_timeout_secs", secs)?;
    }
    if let Some(secs) = raw.connect_timeout_secs {
        fetch.connect_timeout = positive_secs("connect_timeout_secs", secs)?;
    }
    if let Some(max_bytes) = raw.max_bytes {
        fetch.max_bytes = max_bytes;
    }
    if let Some(agent) = raw.user_agent.as_deref() {
        fetch.user_agent = agent.to_string();
    }

    Ok(HarvestSettings {
        pagination,
        fetch,
        missing_email: raw.missing_email,
    })
}

fn positive_secs(field: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidSetting(format!(
            "{field} must be at least 1"
        )));
    }
    Ok(Duration::from_secs(secs))
}

fn resolve_target(
    index: usize,
    raw: RawTarget,
    default_subdomain: Option<&str>,
    settings: &HarvestSettings,
) -> Result<Target, ConfigError> {
    let subdomain = raw
        .subdomain
        .as_deref()
        .or(default_subdomain)
        .unwrap_or_default()
        .trim()
        .to_string();
    let target = Target {
        name: raw.name.filter(|name| !name.trim().is_empty()),
        subdomain,
        path_template: with_page_placeholder(raw.path_template.trim()),
        selectors: raw.selectors.resolve(),
    };

    if target.subdomain.is_empty() {
        return Err(ConfigError::InvalidTarget {
            index,
            message: "no subdomain on the target or at the top level".to_string(),
        });
    }
    target
        .page_url(&settings.pagination.scheme, settings.pagination.start_page)
        .map_err(|err| ConfigError::InvalidTarget {
            index,
            message: format!("cannot build page url: {err}"),
        })?;
    SelectorExtractor::new(&target.selectors, settings.missing_email)
        .map_err(|source| ConfigError::InvalidSelector { index, source })?;

    Ok(target)
}

/// Listing paths without `{page}` get the page as a trailing query parameter.
fn with_page_placeholder(path: &str) -> String {
    if path.contains(PAGE_PLACEHOLDER) {
        return path.to_string();
    }
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}page={PAGE_PLACEHOLDER}")
}
