use std::time::Duration;

use contacts_core::{ResultSet, RunProgress, StopReason, Target};
use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::charset::decode_page;
use crate::extract::PageExtractor;
use crate::fetch::PageFetcher;
use crate::{FailureKind, FetchError, PageEvent};

/// Default bound on fetched pages when configuration names none.
pub const DEFAULT_MAX_PAGES: u32 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationSettings {
    pub scheme: String,
    pub start_page: u32,
    /// Upper bound on fetched pages. Always at least 1.
    pub max_pages: u32,
    /// Pause between consecutive page requests.
    pub request_delay: Duration,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            start_page: 1,
            max_pages: DEFAULT_MAX_PAGES,
            request_delay: Duration::from_millis(1000),
        }
    }
}

/// Receives a report after each processed page.
pub trait ProgressSink {
    fn emit(&self, event: PageEvent);
}

/// Reports progress through the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn emit(&self, event: PageEvent) {
        engine_info!(
            "page {}: {} records ({} pages, {} records so far)",
            event.page,
            event.records_on_page,
            event.progress.pages_fetched,
            event.progress.records_collected
        );
    }
}

/// Everything collected for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Harvest {
    pub records: ResultSet,
    pub progress: RunProgress,
    pub stop: StopReason,
}

/// Sequential page walker: fetch, decode, extract, accumulate.
pub struct Paginator<'a> {
    fetcher: &'a dyn PageFetcher,
    extractor: &'a dyn PageExtractor,
    settings: PaginationSettings,
}

impl<'a> Paginator<'a> {
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        extractor: &'a dyn PageExtractor,
        settings: PaginationSettings,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            settings,
        }
    }

    /// Walk the target's pages from `start_page` until a page yields no
    /// records, the page bound is hit, or the last advertised page is done.
    ///
    /// Any fetch failure aborts the walk; records gathered so far are dropped
    /// with it.
    pub async fn run(
        &self,
        target: &Target,
        sink: &dyn ProgressSink,
    ) -> Result<Harvest, FetchError> {
        let max_pages = self.settings.max_pages.max(1);
        let mut page_limit = max_pages;
        let mut last_page_hint = None;
        let mut records = ResultSet::new();
        let mut progress = RunProgress::new();
        let mut page = self.settings.start_page;

        let stop = loop {
            if progress.pages_fetched >= page_limit {
                break match last_page_hint {
                    Some(last_page) => StopReason::LastPageHint { last_page },
                    None => StopReason::MaxPages { limit: max_pages },
                };
            }
            if progress.pages_fetched > 0 && !self.settings.request_delay.is_zero() {
                tokio::time::sleep(self.settings.request_delay).await;
            }

            let url = target
                .page_url(&self.settings.scheme, page)
                .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
            let output = self.fetcher.fetch(url.as_str()).await?;
            let decoded = decode_page(&output.bytes, output.metadata.content_type.as_deref());
            if decoded.had_errors {
                engine_warn!(
                    "page {}: bytes invalid for {} were replaced ({})",
                    page,
                    decoded.encoding,
                    url
                );
            }
            let html = decoded.text;

            if progress.pages_fetched == 0 {
                if let Some((last_page, count)) = self.hinted_page_count(&html) {
                    if count < page_limit {
                        engine_debug!("pagination advertises {} as the last page", last_page);
                        last_page_hint = Some(last_page);
                        page_limit = count;
                    }
                }
            }

            let extraction = self.extractor.extract(&html);
            engine_debug!(
                "page {}: {} entries, {} records, {} undecodable tokens",
                page,
                extraction.entries_seen,
                extraction.records.len(),
                extraction.dropped_tokens
            );
            let records_on_page = extraction.records.len();
            progress.record_page(records_on_page);
            records.extend(extraction.records);
            sink.emit(PageEvent {
                page,
                url: url.to_string(),
                records_on_page,
                progress,
            });

            if records_on_page == 0 {
                break StopReason::EmptyPage { page };
            }
            page = match page.checked_add(1) {
                Some(next) => next,
                None => break StopReason::MaxPages { limit: max_pages },
            };
        };

        engine_info!(
            "{}: stopped after {} pages with {} records ({:?})",
            target.label(),
            progress.pages_fetched,
            progress.records_collected,
            stop
        );
        Ok(Harvest {
            records,
            progress,
            stop,
        })
    }

    /// `(last_page, pages_to_fetch)` from the first page's pagination links.
    fn hinted_page_count(&self, html: &str) -> Option<(u32, u32)> {
        let last_page = self.extractor.last_page_hint(html)?;
        let count = last_page.checked_sub(self.settings.start_page)?.checked_add(1)?;
        Some((last_page, count))
    }
}
