use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use contacts_core::{ExtractionSelectors, Record, StopReason, Target};
use contacts_engine::{
    FailureKind, FetchError, FetchMetadata, FetchOutput, MissingEmailPolicy, PageEvent,
    PageFetcher, PaginationSettings, Paginator, ProgressSink, SelectorExtractor,
};
use pretty_assertions::assert_eq;

const ALICE: &str = "422302362731366c212d2f";
const BOB: &str = "177557637264633974787a";

/// Serves canned pages by URL and records every request.
#[derive(Default)]
struct ScriptedFetcher {
    pages: HashMap<String, Result<String, FailureKind>>,
    fallback: Option<String>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    fn page(mut self, url: &str, html: String) -> Self {
        self.pages.insert(url.to_string(), Ok(html));
        self
    }

    fn failing(mut self, url: &str, kind: FailureKind) -> Self {
        self.pages.insert(url.to_string(), Err(kind));
        self
    }

    fn any_other_page(mut self, html: String) -> Self {
        self.fallback = Some(html);
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        let html = match self.pages.get(url) {
            Some(Ok(html)) => html.clone(),
            Some(Err(kind)) => return Err(FetchError::new(kind.clone(), "scripted").with_url(url)),
            None => match &self.fallback {
                Some(html) => html.clone(),
                None => return Err(FetchError::new(FailureKind::HttpStatus(404), "not scripted")),
            },
        };
        Ok(FetchOutput {
            metadata: FetchMetadata {
                original_url: url.to_string(),
                final_url: url.to_string(),
                status: 200,
                redirect_count: 0,
                content_type: Some("text/html; charset=utf-8".to_string()),
                byte_len: html.len() as u64,
            },
            bytes: html.into_bytes(),
        })
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<PageEvent>>,
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: PageEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn listing(people: &[(&str, &str)]) -> String {
    let entries: String = people
        .iter()
        .map(|(name, token)| {
            format!(
                r#"<div class="entry"><h2 class="title-divider"><span>{name}</span></h2>
                   <a class="__cf_email__" data-cfemail="{token}">[email protected]</a></div>"#
            )
        })
        .collect();
    format!("<html><body>{entries}</body></html>")
}

fn target() -> Target {
    Target::new("north.example.com", "/members?page={page}")
}

fn settings(start_page: u32, max_pages: u32) -> PaginationSettings {
    PaginationSettings {
        scheme: "https".to_string(),
        start_page,
        max_pages,
        request_delay: Duration::ZERO,
    }
}

fn extractor() -> SelectorExtractor {
    SelectorExtractor::new(&ExtractionSelectors::default(), MissingEmailPolicy::Skip).unwrap()
}

fn hinting_extractor() -> SelectorExtractor {
    let selectors = ExtractionSelectors {
        pagination: Some("ul.pagination li a".to_string()),
        ..ExtractionSelectors::default()
    };
    SelectorExtractor::new(&selectors, MissingEmailPolicy::Skip).unwrap()
}

fn windowed_pager(links: &[u32]) -> String {
    let items: String = links
        .iter()
        .map(|page| format!(r#"<li><a href="/members?page={page}">{page}</a></li>"#))
        .collect();
    format!(r#"<ul class="pagination">{items}<li><a href="/members?page=2">Next</a></li></ul>"#)
}

fn url(page: u32) -> String {
    format!("https://north.example.com/members?page={page}")
}

#[tokio::test]
async fn stops_at_first_empty_page() {
    engine_logging::initialize_for_tests();
    let fetcher = ScriptedFetcher::default()
        .page(&url(0), listing(&[("Alice", ALICE), ("Bob", BOB)]))
        .page(&url(1), listing(&[]))
        .page(&url(2), listing(&[("Never", ALICE)]));
    let extractor = extractor();
    let sink = RecordingSink::default();

    let harvest = Paginator::new(&fetcher, &extractor, settings(0, 50))
        .run(&target(), &sink)
        .await
        .unwrap();

    assert_eq!(
        harvest.records,
        vec![
            Record::new("Alice", "a@test.com"),
            Record::new("Bob", "b@test.com"),
        ]
    );
    assert_eq!(harvest.stop, StopReason::EmptyPage { page: 1 });
    assert_eq!(fetcher.requests(), vec![url(0), url(1)]);
    assert_eq!(harvest.progress.pages_fetched, 2);
    assert_eq!(harvest.progress.records_collected, 2);
}

#[tokio::test]
async fn page_bound_terminates_endless_listing() {
    let fetcher = ScriptedFetcher::default().any_other_page(listing(&[("Alice", ALICE)]));
    let extractor = extractor();
    let sink = RecordingSink::default();

    let harvest = Paginator::new(&fetcher, &extractor, settings(1, 5))
        .run(&target(), &sink)
        .await
        .unwrap();

    assert_eq!(harvest.stop, StopReason::MaxPages { limit: 5 });
    assert_eq!(fetcher.requests().len(), 5);
    assert_eq!(fetcher.requests().first(), Some(&url(1)));
    assert_eq!(fetcher.requests().last(), Some(&url(5)));
    assert_eq!(harvest.records.len(), 5);
}

#[tokio::test]
async fn zero_page_bound_still_fetches_one_page() {
    let fetcher = ScriptedFetcher::default().any_other_page(listing(&[("Alice", ALICE)]));
    let extractor = extractor();

    let harvest = Paginator::new(&fetcher, &extractor, settings(1, 0))
        .run(&target(), &RecordingSink::default())
        .await
        .unwrap();

    assert_eq!(fetcher.requests().len(), 1);
    assert_eq!(harvest.stop, StopReason::MaxPages { limit: 1 });
}

#[tokio::test]
async fn last_page_hint_lowers_the_bound() {
    let first = format!(
        r#"{}<ul class="pagination"><li><a href="/members?page=2">2</a></li><li><a href="/members?page=3">Last</a></li></ul>"#,
        listing(&[("Alice", ALICE)])
    );
    let fetcher = ScriptedFetcher::default()
        .page(&url(1), first)
        .any_other_page(listing(&[("Bob", BOB)]));
    let extractor = hinting_extractor();

    let harvest = Paginator::new(&fetcher, &extractor, settings(1, 100))
        .run(&target(), &RecordingSink::default())
        .await
        .unwrap();

    assert_eq!(fetcher.requests(), vec![url(1), url(2), url(3)]);
    assert_eq!(harvest.stop, StopReason::LastPageHint { last_page: 3 });
    assert_eq!(harvest.records.len(), 3);
}

#[tokio::test]
async fn hint_beyond_the_bound_is_ignored() {
    let first = format!(
        r#"{}<ul class="pagination"><li><a href="/members?page=90">Last</a></li></ul>"#,
        listing(&[("Alice", ALICE)])
    );
    let fetcher = ScriptedFetcher::default()
        .page(&url(1), first)
        .any_other_page(listing(&[("Bob", BOB)]));
    let extractor = hinting_extractor();

    let harvest = Paginator::new(&fetcher, &extractor, settings(1, 2))
        .run(&target(), &RecordingSink::default())
        .await
        .unwrap();

    assert_eq!(fetcher.requests().len(), 2);
    assert_eq!(harvest.stop, StopReason::MaxPages { limit: 2 });
}

#[tokio::test]
async fn windowed_pager_does_not_end_the_walk_by_default() {
    let mut fetcher = ScriptedFetcher::default().page(
        &url(1),
        format!("{}{}", listing(&[("Alice", ALICE)]), windowed_pager(&[2, 3, 4, 5])),
    );
    for page in 2..=8 {
        fetcher = fetcher.page(
            &url(page),
            format!("{}{}", listing(&[("Bob", BOB)]), windowed_pager(&[page + 1, page + 2])),
        );
    }
    let fetcher = fetcher.page(&url(9), listing(&[]));
    let extractor = extractor();

    let harvest = Paginator::new(&fetcher, &extractor, settings(1, 100))
        .run(&target(), &RecordingSink::default())
        .await
        .unwrap();

    assert_eq!(fetcher.requests().len(), 9);
    assert_eq!(harvest.records.len(), 8);
    assert_eq!(harvest.stop, StopReason::EmptyPage { page: 9 });
}

#[tokio::test]
async fn fetch_failure_aborts_the_run() {
    engine_logging::initialize_for_tests();
    let fetcher = ScriptedFetcher::default()
        .page(&url(1), listing(&[("Alice", ALICE)]))
        .failing(&url(2), FailureKind::HttpStatus(503))
        .page(&url(3), listing(&[("Bob", BOB)]));
    let extractor = extractor();

    let err = Paginator::new(&fetcher, &extractor, settings(1, 10))
        .run(&target(), &RecordingSink::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(503));
    assert_eq!(err.url.as_deref(), Some(url(2).as_str()));
    assert_eq!(fetcher.requests(), vec![url(1), url(2)]);
}

#[tokio::test]
async fn progress_is_reported_after_every_page() {
    let fetcher = ScriptedFetcher::default()
        .page(&url(1), listing(&[("Alice", ALICE), ("Bob", BOB)]))
        .page(&url(2), listing(&[("Carol", ALICE)]))
        .page(&url(3), listing(&[]));
    let extractor = extractor();
    let sink = RecordingSink::default();

    Paginator::new(&fetcher, &extractor, settings(1, 10))
        .run(&target(), &sink)
        .await
        .unwrap();

    let events = sink.events.lock().unwrap();
    let summary: Vec<_> = events
        .iter()
        .map(|e| {
            (
                e.page,
                e.records_on_page,
                e.progress.pages_fetched,
                e.progress.records_collected,
            )
        })
        .collect();
    assert_eq!(summary, vec![(1, 2, 1, 2), (2, 1, 2, 3), (3, 0, 3, 3)]);
    assert_eq!(events[0].url, url(1));
}

#[tokio::test]
async fn invalid_page_bytes_do_not_abort_the_walk() {
    struct PageWithStrayByte;

    #[async_trait::async_trait]
    impl PageFetcher for PageWithStrayByte {
        async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
            let mut bytes = if url.ends_with("page=1") {
                listing(&[("Alice", ALICE)]).into_bytes()
            } else {
                listing(&[]).into_bytes()
            };
            bytes.extend_from_slice(b"<!-- \xff -->");
            Ok(FetchOutput {
                metadata: FetchMetadata {
                    original_url: url.to_string(),
                    final_url: url.to_string(),
                    status: 200,
                    redirect_count: 0,
                    content_type: Some("text/html; charset=utf-8".to_string()),
                    byte_len: bytes.len() as u64,
                },
                bytes,
            })
        }
    }

    engine_logging::initialize_for_tests();
    let extractor = extractor();
    let harvest = Paginator::new(&PageWithStrayByte, &extractor, settings(1, 10))
        .run(&target(), &RecordingSink::default())
        .await
        .unwrap();
    assert_eq!(harvest.records, vec![Record::new("Alice", "a@test.com")]);
    assert_eq!(harvest.stop, StopReason::EmptyPage { page: 2 });
}
