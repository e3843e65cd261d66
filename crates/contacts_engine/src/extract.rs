use contacts_core::{cfemail_token_from_href, decode_cfemail, ExtractionSelectors, Record};
use engine_logging::{engine_debug, engine_warn};
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;

/// What to do with an entry that has a name but no decodable email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingEmailPolicy {
    /// Emit nothing for the entry.
    #[default]
    Skip,
    /// Emit the name with an empty email field.
    EmptyEmail,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageExtraction {
    pub records: Vec<Record>,
    pub entries_seen: usize,
    pub dropped_tokens: usize,
}

impl PageExtraction {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Site-specific lookup of person entries on one listing page.
pub trait PageExtractor: Send + Sync {
    /// Records in document order. An empty result ends pagination.
    fn extract(&self, html: &str) -> PageExtraction;

    /// Last page number advertised by the page's pagination, if any.
    fn last_page_hint(&self, _html: &str) -> Option<u32> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {role} selector {selector:?}: {message}")]
pub struct SelectorError {
    pub role: &'static str,
    pub selector: String,
    pub message: String,
}

/// Extractor driven by CSS selectors.
///
/// - `entry` finds each person block in the document
/// - `name` and `email` are matched inside the entry
/// - the email marker's token comes from `data-cfemail`, or from the
///   fragment of an email-protection `href`
#[derive(Debug, Clone)]
pub struct SelectorExtractor {
    entry: Selector,
    name: Selector,
    email: Selector,
    pagination: Option<Selector>,
    missing_email: MissingEmailPolicy,
}

impl SelectorExtractor {
    pub fn new(
        selectors: &ExtractionSelectors,
        missing_email: MissingEmailPolicy,
    ) -> Result<Self, SelectorError> {
        Ok(Self {
            entry: parse_selector("entry", &selectors.entry)?,
            name: parse_selector("name", &selectors.name)?,
            email: parse_selector("email", &selectors.email)?,
            pagination: selectors
                .pagination
                .as_deref()
                .map(|raw| parse_selector("pagination", raw))
                .transpose()?,
            missing_email,
        })
    }

    fn extract_entry(&self, entry: ElementRef, out: &mut PageExtraction) {
        let Some(name) = entry
            .select(&self.name)
            .map(element_text)
            .find(|text| !text.is_empty())
        else {
            engine_debug!("entry without a name skipped");
            return;
        };

        let mut emitted = 0usize;
        for marker in entry.select(&self.email) {
            let value = marker.value();
            let Some(token) = value
                .attr("data-cfemail")
                .map(str::trim)
                .or_else(|| value.attr("href").and_then(cfemail_token_from_href))
            else {
                continue;
            };
            match decode_cfemail(token) {
                Ok(email) => {
                    out.records.push(Record::new(name.clone(), email));
                    emitted += 1;
                }
                Err(err) => {
                    engine_warn!("dropping email token {:?} for {:?}: {}", token, name, err);
                    out.dropped_tokens += 1;
                }
            }
        }

        if emitted == 0 && self.missing_email == MissingEmailPolicy::EmptyEmail {
            out.records.push(Record::new(name, String::new()));
        }
    }
}

impl PageExtractor for SelectorExtractor {
    fn extract(&self, html: &str) -> PageExtraction {
        let doc = Html::parse_document(html);
        let mut out = PageExtraction::default();
        for entry in doc.select(&self.entry) {
            out.entries_seen += 1;
            self.extract_entry(entry, &mut out);
        }
        out
    }

    fn last_page_hint(&self, html: &str) -> Option<u32> {
        let selector = self.pagination.as_ref()?;
        let doc = Html::parse_document(html);
        doc.select(selector)
            .filter_map(|link| link.value().attr("href"))
            .filter_map(page_number_from_href)
            .max()
    }
}

fn parse_selector(role: &'static str, raw: &str) -> Result<Selector, SelectorError> {
    Selector::parse(raw).map_err(|err| SelectorError {
        role,
        selector: raw.to_string(),
        message: err.to_string(),
    })
}

/// Text content with whitespace runs collapsed.
fn element_text(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `...page=12` at the end of an href.
fn page_number_from_href(href: &str) -> Option<u32> {
    let (_, tail) = href.trim().rsplit_once("page=")?;
    if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    tail.parse().ok()
}
