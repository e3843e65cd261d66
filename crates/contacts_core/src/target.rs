use url::Url;

/// Placeholder replaced by the page number in a path template.
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// CSS selectors describing one site's listing markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionSelectors {
    /// One repeating unit per person.
    pub entry: String,
    /// Name element, relative to the entry.
    pub name: String,
    /// Obfuscated email marker, relative to the entry.
    pub email: String,
    /// Pagination links whose highest `page=N` names the final page. Only
    /// trustworthy for pagers that always link the last page, so unset by
    /// default.
    pub pagination: Option<String>,
}

impl Default for ExtractionSelectors {
    fn default() -> Self {
        Self {
            entry: "div.entry".to_string(),
            name: "h2.title-divider > span".to_string(),
            email: ".__cf_email__".to_string(),
            pagination: None,
        }
    }
}

/// One configured subdomain and its listing path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: Option<String>,
    pub subdomain: String,
    pub path_template: String,
    pub selectors: ExtractionSelectors,
}

impl Target {
    pub fn new(subdomain: impl Into<String>, path_template: impl Into<String>) -> Self {
        Self {
            name: None,
            subdomain: subdomain.into(),
            path_template: path_template.into(),
            selectors: ExtractionSelectors::default(),
        }
    }

    /// Display label: the configured name, or the subdomain.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.subdomain)
    }

    pub fn has_page_placeholder(&self) -> bool {
        self.path_template.contains(PAGE_PLACEHOLDER)
    }

    /// `{scheme}://{subdomain}{path}` with the page number substituted.
    pub fn page_url(&self, scheme: &str, page: u32) -> Result<Url, url::ParseError> {
        let subdomain = self.subdomain.trim().trim_end_matches('/');
        let path = self
            .path_template
            .trim()
            .replace(PAGE_PLACEHOLDER, &page.to_string());
        let separator = if path.starts_with('/') || path.is_empty() {
            ""
        } else {
            "/"
        };
        Url::parse(&format!("{scheme}://{subdomain}{separator}{path}"))
    }
}
