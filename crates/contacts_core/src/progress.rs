/// Cumulative counters for one run, carried by the pagination driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunProgress {
    pub pages_fetched: u32,
    pub records_collected: usize,
}

impl RunProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one fetched page and the records it produced.
    pub fn record_page(&mut self, records_on_page: usize) {
        self.pages_fetched += 1;
        self.records_collected += records_on_page;
    }
}

/// Why pagination ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A page produced no records.
    EmptyPage { page: u32 },
    /// The configured page bound was reached.
    MaxPages { limit: u32 },
    /// The last page advertised by the site's pagination was processed.
    LastPageHint { last_page: u32 },
}
