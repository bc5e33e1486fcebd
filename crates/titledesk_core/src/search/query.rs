//! Logical clock for ordering search fetches.

/// One issued search, stamped with its position in the issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub seq: u64,
}

/// Monotonic sequence source; only the latest issued query may be applied.
#[derive(Debug, Default)]
pub struct QueryClock {
    latest: u64,
}

impl QueryClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, term: impl Into<String>) -> SearchQuery {
        self.latest += 1;
        SearchQuery {
            term: term.into(),
            seq: self.latest,
        }
    }

    pub fn is_latest(&self, query: &SearchQuery) -> bool {
        query.seq == self.latest
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }
}
