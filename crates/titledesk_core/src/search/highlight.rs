//! Literal, case-insensitive filtering with highlight spans.

use crate::model::title::TitleRecord;
use log::warn;
use regex::{Regex, RegexBuilder};
use std::ops::Range;

/// One visible search result split for highlight rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightedTitle {
    pub record: TitleRecord,
    /// Byte range of the first match inside `record.title`.
    pub span: Range<usize>,
}

impl HighlightedTitle {
    pub fn before(&self) -> &str {
        &self.record.title[..self.span.start]
    }

    pub fn matched(&self) -> &str {
        &self.record.title[self.span.clone()]
    }

    pub fn after(&self) -> &str {
        &self.record.title[self.span.end..]
    }

    /// Character offset of the match start, for renderers that index by char.
    pub fn char_offset(&self) -> usize {
        self.before().chars().count()
    }
}

/// Filters `records` by `term` and returns at most `max_results` hits.
///
/// An empty term yields no results so the result panel stays hidden. Pattern
/// metacharacters in `term` are matched literally.
pub fn filter_and_highlight(
    records: &[TitleRecord],
    term: &str,
    max_results: usize,
) -> Vec<HighlightedTitle> {
    if term.is_empty() || max_results == 0 {
        return Vec::new();
    }

    let Some(matcher) = literal_matcher(term) else {
        return Vec::new();
    };

    records
        .iter()
        .filter_map(|record| {
            matcher.find(&record.title).map(|found| HighlightedTitle {
                record: record.clone(),
                span: found.range(),
            })
        })
        .take(max_results)
        .collect()
}

fn literal_matcher(term: &str) -> Option<Regex> {
    match RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
    {
        Ok(matcher) => Some(matcher),
        Err(err) => {
            warn!(
                "event=search_matcher module=search status=error term_chars={} error={}",
                term.chars().count(),
                err
            );
            None
        }
    }
}
