//! Search driver: debounced input, ordered fetches, published view.
//!
//! # Responsibility
//! - Turn raw keystrokes into at most one fetch per quiet period.
//! - Refresh the shared title collection from the latest fetch only.
//! - Publish a [`SearchView`] whenever the term, results or status change.
//!
//! # Invariants
//! - In-flight fetches are never aborted; their stale responses are dropped.
//! - A listing issued before a mutation refresh never overwrites that refresh.
//! - An empty term publishes an empty view and issues no fetch.
//! - Title collection changes re-run highlighting for the current term.

use crate::config::ClientConfig;
use crate::debounce::Debouncer;
use crate::model::title::TitleRecord;
use crate::repo::collection::{ListingTicket, TitleCollection, TitleSnapshot};
use crate::repo::title_repo::{RepoResult, TitleRepository};
use crate::search::highlight::{filter_and_highlight, HighlightedTitle};
use crate::search::query::{QueryClock, SearchQuery};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tokio::task::JoinHandle;

type FetchResponse = (SearchQuery, ListingTicket, RepoResult<Vec<TitleRecord>>);

/// What the result panel should currently render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchView {
    /// Term of the latest issued query.
    pub term: String,
    pub seq: u64,
    pub results: Vec<HighlightedTitle>,
    /// A fetch for `seq` is still outstanding.
    pub loading: bool,
    /// Message of the latest failed fetch, cleared by the next success.
    pub error: Option<String>,
}

impl SearchView {
    /// The panel is hidden for an empty term or when nothing matched.
    pub fn is_visible(&self) -> bool {
        !self.term.is_empty() && !self.results.is_empty()
    }
}

/// Handle to a running search driver. Dropping it stops the driver.
pub struct SearchController {
    debouncer: Mutex<Debouncer<String>>,
    view: watch::Receiver<SearchView>,
    driver: JoinHandle<()>,
}

impl SearchController {
    /// Starts the driver task on the ambient tokio runtime.
    pub fn spawn<R>(repo: Arc<R>, titles: TitleCollection, config: &ClientConfig) -> Self
    where
        R: TitleRepository + ?Sized + 'static,
    {
        let (debouncer, fired) = Debouncer::new(config.debounce());
        let (view_tx, view_rx) = watch::channel(SearchView::default());
        let (responses_tx, responses_rx) = unbounded_channel();
        let changes = titles.subscribe();

        let driver = SearchDriver {
            repo,
            titles,
            max_results: config.max_results,
            clock: QueryClock::new(),
            view: view_tx,
            responses: responses_tx,
        };
        let driver = tokio::spawn(driver.run(fired, responses_rx, changes));

        Self {
            debouncer: Mutex::new(debouncer),
            view: view_rx,
            driver,
        }
    }

    /// Records a keystroke; the fetch fires once input is quiet.
    pub fn input(&self, term: impl Into<String>) {
        self.debouncer.lock().trigger(term.into());
    }

    /// Drops a pending keystroke. Returns whether one was waiting.
    pub fn cancel(&self) -> bool {
        self.debouncer.lock().cancel()
    }

    pub fn view(&self) -> SearchView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchView> {
        self.view.clone()
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

struct SearchDriver<R: ?Sized> {
    repo: Arc<R>,
    titles: TitleCollection,
    max_results: usize,
    clock: QueryClock,
    view: watch::Sender<SearchView>,
    responses: UnboundedSender<FetchResponse>,
}

impl<R> SearchDriver<R>
where
    R: TitleRepository + ?Sized + 'static,
{
    async fn run(
        mut self,
        mut fired: UnboundedReceiver<String>,
        mut responses: UnboundedReceiver<FetchResponse>,
        mut changes: watch::Receiver<TitleSnapshot>,
    ) {
        loop {
            tokio::select! {
                term = fired.recv() => match term {
                    Some(term) => self.on_term(term),
                    None => break,
                },
                Some((query, ticket, result)) = responses.recv() => {
                    self.on_response(query, ticket, result, &mut changes);
                }
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.on_titles_changed(&mut changes);
                }
            }
        }
        debug!("event=search_driver module=search status=stopped");
    }

    fn on_term(&mut self, term: String) {
        let query = self.clock.issue(term);

        if query.term.is_empty() {
            self.view.send_replace(SearchView {
                seq: query.seq,
                ..SearchView::default()
            });
            debug!(
                "event=search_query module=search status=skip seq={} reason=empty_term",
                query.seq
            );
            return;
        }

        let results = filter_and_highlight(&self.titles.records(), &query.term, self.max_results);
        self.view.send_replace(SearchView {
            term: query.term.clone(),
            seq: query.seq,
            results,
            loading: true,
            error: None,
        });

        debug!(
            "event=search_query module=search status=start seq={} term_len={}",
            query.seq,
            query.term.chars().count()
        );
        let ticket = self.titles.issue_listing();
        let repo = Arc::clone(&self.repo);
        let responses = self.responses.clone();
        tokio::spawn(async move {
            let started_at = Instant::now();
            let result = repo.list().await;
            debug!(
                "event=search_fetch module=search status={} seq={} duration_ms={}",
                if result.is_ok() { "ok" } else { "error" },
                query.seq,
                started_at.elapsed().as_millis()
            );
            // Driver gone means the controller was dropped.
            let _ = responses.send((query, ticket, result));
        });
    }

    fn on_response(
        &mut self,
        query: SearchQuery,
        ticket: ListingTicket,
        result: RepoResult<Vec<TitleRecord>>,
        changes: &mut watch::Receiver<TitleSnapshot>,
    ) {
        if !self.clock.is_latest(&query) {
            debug!(
                "event=search_response module=search status=stale seq={} latest={}",
                query.seq,
                self.clock.latest()
            );
            return;
        }

        match result {
            Ok(records) => {
                // A superseded listing still ends loading; results come from
                // whatever the collection holds now.
                let applied = self.titles.apply_listing(ticket, records);
                let records = changes.borrow_and_update().records.clone();
                let results = filter_and_highlight(&records, &query.term, self.max_results);
                info!(
                    "event=search_response module=search status=ok seq={} applied={} total={} shown={}",
                    query.seq,
                    applied,
                    records.len(),
                    results.len()
                );
                self.view.send_modify(|view| {
                    view.results = results;
                    view.loading = false;
                    view.error = None;
                });
            }
            Err(err) => {
                warn!(
                    "event=search_response module=search status=error seq={} error={}",
                    query.seq, err
                );
                self.view.send_modify(|view| {
                    view.loading = false;
                    view.error = Some(err.to_string());
                });
            }
        }
    }

    fn on_titles_changed(&mut self, changes: &mut watch::Receiver<TitleSnapshot>) {
        let records = changes.borrow_and_update().records.clone();
        let term = self.view.borrow().term.clone();
        if term.is_empty() {
            return;
        }

        let results = filter_and_highlight(&records, &term, self.max_results);
        self.view.send_if_modified(|view| {
            if view.results == results {
                return false;
            }
            view.results = results;
            true
        });
    }
}
