//! Shared title snapshot.
//!
//! # Responsibility
//! - Hold the client's read-through copy of the catalog.
//! - Track optimistic removals so they can be committed or rolled back.
//!
//! # Invariants
//! - Only listings and removals change the snapshot.
//! - A listing is applied only if no later-issued listing was applied first.
//! - Listings never resurrect a record whose removal is pending or committed.
//! - An id has at most one pending removal.
//! - A removal that is dropped without being settled rolls back.

use crate::model::title::{TitleId, TitleRecord};
use log::debug;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::watch;

/// Point-in-time view of the collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleSnapshot {
    /// `false` until the first successful refresh.
    pub loaded: bool,
    /// Bumped on every change.
    pub revision: u64,
    pub records: Vec<TitleRecord>,
    pub pending_removals: BTreeSet<TitleId>,
    /// Ids whose delete the catalog acknowledged. Ids are never reused.
    pub deleted: BTreeSet<TitleId>,
    /// Ticket of the listing currently shown; 0 before the first one.
    pub listing: u64,
    issued_listings: u64,
}

/// Issue-order stamp of one catalog listing.
///
/// Take the ticket before the `list()` call goes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ListingTicket(u64);

impl ListingTicket {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Cloneable handle to one shared title snapshot.
#[derive(Clone)]
pub struct TitleCollection {
    state: Arc<watch::Sender<TitleSnapshot>>,
}

impl Default for TitleCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl TitleCollection {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(TitleSnapshot::default());
        Self {
            state: Arc::new(sender),
        }
    }

    pub fn snapshot(&self) -> TitleSnapshot {
        self.state.borrow().clone()
    }

    pub fn records(&self) -> Vec<TitleRecord> {
        self.state.borrow().records.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.state.borrow().loaded
    }

    pub fn contains(&self, id: &str) -> bool {
        self.state.borrow().records.iter().any(|record| record.id == id)
    }

    pub fn is_removal_pending(&self, id: &str) -> bool {
        self.state.borrow().pending_removals.contains(id)
    }

    /// Receiver notified after every change.
    pub fn subscribe(&self) -> watch::Receiver<TitleSnapshot> {
        self.state.subscribe()
    }

    /// Stamps a listing about to be requested.
    pub fn issue_listing(&self) -> ListingTicket {
        let mut ticket = ListingTicket(0);
        self.state.send_if_modified(|snapshot| {
            snapshot.issued_listings += 1;
            ticket = ListingTicket(snapshot.issued_listings);
            false
        });
        ticket
    }

    /// Applies a server listing unless a later-issued one is already shown.
    ///
    /// Records whose removal is pending or committed are left out. Returns
    /// whether the listing was applied.
    pub fn apply_listing(&self, ticket: ListingTicket, records: Vec<TitleRecord>) -> bool {
        let applied = self.state.send_if_modified(|snapshot| {
            if ticket.0 <= snapshot.listing {
                return false;
            }
            let pending = &snapshot.pending_removals;
            let deleted = &snapshot.deleted;
            snapshot.records = records
                .into_iter()
                .filter(|record| !pending.contains(&record.id) && !deleted.contains(&record.id))
                .collect();
            snapshot.listing = ticket.0;
            snapshot.loaded = true;
            snapshot.revision += 1;
            true
        });
        if !applied {
            debug!(
                "event=title_listing module=collection status=skip reason=superseded ticket={}",
                ticket.0
            );
        }
        applied
    }

    /// Applies `records` as the newest listing.
    pub fn replace_all(&self, records: Vec<TitleRecord>) {
        let ticket = self.issue_listing();
        self.apply_listing(ticket, records);
    }

    /// Optimistically removes `id` from the snapshot.
    ///
    /// Returns `None` when a removal for `id` is already pending.
    pub fn begin_removal(&self, id: &str) -> Option<Removal> {
        let mut removed = None;
        let started = self.state.send_if_modified(|snapshot| {
            if !snapshot.pending_removals.insert(id.to_string()) {
                return false;
            }
            if let Some(index) = snapshot.records.iter().position(|record| record.id == id) {
                removed = Some((index, snapshot.records.remove(index)));
            }
            snapshot.revision += 1;
            true
        });

        if !started {
            return None;
        }
        debug!(
            "event=title_removal module=collection status=start present={}",
            removed.is_some()
        );
        Some(Removal {
            titles: self.clone(),
            id: id.to_string(),
            removed,
            settled: false,
        })
    }

    fn settle(&self, id: &str, committed: bool, restore: Option<(usize, TitleRecord)>) {
        self.state.send_modify(|snapshot| {
            snapshot.pending_removals.remove(id);
            if committed {
                snapshot.deleted.insert(id.to_string());
            }
            if let Some((index, record)) = restore {
                if !snapshot.records.iter().any(|existing| existing.id == record.id) {
                    let index = index.min(snapshot.records.len());
                    snapshot.records.insert(index, record);
                }
            }
            snapshot.revision += 1;
        });
    }
}

/// In-flight optimistic removal of one title.
pub struct Removal {
    titles: TitleCollection,
    id: TitleId,
    removed: Option<(usize, TitleRecord)>,
    settled: bool,
}

impl Removal {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The record taken out of the snapshot, if it was present.
    pub fn record(&self) -> Option<&TitleRecord> {
        self.removed.as_ref().map(|(_, record)| record)
    }

    /// Keeps the record removed.
    pub fn commit(mut self) {
        self.settled = true;
        self.titles.settle(&self.id, true, None);
        debug!("event=title_removal module=collection status=ok");
    }

    /// Puts the record back at its previous position.
    pub fn rollback(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        self.settled = true;
        let removed = self.removed.take();
        self.titles.settle(&self.id, false, removed);
        debug!("event=title_removal module=collection status=rollback");
    }
}

impl Drop for Removal {
    fn drop(&mut self) {
        if !self.settled {
            self.restore();
        }
    }
}
