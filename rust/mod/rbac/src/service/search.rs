use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::debug;

use openerp_core::{ListParams, ListResult, ServiceError};

use crate::backend::RbacBackend;
use crate::model::{Candidate, Id};
use crate::service::RbacError;

/// Result of one candidate search call.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome<T = ListResult<Candidate>> {
    /// The response of the most recent search.
    Fresh(T),
    /// A newer search started while this one was waiting or in flight;
    /// the response (or error) was discarded.
    Superseded,
}

impl<T> SearchOutcome<T> {
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> SearchOutcome<U> {
        match self {
            SearchOutcome::Fresh(v) => SearchOutcome::Fresh(f(v)),
            SearchOutcome::Superseded => SearchOutcome::Superseded,
        }
    }

    pub fn fresh(self) -> Option<T> {
        match self {
            SearchOutcome::Fresh(v) => Some(v),
            SearchOutcome::Superseded => None,
        }
    }
}

/// Debounced, latest-wins candidate lookup for one picker.
///
/// Every call takes a ticket from a monotonic sequence, waits out the
/// debounce period, and then only proceeds (and only delivers its response)
/// while its ticket is still the newest. Calls are expected to overlap: the
/// screen starts one per keystroke and drops nothing itself.
#[derive(Debug)]
pub struct CandidateSearch {
    debounce: Duration,
    latest: AtomicU64,
}

impl CandidateSearch {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            latest: AtomicU64::new(0),
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Invalidate every search in flight.
    pub fn cancel(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }

    /// Debounce, run `fetch`, and keep its result only if no newer call
    /// started in the meantime.
    pub async fn run<T, F, Fut>(&self, fetch: F) -> Result<SearchOutcome<T>, RbacError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let ticket = self.begin();
        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
        }
        if !self.is_current(ticket) {
            debug!(ticket, "search superseded during debounce");
            return Ok(SearchOutcome::Superseded);
        }

        let result = fetch().await;
        if !self.is_current(ticket) {
            debug!(ticket, "discarding stale search response");
            return Ok(SearchOutcome::Superseded);
        }

        result.map(SearchOutcome::Fresh).map_err(RbacError::Search)
    }

    /// Search addable users. Anyone in `exclude` (the role's current users)
    /// is removed from the page even if the backend returned them.
    pub async fn search_users(
        &self,
        backend: &dyn RbacBackend,
        keyword: &str,
        params: ListParams,
        exclude: BTreeSet<Id>,
    ) -> Result<SearchOutcome, RbacError> {
        let hint: Vec<Id> = exclude.iter().copied().collect();
        let keyword = keyword.trim();
        let outcome = self
            .run(|| backend.search_candidate_users(keyword, &params, &hint))
            .await?;
        Ok(outcome.map(|page| exclude_granted(page, &exclude)))
    }

    /// Search addable interfaces of one data-resource service. The backend
    /// returns every match; exclusion and paging happen here.
    pub async fn search_interfaces(
        &self,
        backend: &dyn RbacBackend,
        drs_id: Id,
        keyword: &str,
        params: ListParams,
        exclude: BTreeSet<Id>,
    ) -> Result<SearchOutcome, RbacError> {
        let keyword = keyword.trim();
        let outcome = self
            .run(|| backend.search_candidate_interfaces(drs_id, keyword))
            .await?;
        Ok(outcome.map(|items| {
            let kept: Vec<Candidate> = items
                .into_iter()
                .filter(|c| !exclude.contains(&c.id))
                .collect();
            ListResult {
                total: kept.len(),
                items: params.apply(&kept),
            }
        }))
    }
}

/// Drop already-granted ids from a server page. `total` is reduced by the
/// number of items dropped from this page; it stays an estimate when the
/// server ignored the exclusion on other pages too.
pub fn exclude_granted(page: ListResult<Candidate>, exclude: &BTreeSet<Id>) -> ListResult<Candidate> {
    let before = page.items.len();
    let items: Vec<Candidate> = page
        .items
        .into_iter()
        .filter(|c| !exclude.contains(&c.id))
        .collect();
    let dropped = before - items.len();
    ListResult {
        total: page.total.saturating_sub(dropped),
        items,
    }
}

/// Candidates picked in a search dialog but not yet confirmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingSelection {
    picked: BTreeMap<Id, Candidate>,
}

impl PendingSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, candidate: Candidate) {
        self.picked.insert(candidate.id, candidate);
    }

    pub fn deselect(&mut self, id: Id) -> bool {
        self.picked.remove(&id).is_some()
    }

    /// Returns `true` if the candidate is selected afterwards.
    pub fn toggle(&mut self, candidate: Candidate) -> bool {
        if self.deselect(candidate.id) {
            false
        } else {
            self.select(candidate);
            true
        }
    }

    pub fn contains(&self, id: Id) -> bool {
        self.picked.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.picked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picked.is_empty()
    }

    pub fn candidates(&self) -> impl Iterator<Item = &Candidate> {
        self.picked.values()
    }

    /// Empty the buffer, returning what was picked (ordered by id).
    pub fn take(&mut self) -> Vec<Candidate> {
        std::mem::take(&mut self.picked).into_values().collect()
    }

    /// Dialog dismissed without confirming.
    pub fn cancel(&mut self) {
        self.picked.clear();
    }
}
