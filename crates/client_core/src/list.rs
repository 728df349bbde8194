//! Paginated list of one remote collection.
//!
//! The controller owns the page coordinates, the records of the current page and a loading
//! flag. Every fetch is tagged by a [`RequestSequencer`]; a response is applied only when its
//! token is still the latest one issued, so an abandoned page can never overwrite a newer one.

use std::sync::Arc;

use shared::{
    domain::{Page, Record},
    error::ErrorKind,
    protocol::ListResponse,
};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};

use crate::{
    api::ResourceApi,
    notify::{Notification, Notifier},
    sequencer::{RequestSequencer, RequestToken},
};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_PAGE_WINDOW: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot {
    pub page: Page,
    pub records: Vec<Record>,
    pub loading: bool,
    /// Bumped on every state change.
    pub revision: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// Superseded by a later request; nothing was touched.
    Stale,
    Failed(ErrorKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNavigation {
    pub pages: Vec<u32>,
    pub current: u32,
    pub first: bool,
    pub prev: bool,
    pub next: bool,
    pub last: bool,
}

struct ListState {
    page: Page,
    records: Vec<Record>,
    loading: bool,
    revision: u64,
}

impl ListState {
    fn snapshot(&self) -> ListSnapshot {
        ListSnapshot {
            page: self.page,
            records: self.records.clone(),
            loading: self.loading,
            revision: self.revision,
        }
    }
}

pub struct PaginatedListController {
    collection: String,
    api: Arc<dyn ResourceApi>,
    notifier: Arc<dyn Notifier>,
    sequencer: RequestSequencer,
    window: u32,
    inner: Mutex<ListState>,
    snapshots: watch::Sender<ListSnapshot>,
}

impl PaginatedListController {
    pub fn new(
        collection: impl Into<String>,
        page_size: u32,
        api: Arc<dyn ResourceApi>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let state = ListState {
            page: Page::first(page_size),
            records: Vec::new(),
            loading: false,
            revision: 0,
        };
        let (snapshots, _rx) = watch::channel(state.snapshot());
        Self {
            collection: collection.into(),
            api,
            notifier,
            sequencer: RequestSequencer::new(),
            window: DEFAULT_PAGE_WINDOW,
            inner: Mutex::new(state),
            snapshots,
        }
    }

    pub fn with_window(mut self, window: u32) -> Self {
        self.window = window.max(1);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub async fn page(&self) -> Page {
        self.inner.lock().await.page
    }

    pub async fn snapshot(&self) -> ListSnapshot {
        self.inner.lock().await.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot> {
        self.snapshots.subscribe()
    }

    /// No-op (returns `None`) when `n` is outside `[1, total_pages]` or already current.
    pub async fn go_to_page(&self, n: u32) -> Option<FetchOutcome> {
        let (token, page) = {
            let mut state = self.inner.lock().await;
            if !state.page.contains(n) || n == state.page.number {
                return None;
            }
            state.page.number = n;
            self.begin(&mut state)
        };
        Some(self.complete(token, page).await)
    }

    pub async fn next_page(&self) -> Option<FetchOutcome> {
        let current = self.page().await.number;
        self.go_to_page(current.saturating_add(1)).await
    }

    pub async fn prev_page(&self) -> Option<FetchOutcome> {
        let current = self.page().await.number;
        self.go_to_page(current.saturating_sub(1)).await
    }

    pub async fn first_page(&self) -> Option<FetchOutcome> {
        self.go_to_page(1).await
    }

    pub async fn last_page(&self) -> Option<FetchOutcome> {
        let total = self.page().await.total_pages;
        self.go_to_page(total).await
    }

    /// Refetches the current page.
    pub async fn refresh(&self) -> FetchOutcome {
        self.fetch_page().await
    }

    pub async fn fetch_page(&self) -> FetchOutcome {
        let (token, page) = {
            let mut state = self.inner.lock().await;
            self.begin(&mut state)
        };
        self.complete(token, page).await
    }

    pub async fn visible_pages(&self) -> Vec<u32> {
        let page = self.page().await;
        page_window(page.number, page.total_pages, self.window)
    }

    pub async fn navigation(&self) -> PageNavigation {
        let page = self.page().await;
        PageNavigation {
            pages: page_window(page.number, page.total_pages, self.window),
            current: page.number,
            first: page.number > 1,
            prev: page.number > 1,
            next: page.number < page.total_pages,
            last: page.number < page.total_pages,
        }
    }

    fn begin(&self, state: &mut ListState) -> (RequestToken, Page) {
        let token = self.sequencer.issue();
        state.loading = true;
        self.publish(state);
        debug!(
            collection = %self.collection,
            page = state.page.number,
            token = token.0,
            "fetching page"
        );
        (token, state.page)
    }

    async fn complete(&self, token: RequestToken, page: Page) -> FetchOutcome {
        let mut requested = page;
        loop {
            let result = self
                .api
                .list(&self.collection, requested.number, requested.size)
                .await;

            let mut state = self.inner.lock().await;
            if !self.sequencer.is_latest(token) {
                debug!(
                    collection = %self.collection,
                    page = requested.number,
                    token = token.0,
                    "discarding stale page response"
                );
                return FetchOutcome::Stale;
            }

            let outcome = match result {
                Ok(response) => {
                    let total_pages = response.meta.total_pages();
                    if requested.number > total_pages {
                        // The page shrank out from under us (e.g. last row deleted). Nothing is
                        // committed until the clamped page has loaded.
                        requested = Page {
                            number: total_pages,
                            total_pages,
                            ..requested
                        };
                        continue;
                    }
                    self.apply(&mut state, requested.number, response);
                    FetchOutcome::Applied
                }
                Err(err) => {
                    self.notifier.notify(Notification::failure(&err));
                    FetchOutcome::Failed(err.kind)
                }
            };
            state.loading = false;
            self.publish(&mut state);
            return outcome;
        }
    }

    /// Commits page number, totals and records of a loaded page together.
    fn apply(&self, state: &mut ListState, number: u32, response: ListResponse) {
        let total_pages = response.meta.total_pages();
        info!(
            collection = %self.collection,
            page = number,
            total_pages,
            rows = response.data.len(),
            "page loaded"
        );
        state.page.number = number;
        state.page.total_pages = total_pages;
        state.records = response.data;
    }

    fn publish(&self, state: &mut ListState) {
        state.revision += 1;
        self.snapshots.send_replace(state.snapshot());
    }
}

/// Up to `width` consecutive page numbers centred on `current`, clamped to `[1, total]`.
pub fn page_window(current: u32, total: u32, width: u32) -> Vec<u32> {
    let total = total.max(1);
    let width = width.clamp(1, total);
    let current = current.clamp(1, total);
    let mut start = current.saturating_sub(width / 2).max(1);
    let end = (start + width - 1).min(total);
    start = (end + 1).saturating_sub(width).max(1);
    (start..=end).collect()
}

#[cfg(test)]
#[path = "tests/list_tests.rs"]
mod tests;
