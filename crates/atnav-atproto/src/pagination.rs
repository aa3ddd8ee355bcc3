//! Cursor-driven accumulation for XRPC listings.
//!
//! A [`ListingQuery`] knows how to fetch one page of a listing; a
//! [`ListingAccumulator`] owns everything fetched so far plus the cursor for
//! the next page. Fetching and absorbing are separate steps so a caller can
//! check that its result is still wanted before mutating anything.
//!
//! A page shorter than the requested size ends the listing even when the
//! server also sent a cursor. Some servers emit a trailing cursor on the last
//! page; following it would cost an extra empty round trip.

use async_trait::async_trait;
use tracing::debug;

use crate::{AtprotoError, Page, RecordEntry, RepoEntry, RepositoryRpc};

/// Page size for `com.atproto.repo.listRecords`.
pub const RECORD_PAGE_SIZE: u32 = 100;

/// Page size for `com.atproto.sync.listRepos`.
pub const REPO_PAGE_SIZE: u32 = 1000;

/// One paginated listing on a PDS.
#[async_trait]
pub trait ListingQuery: Send + Sync {
    type Item: Send;

    /// Number of items requested per page.
    fn page_size(&self) -> u32;

    async fn fetch(
        &self,
        rpc: &dyn RepositoryRpc,
        cursor: Option<&str>,
    ) -> Result<Page<Self::Item>, AtprotoError>;
}

/// Every repository hosted on a PDS.
#[derive(Debug, Clone, Copy, Default)]
pub struct RepoListing;

#[async_trait]
impl ListingQuery for RepoListing {
    type Item = RepoEntry;

    fn page_size(&self) -> u32 {
        REPO_PAGE_SIZE
    }

    async fn fetch(
        &self,
        rpc: &dyn RepositoryRpc,
        cursor: Option<&str>,
    ) -> Result<Page<RepoEntry>, AtprotoError> {
        rpc.list_repos(self.page_size(), cursor).await
    }
}

/// The records of one collection in one repository.
#[derive(Debug, Clone)]
pub struct RecordListing {
    pub repo: String,
    pub collection: String,
}

impl RecordListing {
    pub fn new(repo: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            collection: collection.into(),
        }
    }
}

#[async_trait]
impl ListingQuery for RecordListing {
    type Item = RecordEntry;

    fn page_size(&self) -> u32 {
        RECORD_PAGE_SIZE
    }

    async fn fetch(
        &self,
        rpc: &dyn RepositoryRpc,
        cursor: Option<&str>,
    ) -> Result<Page<RecordEntry>, AtprotoError> {
        rpc.list_records(&self.repo, &self.collection, self.page_size(), cursor)
            .await
    }
}

/// Fetch one page of `query` starting at `cursor`.
pub async fn fetch_page<Q: ListingQuery + ?Sized>(
    rpc: &dyn RepositoryRpc,
    query: &Q,
    cursor: Option<&str>,
) -> Result<Page<Q::Item>, AtprotoError> {
    debug!(
        endpoint = rpc.endpoint(),
        page_size = query.page_size(),
        cursor = cursor.unwrap_or(""),
        "fetching page"
    );
    query.fetch(rpc, cursor).await
}

/// What absorbing one page did to an accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOutcome {
    pub appended: usize,
    pub exhausted: bool,
}

/// Items fetched so far from one listing, in server order.
#[derive(Debug, Clone)]
pub struct ListingAccumulator<T> {
    items: Vec<T>,
    cursor: Option<String>,
    exhausted: bool,
    pages: usize,
}

impl<T> Default for ListingAccumulator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ListingAccumulator<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            cursor: None,
            exhausted: false,
            pages: 0,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of pages absorbed so far.
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Cursor to request the next page with. `None` before the first page
    /// and after exhaustion.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Whether another page can be requested.
    pub fn has_more(&self) -> bool {
        !self.exhausted
    }

    /// Append a page fetched with [`cursor`](Self::cursor).
    pub fn absorb(&mut self, page: Page<T>, page_size: u32) -> PageOutcome {
        let appended = page.items.len();
        let exhausted = appended < page_size as usize || page.cursor.is_none();

        self.items.extend(page.items);
        self.pages += 1;
        self.exhausted = exhausted;
        self.cursor = if exhausted { None } else { page.cursor };

        PageOutcome {
            appended,
            exhausted,
        }
    }

    /// Fetch and absorb the next page.
    ///
    /// On error nothing changes, so calling again retries the same cursor.
    pub async fn load_next<Q>(
        &mut self,
        rpc: &dyn RepositoryRpc,
        query: &Q,
    ) -> Result<PageOutcome, AtprotoError>
    where
        Q: ListingQuery<Item = T> + ?Sized,
    {
        let page = fetch_page(rpc, query, self.cursor()).await?;
        Ok(self.absorb(page, query.page_size()))
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}
