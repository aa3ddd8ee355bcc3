//! Wire types for the XRPC read surface.

use serde::{Deserialize, Serialize};

use crate::AtUri;

/// One page of a cursor-paginated listing.
///
/// Items are in server order. An absent cursor means the server has nothing
/// further to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, cursor: Option<String>) -> Self {
        Self { items, cursor }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Response from `com.atproto.repo.describeRepo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoDescription {
    pub did: String,
    pub handle: String,
    /// The repository's DID document, passed through untouched.
    #[serde(default)]
    pub did_doc: serde_json::Value,
    /// Collection NSIDs present in the repository, in server order.
    #[serde(default)]
    pub collections: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_is_correct: Option<bool>,
}

/// Response from getting a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRecordResponse<T> {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
    pub value: T,
}

impl<T> GetRecordResponse<T> {
    /// The repository that owns this record, taken from the URI authority.
    pub fn repo(&self) -> Option<String> {
        AtUri::parse(&self.uri).ok().map(|uri| uri.authority)
    }
}

/// A single record in a list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListRecordItem<T> {
    pub uri: String,
    pub cid: String,
    pub value: T,
}

impl<T> ListRecordItem<T> {
    /// The record key: last path segment of the record URI.
    pub fn rkey(&self) -> &str {
        AtUri::extract_rkey(&self.uri)
    }
}

/// A record entry as returned by `listRecords`, value left untyped.
pub type RecordEntry = ListRecordItem<serde_json::Value>;

/// A record as returned by `getRecord`, value left untyped.
pub type RecordResponse = GetRecordResponse<serde_json::Value>;

/// Response from listing records.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListRecordsResponse<T> {
    pub records: Vec<ListRecordItem<T>>,
    pub cursor: Option<String>,
}

impl<T> From<ListRecordsResponse<T>> for Page<ListRecordItem<T>> {
    fn from(response: ListRecordsResponse<T>) -> Self {
        Page::new(response.records, response.cursor)
    }
}

/// A repository hosted on a PDS, from `com.atproto.sync.listRepos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoEntry {
    pub did: String,
    /// Older PDS versions omit this field; a listed repo is then active.
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// Reason a repo is inactive (`takendown`, `deactivated`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

fn default_active() -> bool {
    true
}

/// Response from listing repositories.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListReposResponse {
    pub repos: Vec<RepoEntry>,
    pub cursor: Option<String>,
}

impl From<ListReposResponse> for Page<RepoEntry> {
    fn from(response: ListReposResponse) -> Self {
        Page::new(response.repos, response.cursor)
    }
}
