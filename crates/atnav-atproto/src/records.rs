//! Lexicon NSIDs and collection constants.

/// Lexicon NSID for Bluesky post records.
pub const POST_COLLECTION: &str = "app.bsky.feed.post";

// =============================================================================
// XRPC Methods
// =============================================================================

/// Describe a repository: DID, handle, DID document and collections.
pub const DESCRIBE_REPO: &str = "com.atproto.repo.describeRepo";

/// Fetch one record by collection and record key.
pub const GET_RECORD: &str = "com.atproto.repo.getRecord";

/// Page through the records of one collection.
pub const LIST_RECORDS: &str = "com.atproto.repo.listRecords";

/// Page through the repositories hosted on a PDS.
pub const LIST_REPOS: &str = "com.atproto.sync.listRepos";

/// Resolve a handle to a DID.
pub const RESOLVE_HANDLE: &str = "com.atproto.identity.resolveHandle";
