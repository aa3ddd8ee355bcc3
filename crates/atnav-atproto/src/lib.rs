//! ATProto read-side plumbing for atnav.
//!
//! This crate turns loosely formatted user input into canonical addresses,
//! resolves handles and DIDs to the PDS serving them, and reads repositories
//! over unauthenticated XRPC.
//!
//! ## Features
//!
//! - **Address**: normalizes URLs, `at://` URIs and bare identifiers
//! - **Resolver**: handle → DID → PDS endpoint resolution
//! - **Client**: stateless XRPC sessions bound to one endpoint
//! - **Pagination**: cursor-driven accumulation for listings
//! - **Directory**: the public list of known PDS hosts

pub mod address;
mod client;
pub mod directory;
mod error;
pub mod pagination;
mod records;
pub mod resolver;
mod types;
mod uri;

pub use address::{Address, AddressError};
pub use client::{ClientConfig, RepositoryRpc, SessionFactory, XrpcSession, XrpcSessionFactory};
pub use directory::{DEFAULT_PDS_LIST_URL, fetch_known_pdses};
pub use error::{AtprotoError, ResolveError};
pub use pagination::{
    ListingAccumulator, ListingQuery, PageOutcome, RECORD_PAGE_SIZE, REPO_PAGE_SIZE, RecordListing,
    RepoListing, fetch_page,
};
pub use records::*;
pub use resolver::{
    DidDirectory, DidDocumentDirectory, HandleDirectory, IdentityResolver, ResolvedIdentity,
    ResolverConfig, XrpcHandleDirectory, is_did,
};
pub use types::*;
pub use uri::{AtUri, AtUriError};
