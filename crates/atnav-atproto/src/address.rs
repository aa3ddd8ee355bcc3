//! Normalization of free-form user input into a canonical address.
//!
//! Accepted shapes:
//!
//! - `https://pds.example.com` → a bare PDS endpoint
//! - `at://did:plc:abc/app.bsky.feed.post/3l2z` (the `at://` is optional)
//! - `alice.bsky.social`, `did:plc:abc`, `did:plc:abc/app.bsky.feed.like`
//! - `https://bsky.app/profile/<id>` and `https://bsky.app/profile/<id>/post/<rkey>`

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::POST_COLLECTION;

/// Social-app hosts whose profile and post links map onto repository records.
const SOCIAL_APP_PREFIXES: &[&str] = &["https://bsky.app/", "https://main.bsky.dev/"];

static PROFILE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https://(?:bsky\.app|main\.bsky\.dev)/profile/([^/?#]+)(?:/post/([^/?#]+))?/?(?:[?#].*)?$",
    )
    .unwrap()
});

/// Input that could not be normalized into an [`Address`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("input is empty")]
    Empty,

    #[error("no host in server URL: {0}")]
    EmptyHost(String),

    #[error("no repository identifier in: {0}")]
    EmptyIdentifier(String),

    #[error("empty path segment in: {0}")]
    EmptySegment(String),

    #[error("too many path segments (expected identifier/collection/rkey): {0}")]
    TooManySegments(String),

    #[error("not a profile or post link: {0}")]
    UnrecognizedAppUrl(String),
}

/// How deep into a repository an address points.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RepoPath {
    /// The repository itself.
    Root,
    /// One collection within the repository.
    Collection(String),
    /// One record within a collection.
    Record { collection: String, rkey: String },
}

/// A canonical navigation target.
///
/// An address either names a PDS to browse (`Endpoint`) or a repository,
/// optionally narrowed to a collection and then a record (`Repo`). A record
/// key cannot exist without its collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    Endpoint { host: String },
    Repo { identifier: String, path: RepoPath },
}

/// Which family of input an address came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Endpoint,
    AtUri,
}

impl Address {
    /// Normalize raw user input.
    ///
    /// ```
    /// use atnav_atproto::Address;
    ///
    /// let a = Address::parse("https://bsky.app/profile/alice.test/post/abc").unwrap();
    /// let b = Address::parse("at://alice.test/app.bsky.feed.post/abc").unwrap();
    /// assert_eq!(a, b);
    /// ```
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AddressError::Empty);
        }

        if SOCIAL_APP_PREFIXES.iter().any(|p| input.starts_with(p)) {
            let caps = PROFILE_URL_RE
                .captures(input)
                .ok_or_else(|| AddressError::UnrecognizedAppUrl(input.to_string()))?;
            let identifier = caps[1].to_string();
            let path = match caps.get(2) {
                Some(rkey) => RepoPath::Record {
                    collection: POST_COLLECTION.to_string(),
                    rkey: rkey.as_str().to_string(),
                },
                None => RepoPath::Root,
            };
            return Ok(Address::Repo { identifier, path });
        }

        if let Some(rest) = input
            .strip_prefix("https://")
            .or_else(|| input.strip_prefix("http://"))
        {
            let host = rest.split(['/', '?', '#']).next().unwrap_or("");
            if host.is_empty() {
                return Err(AddressError::EmptyHost(input.to_string()));
            }
            return Ok(Address::Endpoint {
                host: host.to_string(),
            });
        }

        let path = input.strip_prefix("at://").unwrap_or(input);
        Self::from_repo_path(path).map_err(|e| match e {
            // report against what the user typed, not the stripped path
            AddressError::EmptyIdentifier(_) => AddressError::EmptyIdentifier(input.to_string()),
            AddressError::EmptySegment(_) => AddressError::EmptySegment(input.to_string()),
            AddressError::TooManySegments(_) => AddressError::TooManySegments(input.to_string()),
            other => other,
        })
    }

    /// Build a repository address from `identifier[/collection[/rkey]]`.
    pub fn from_repo_path(path: &str) -> Result<Self, AddressError> {
        let mut segments: Vec<&str> = path.split('/').collect();
        while segments.len() > 1 && segments.last() == Some(&"") {
            segments.pop();
        }

        if segments.first().is_none_or(|s| s.is_empty()) {
            return Err(AddressError::EmptyIdentifier(path.to_string()));
        }
        if segments.iter().any(|s| s.is_empty()) {
            return Err(AddressError::EmptySegment(path.to_string()));
        }

        let path_kind = match segments.as_slice() {
            [_] => RepoPath::Root,
            [_, collection] => RepoPath::Collection(collection.to_string()),
            [_, collection, rkey] => RepoPath::Record {
                collection: collection.to_string(),
                rkey: rkey.to_string(),
            },
            _ => return Err(AddressError::TooManySegments(path.to_string())),
        };

        Ok(Address::Repo {
            identifier: segments[0].to_string(),
            path: path_kind,
        })
    }

    pub fn scheme(&self) -> Scheme {
        match self {
            Address::Endpoint { .. } => Scheme::Endpoint,
            Address::Repo { .. } => Scheme::AtUri,
        }
    }

    pub fn host(&self) -> Option<&str> {
        match self {
            Address::Endpoint { host } => Some(host),
            Address::Repo { .. } => None,
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        match self {
            Address::Repo { identifier, .. } => Some(identifier),
            Address::Endpoint { .. } => None,
        }
    }

    pub fn collection(&self) -> Option<&str> {
        match self {
            Address::Repo {
                path: RepoPath::Collection(collection) | RepoPath::Record { collection, .. },
                ..
            } => Some(collection),
            _ => None,
        }
    }

    pub fn record_key(&self) -> Option<&str> {
        match self {
            Address::Repo {
                path: RepoPath::Record { rkey, .. },
                ..
            } => Some(rkey),
            _ => None,
        }
    }

    /// Replace the repository identifier, keeping the path below it.
    pub fn with_identifier(self, new_identifier: impl Into<String>) -> Self {
        match self {
            Address::Repo { path, .. } => Address::Repo {
                identifier: new_identifier.into(),
                path,
            },
            endpoint => endpoint,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Endpoint { host } => write!(f, "https://{host}"),
            Address::Repo { identifier, path } => {
                write!(f, "at://{identifier}")?;
                match path {
                    RepoPath::Root => Ok(()),
                    RepoPath::Collection(collection) => write!(f, "/{collection}"),
                    RepoPath::Record { collection, rkey } => write!(f, "/{collection}/{rkey}"),
                }
            }
        }
    }
}
