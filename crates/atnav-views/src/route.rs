//! Navigation paths and the links between views.
//!
//! The path is the serialized form of an address:
//!
//! | path                                | view       |
//! |-------------------------------------|------------|
//! | `/<host>`                           | server     |
//! | `/at/<identifier>`                  | repository |
//! | `/at/<identifier>/<collection>`     | collection |
//! | `/at/<identifier>/<collection>/<rkey>` | record  |
//!
//! `at` asks the view to resolve the repository's PDS; a literal host in its
//! place is used directly.

use std::fmt;

use atnav_atproto::address::RepoPath;
use atnav_atproto::{Address, AtUri};
use thiserror::Error;

/// Server segment meaning "resolve the PDS from the identifier".
pub const RESOLVE_SENTINEL: &str = "at";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("no route for an empty path")]
    Empty,

    #[error("route {0} names no repository")]
    MissingIdentifier(String),

    #[error("empty segment in route {0}")]
    EmptySegment(String),

    #[error("route {0} is nested too deeply")]
    TooDeep(String),
}

/// Where a view finds its PDS.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Server {
    /// A literal PDS host from the path.
    Host(String),
    /// Resolve the PDS from the repository identifier.
    Resolve,
}

impl Server {
    fn segment(&self) -> &str {
        match self {
            Server::Host(host) => host,
            Server::Resolve => RESOLVE_SENTINEL,
        }
    }
}

/// Which view a route mounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Server,
    Repository,
    Collection,
    Record,
}

/// A parsed navigation path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    /// Browse the repositories hosted on a PDS.
    Server { host: String },
    /// Browse one repository, optionally narrowed to a collection or record.
    Repo {
        server: Server,
        identifier: String,
        path: RepoPath,
    },
}

/// One breadcrumb segment; the last one has no link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub label: String,
    pub route: Option<Route>,
}

impl Route {
    /// Parse a navigation path such as `/at/did:plc:abc/app.bsky.feed.post`.
    pub fn parse(path: &str) -> Result<Self, RouteError> {
        let trimmed = path.trim().trim_start_matches('/').trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(RouteError::Empty);
        }

        let segments: Vec<&str> = trimmed.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(RouteError::EmptySegment(path.to_string()));
        }

        let server = match segments[0] {
            RESOLVE_SENTINEL => Server::Resolve,
            host => Server::Host(host.to_string()),
        };

        let (identifier, repo_path) = match &segments[1..] {
            [] => {
                return match server {
                    Server::Host(host) => Ok(Route::Server { host }),
                    Server::Resolve => Err(RouteError::MissingIdentifier(path.to_string())),
                };
            }
            [identifier] => (identifier, RepoPath::Root),
            [identifier, collection] => (identifier, RepoPath::Collection(collection.to_string())),
            [identifier, collection, rkey] => (
                identifier,
                RepoPath::Record {
                    collection: collection.to_string(),
                    rkey: rkey.to_string(),
                },
            ),
            _ => return Err(RouteError::TooDeep(path.to_string())),
        };

        Ok(Route::Repo {
            server,
            identifier: identifier.to_string(),
            path: repo_path,
        })
    }

    /// The route a normalized address navigates to.
    pub fn from_address(address: &Address) -> Self {
        match address {
            Address::Endpoint { host } => Route::Server { host: host.clone() },
            Address::Repo { identifier, path } => Route::Repo {
                server: Server::Resolve,
                identifier: identifier.clone(),
                path: path.clone(),
            },
        }
    }

    /// Route to a repository, resolving its PDS.
    pub fn repo(identifier: impl Into<String>) -> Self {
        Route::Repo {
            server: Server::Resolve,
            identifier: identifier.into(),
            path: RepoPath::Root,
        }
    }

    pub fn kind(&self) -> ViewKind {
        match self {
            Route::Server { .. } => ViewKind::Server,
            Route::Repo { path, .. } => match path {
                RepoPath::Root => ViewKind::Repository,
                RepoPath::Collection(_) => ViewKind::Collection,
                RepoPath::Record { .. } => ViewKind::Record,
            },
        }
    }

    /// A literal PDS host, when the route carries one.
    pub fn host(&self) -> Option<&str> {
        match self {
            Route::Server { host }
            | Route::Repo {
                server: Server::Host(host),
                ..
            } => Some(host.as_str()),
            Route::Repo { .. } => None,
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        match self {
            Route::Repo { identifier, .. } => Some(identifier.as_str()),
            Route::Server { .. } => None,
        }
    }

    pub fn collection(&self) -> Option<&str> {
        match self {
            Route::Repo {
                path: RepoPath::Collection(collection) | RepoPath::Record { collection, .. },
                ..
            } => Some(collection.as_str()),
            _ => None,
        }
    }

    pub fn record_key(&self) -> Option<&str> {
        match self {
            Route::Repo {
                path: RepoPath::Record { rkey, .. },
                ..
            } => Some(rkey.as_str()),
            _ => None,
        }
    }

    /// The route one level down, keeping how the PDS is found.
    ///
    /// Repositories descend into collections, collections into records.
    /// Server and record routes have no children.
    pub fn child(&self, segment: &str) -> Option<Route> {
        match self {
            Route::Repo {
                server,
                identifier,
                path,
            } => {
                let path = match path {
                    RepoPath::Root => RepoPath::Collection(segment.to_string()),
                    RepoPath::Collection(collection) => RepoPath::Record {
                        collection: collection.clone(),
                        rkey: segment.to_string(),
                    },
                    RepoPath::Record { .. } => return None,
                };
                Some(Route::Repo {
                    server: server.clone(),
                    identifier: identifier.clone(),
                    path,
                })
            }
            Route::Server { .. } => None,
        }
    }

    /// Route to the record an `at://` URI names.
    pub fn for_record_uri(uri: &str) -> Option<Route> {
        let uri = AtUri::parse(uri).ok()?;
        Some(Route::Repo {
            server: Server::Resolve,
            identifier: uri.authority,
            path: RepoPath::Record {
                collection: uri.collection,
                rkey: uri.rkey,
            },
        })
    }

    /// Breadcrumb trail from the PDS down to this route.
    ///
    /// `endpoint_host` is the PDS the mounted view talks to, shown first once
    /// known.
    pub fn breadcrumb(&self, endpoint_host: Option<&str>) -> Vec<Crumb> {
        let mut crumbs = Vec::new();

        if let Some(host) = endpoint_host.or(self.host()) {
            crumbs.push(Crumb {
                label: host.to_string(),
                route: Some(Route::Server {
                    host: host.to_string(),
                }),
            });
        }

        if let Route::Repo {
            identifier, path, ..
        } = self
        {
            crumbs.push(Crumb {
                label: identifier.clone(),
                route: Some(Route::repo(identifier.clone())),
            });
            if let RepoPath::Collection(collection) | RepoPath::Record { collection, .. } = path {
                crumbs.push(Crumb {
                    label: collection.clone(),
                    route: Route::repo(identifier.clone()).child(collection),
                });
            }
            if let RepoPath::Record { rkey, .. } = path {
                crumbs.push(Crumb {
                    label: rkey.clone(),
                    route: None,
                });
            }
        }

        // The current location is never a link
        if let Some(last) = crumbs.last_mut() {
            last.route = None;
        }
        crumbs
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Server { host } => write!(f, "/{host}"),
            Route::Repo {
                server,
                identifier,
                path,
            } => {
                write!(f, "/{}/{}", server.segment(), identifier)?;
                match path {
                    RepoPath::Root => Ok(()),
                    RepoPath::Collection(collection) => write!(f, "/{collection}"),
                    RepoPath::Record { collection, rkey } => write!(f, "/{collection}/{rkey}"),
                }
            }
        }
    }
}
