//! Error types for views and navigation.

use atnav_atproto::{AddressError, AtprotoError, ResolveError};
use thiserror::Error;

use crate::route::RouteError;

/// Errors a view or the navigator can report.
#[derive(Debug, Error)]
pub enum ViewError {
    /// Input text could not be normalized into an address.
    #[error(transparent)]
    MalformedInput(#[from] AddressError),

    /// A navigation path could not be parsed.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// The repository's PDS could not be found.
    #[error("Could not resolve PDS")]
    Resolution(#[source] ResolveError),

    /// A repository RPC call failed.
    #[error("{}", .0.user_message())]
    Rpc(#[from] AtprotoError),

    /// Another view mounted while this one was waiting.
    #[error("superseded by a newer view")]
    Superseded,

    /// "Load more" on a listing with no further pages.
    #[error("nothing more to load")]
    NothingToLoad,

    /// The operation is not valid in the view's current state.
    #[error("view is {state}, cannot {action}")]
    InvalidState { state: String, action: &'static str },
}

impl From<ResolveError> for ViewError {
    fn from(err: ResolveError) -> Self {
        ViewError::Resolution(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_message() {
        let err = ViewError::from(ResolveError::NoEndpoint {
            did: "did:plc:abc".into(),
        });
        assert_eq!(err.to_string(), "Could not resolve PDS");
    }

    #[test]
    fn test_rpc_message_verbatim() {
        let err = ViewError::from(AtprotoError::Xrpc {
            error: "RecordNotFound".into(),
            message: "Could not locate record: at://did:plc:abc/app.bsky.feed.post/x".into(),
        });
        assert_eq!(
            err.to_string(),
            "Could not locate record: at://did:plc:abc/app.bsky.feed.post/x"
        );
    }
}
