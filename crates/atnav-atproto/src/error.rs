//! Error types for the ATProto client and identity resolution.

use thiserror::Error;

/// Errors that can occur when reading from an ATProto service.
#[derive(Debug, Error)]
pub enum AtprotoError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered 404 without an XRPC error body.
    #[error("not found: {nsid}")]
    NotFound { nsid: String },

    /// Invalid response from server.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limited.
    #[error("rate limited{}", match retry_after_secs {
        Some(secs) => format!(" (retry after {}s)", secs),
        None => String::new(),
    })]
    RateLimited {
        /// Seconds to wait before retrying (from Retry-After header, optional).
        retry_after_secs: Option<u64>,
    },

    /// XRPC error from server.
    #[error("XRPC error: {error} - {message}")]
    Xrpc { error: String, message: String },
}

impl AtprotoError {
    /// The text shown to a user for this failure.
    ///
    /// XRPC errors surface the server's own message verbatim, falling back to
    /// the error name when the server sent no message.
    pub fn user_message(&self) -> String {
        match self {
            AtprotoError::Xrpc { error, message } if message.is_empty() => error.clone(),
            AtprotoError::Xrpc { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Errors from handle → DID → endpoint resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Nothing to resolve.
    #[error("empty identifier")]
    EmptyIdentifier,

    /// The handle directory answered but had no DID for the handle.
    #[error("handle {handle} did not resolve to a DID")]
    HandleNotFound { handle: String },

    /// The handle directory could not be queried.
    #[error("handle lookup for {handle} failed: {source}")]
    HandleLookup {
        handle: String,
        #[source]
        source: AtprotoError,
    },

    /// The DID document lists no PDS endpoint.
    #[error("no PDS endpoint found for {did}")]
    NoEndpoint { did: String },

    /// The DID document could not be fetched.
    #[error("DID document lookup for {did} failed: {source}")]
    DidLookup {
        did: String,
        #[source]
        source: AtprotoError,
    },
}
