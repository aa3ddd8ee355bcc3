//! Record URI parsing utilities.

use std::fmt;

use thiserror::Error;

/// Error when parsing a record URI.
#[derive(Debug, Error)]
#[error("invalid AT URI: {0}")]
pub struct AtUriError(String);

/// A fully qualified record URI as returned by the server.
///
/// Record URIs have the format: `at://{authority}/{collection}/{rkey}`, where
/// the authority is the owning repository's DID (or, rarely, its handle).
/// User input is handled by [`crate::Address`], which is far more lenient.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AtUri {
    /// The repository owning the record.
    pub authority: String,
    /// The collection (e.g., "app.bsky.feed.post").
    pub collection: String,
    /// The record key.
    pub rkey: String,
}

impl AtUri {
    /// Parse a record URI string.
    ///
    /// # Example
    ///
    /// ```
    /// use atnav_atproto::AtUri;
    ///
    /// let uri = AtUri::parse("at://did:plc:abc123/app.bsky.feed.post/3abc").unwrap();
    /// assert_eq!(uri.authority, "did:plc:abc123");
    /// assert_eq!(uri.collection, "app.bsky.feed.post");
    /// assert_eq!(uri.rkey, "3abc");
    /// ```
    pub fn parse(uri: &str) -> Result<Self, AtUriError> {
        let rest = uri
            .strip_prefix("at://")
            .ok_or_else(|| AtUriError(format!("missing at:// prefix: {uri}")))?;

        let parts: Vec<&str> = rest.splitn(3, '/').collect();
        let [authority, collection, rkey] = parts.as_slice() else {
            return Err(AtUriError(format!("expected authority/collection/rkey: {uri}")));
        };

        if authority.is_empty() || collection.is_empty() || rkey.is_empty() {
            return Err(AtUriError(format!("empty component in URI: {uri}")));
        }

        Ok(Self {
            authority: authority.to_string(),
            collection: collection.to_string(),
            rkey: rkey.to_string(),
        })
    }

    /// Quick rkey extraction without full parsing.
    ///
    /// Returns the last path component of any URI-like string.
    ///
    /// ```
    /// use atnav_atproto::AtUri;
    ///
    /// assert_eq!(AtUri::extract_rkey("at://did/col/rkey123"), "rkey123");
    /// assert_eq!(AtUri::extract_rkey("no-slash"), "no-slash");
    /// ```
    pub fn extract_rkey(uri: &str) -> &str {
        uri.rsplit('/').next().unwrap_or("")
    }
}

impl fmt::Display for AtUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at://{}/{}/{}", self.authority, self.collection, self.rkey)
    }
}
