//! Handle → DID → PDS endpoint resolution.
//!
//! Resolution is a two-step chain with no retries:
//!
//! 1. A handle is looked up in a [`HandleDirectory`]. Identifiers that are
//!    already DIDs skip this step.
//! 2. The DID document is fetched from a [`DidDirectory`] and its PDS service
//!    endpoint extracted.
//!
//! Any failure aborts the chain and is returned to the caller untouched.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::client::{XrpcError, decode_body};
use crate::{AtprotoError, ClientConfig, RESOLVE_HANDLE, ResolveError};

/// Prefix shared by every DID method.
pub const DID_PREFIX: &str = "did:";

/// Default service answering `com.atproto.identity.resolveHandle`.
pub const DEFAULT_HANDLE_RESOLVER: &str = "https://public.api.bsky.app";

/// Default PLC directory for `did:plc:` documents.
pub const DEFAULT_PLC_DIRECTORY: &str = "https://plc.directory";

/// Whether an identifier is a DID rather than a handle.
pub fn is_did(identifier: &str) -> bool {
    identifier.starts_with(DID_PREFIX)
}

/// A repository identity bound to the PDS currently serving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub did: String,
    pub endpoint: String,
}

/// Looks up the DID a handle points to.
#[async_trait]
pub trait HandleDirectory: Send + Sync {
    /// `Ok(None)` means the directory answered but knows no such handle.
    async fn handle_to_did(&self, handle: &str) -> Result<Option<String>, AtprotoError>;
}

/// Looks up the PDS endpoint in a DID document.
#[async_trait]
pub trait DidDirectory: Send + Sync {
    /// `Ok(None)` means the document exists but names no PDS.
    async fn did_to_endpoint(&self, did: &str) -> Result<Option<String>, AtprotoError>;
}

/// Where the default directories live.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub handle_resolver_url: String,
    pub plc_directory_url: String,
    pub client: ClientConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            handle_resolver_url: DEFAULT_HANDLE_RESOLVER.to_string(),
            plc_directory_url: DEFAULT_PLC_DIRECTORY.to_string(),
            client: ClientConfig::default(),
        }
    }
}

impl ResolverConfig {
    pub fn with_handle_resolver(mut self, url: impl Into<String>) -> Self {
        self.handle_resolver_url = url.into();
        self
    }

    pub fn with_plc_directory(mut self, url: impl Into<String>) -> Self {
        self.plc_directory_url = url.into();
        self
    }
}

/// Handle directory backed by an XRPC `resolveHandle` endpoint.
pub struct XrpcHandleDirectory {
    http: Client,
    service_url: String,
}

impl XrpcHandleDirectory {
    pub fn new(http: Client, service_url: impl Into<String>) -> Self {
        Self {
            http,
            service_url: service_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ResolveHandleResponse {
    #[serde(default)]
    did: Option<String>,
}

#[async_trait]
impl HandleDirectory for XrpcHandleDirectory {
    async fn handle_to_did(&self, handle: &str) -> Result<Option<String>, AtprotoError> {
        let url = format!("{}/xrpc/{}", self.service_url, RESOLVE_HANDLE);

        let response = self
            .http
            .get(&url)
            .query(&[("handle", handle)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            if let Ok(xrpc_error) = serde_json::from_str::<XrpcError>(&text) {
                // Unknown handles come back as 400 with an XRPC error body
                if xrpc_error.error == "InvalidRequest" {
                    return Ok(None);
                }
                return Err(xrpc_error.into());
            }
            return Err(AtprotoError::InvalidResponse(format!(
                "resolveHandle failed ({}): {}",
                status, text
            )));
        }

        let body: ResolveHandleResponse = decode_body(response).await?;
        Ok(body.did.filter(|did| !did.is_empty()))
    }
}

/// DID document directory for `did:plc:` and `did:web:` identifiers.
pub struct DidDocumentDirectory {
    http: Client,
    plc_directory_url: String,
}

impl DidDocumentDirectory {
    pub fn new(http: Client, plc_directory_url: impl Into<String>) -> Self {
        Self {
            http,
            plc_directory_url: plc_directory_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Where the DID document for `did` is published.
    fn document_url(&self, did: &str) -> Option<String> {
        if did.starts_with("did:plc:") {
            Some(format!("{}/{}", self.plc_directory_url, did))
        } else if let Some(domain) = did.strip_prefix("did:web:") {
            // percent-encoded ports are allowed in did:web
            let domain = domain.replace("%3A", ":");
            Some(format!("https://{}/.well-known/did.json", domain))
        } else {
            None
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DidDocument {
    #[serde(default)]
    service: Vec<DidService>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DidService {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default)]
    service_type: String,
    #[serde(default)]
    service_endpoint: serde_json::Value,
}

impl DidDocument {
    /// The PDS service endpoint, if the document declares one.
    fn pds_endpoint(&self) -> Option<String> {
        self.service
            .iter()
            .find(|s| s.id.ends_with("#atproto_pds") || s.service_type == "AtprotoPersonalDataServer")
            .and_then(|s| s.service_endpoint.as_str())
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
    }
}

#[async_trait]
impl DidDirectory for DidDocumentDirectory {
    async fn did_to_endpoint(&self, did: &str) -> Result<Option<String>, AtprotoError> {
        let Some(doc_url) = self.document_url(did) else {
            warn!(did = %did, "unsupported DID method");
            return Ok(None);
        };

        let response = self.http.get(&doc_url).send().await?;
        if !response.status().is_success() {
            return Err(AtprotoError::InvalidResponse(format!(
                "DID document fetch failed ({}) for {}",
                response.status(),
                did
            )));
        }

        let doc: DidDocument = decode_body(response).await?;
        Ok(doc.pds_endpoint())
    }
}

/// Resolves repository identifiers to their serving PDS.
#[derive(Clone)]
pub struct IdentityResolver {
    handles: Arc<dyn HandleDirectory>,
    dids: Arc<dyn DidDirectory>,
}

impl IdentityResolver {
    /// Resolver using the public handle resolver and PLC directory.
    pub fn new(config: &ResolverConfig) -> Result<Self, AtprotoError> {
        let http = config.client.build_http()?;
        Ok(Self::with_directories(
            Arc::new(XrpcHandleDirectory::new(
                http.clone(),
                config.handle_resolver_url.clone(),
            )),
            Arc::new(DidDocumentDirectory::new(
                http,
                config.plc_directory_url.clone(),
            )),
        ))
    }

    pub fn with_directories(handles: Arc<dyn HandleDirectory>, dids: Arc<dyn DidDirectory>) -> Self {
        Self { handles, dids }
    }

    /// Resolve an identifier to a DID, consulting the handle directory only
    /// for handles.
    pub async fn resolve_did(&self, identifier: &str) -> Result<String, ResolveError> {
        if identifier.is_empty() {
            return Err(ResolveError::EmptyIdentifier);
        }
        if is_did(identifier) {
            return Ok(identifier.to_string());
        }

        let did = self
            .handles
            .handle_to_did(identifier)
            .await
            .map_err(|source| {
                warn!(handle = %identifier, error = %source, "handle lookup failed");
                ResolveError::HandleLookup {
                    handle: identifier.to_string(),
                    source,
                }
            })?;

        match did {
            Some(did) if !did.is_empty() => {
                debug!(handle = %identifier, did = %did, "resolved handle");
                Ok(did)
            }
            _ => Err(ResolveError::HandleNotFound {
                handle: identifier.to_string(),
            }),
        }
    }

    /// Resolve an identifier all the way to its PDS endpoint.
    pub async fn resolve(&self, identifier: &str) -> Result<ResolvedIdentity, ResolveError> {
        let did = self.resolve_did(identifier).await?;

        let endpoint = self
            .dids
            .did_to_endpoint(&did)
            .await
            .map_err(|source| {
                warn!(did = %did, error = %source, "DID document lookup failed");
                ResolveError::DidLookup {
                    did: did.clone(),
                    source,
                }
            })?
            .ok_or_else(|| ResolveError::NoEndpoint { did: did.clone() })?;

        debug!(did = %did, endpoint = %endpoint, "resolved PDS");
        Ok(ResolvedIdentity { did, endpoint })
    }
}
