//! Stateless XRPC sessions bound to one PDS endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::{ListRecordsResponse, ListReposResponse};
use crate::{
    AtprotoError, DESCRIBE_REPO, GET_RECORD, LIST_RECORDS, LIST_REPOS, Page, RecordEntry,
    RecordResponse, RepoDescription, RepoEntry,
};

/// HTTP settings shared by every session a factory creates.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: concat!("atnav/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Build the underlying HTTP client.
    pub fn build_http(&self) -> Result<Client, AtprotoError> {
        Ok(Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .user_agent(self.user_agent.clone())
            .build()?)
    }
}

/// The read-only repository surface of a PDS.
#[async_trait]
pub trait RepositoryRpc: Send + Sync {
    /// Base URL this session talks to.
    fn endpoint(&self) -> &str;

    async fn describe_repo(&self, repo: &str) -> Result<RepoDescription, AtprotoError>;

    async fn get_record(
        &self,
        repo: &str,
        collection: &str,
        rkey: &str,
    ) -> Result<RecordResponse, AtprotoError>;

    async fn list_records(
        &self,
        repo: &str,
        collection: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<RecordEntry>, AtprotoError>;

    async fn list_repos(
        &self,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<RepoEntry>, AtprotoError>;
}

/// Builds a fresh session for an endpoint.
///
/// Construction performs no I/O. Sessions are never reused across endpoints.
pub trait SessionFactory: Send + Sync {
    fn create_session(&self, endpoint: &str) -> Box<dyn RepositoryRpc>;
}

/// Factory for [`XrpcSession`]s sharing one HTTP client.
#[derive(Clone)]
pub struct XrpcSessionFactory {
    http: Client,
}

impl XrpcSessionFactory {
    pub fn new(config: &ClientConfig) -> Result<Self, AtprotoError> {
        Ok(Self {
            http: config.build_http()?,
        })
    }
}

impl SessionFactory for XrpcSessionFactory {
    fn create_session(&self, endpoint: &str) -> Box<dyn RepositoryRpc> {
        Box::new(XrpcSession::with_http(self.http.clone(), endpoint))
    }
}

/// Unauthenticated XRPC client for one PDS.
pub struct XrpcSession {
    http: Client,
    pds_url: String,
}

impl XrpcSession {
    /// Create a session with its own HTTP client.
    pub fn new(endpoint: &str) -> Result<Self, AtprotoError> {
        Ok(Self::with_http(ClientConfig::default().build_http()?, endpoint))
    }

    /// Create a session on an existing HTTP client.
    ///
    /// A bare host (`pds.example.com`) is addressed over https.
    pub fn with_http(http: Client, endpoint: &str) -> Self {
        Self {
            http,
            pds_url: endpoint_url(endpoint),
        }
    }

    /// Get the PDS URL.
    pub fn pds_url(&self) -> &str {
        &self.pds_url
    }

    /// Issue an XRPC query and decode the response body.
    async fn query<T: DeserializeOwned>(
        &self,
        nsid: &str,
        params: &[(&str, String)],
    ) -> Result<T, AtprotoError> {
        let url = format!("{}/xrpc/{}", self.pds_url, nsid);
        debug!(pds = %self.pds_url, nsid, "xrpc query");

        let response = self.http.get(&url).query(params).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            let text = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<XrpcError>(&text) {
                Ok(xrpc_error) => xrpc_error.into(),
                Err(_) => AtprotoError::NotFound {
                    nsid: nsid.to_string(),
                },
            });
        }

        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AtprotoError> {
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok());
            return Err(AtprotoError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let text = response.text().await.map_err(|e| {
                AtprotoError::InvalidResponse(format!(
                    "request failed ({}): failed to read response: {}",
                    status, e
                ))
            })?;

            // Try to parse as XRPC error
            if let Ok(xrpc_error) = serde_json::from_str::<XrpcError>(&text) {
                return Err(xrpc_error.into());
            }

            return Err(AtprotoError::InvalidResponse(format!(
                "request failed ({}): {}",
                status, text
            )));
        }

        decode_body(response).await
    }
}

/// Decode a successful response body, reporting a body of the wrong shape as
/// an invalid response rather than a transport failure.
pub(crate) async fn decode_body<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, AtprotoError> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body)
        .map_err(|e| AtprotoError::InvalidResponse(format!("unexpected response shape: {}", e)))
}

#[async_trait]
impl RepositoryRpc for XrpcSession {
    fn endpoint(&self) -> &str {
        &self.pds_url
    }

    async fn describe_repo(&self, repo: &str) -> Result<RepoDescription, AtprotoError> {
        self.query(DESCRIBE_REPO, &[("repo", repo.to_string())])
            .await
    }

    async fn get_record(
        &self,
        repo: &str,
        collection: &str,
        rkey: &str,
    ) -> Result<RecordResponse, AtprotoError> {
        self.query(
            GET_RECORD,
            &[
                ("repo", repo.to_string()),
                ("collection", collection.to_string()),
                ("rkey", rkey.to_string()),
            ],
        )
        .await
    }

    async fn list_records(
        &self,
        repo: &str,
        collection: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<RecordEntry>, AtprotoError> {
        let mut params = vec![
            ("repo", repo.to_string()),
            ("collection", collection.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }

        let response: ListRecordsResponse<serde_json::Value> =
            self.query(LIST_RECORDS, &params).await?;
        Ok(response.into())
    }

    async fn list_repos(
        &self,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<RepoEntry>, AtprotoError> {
        let mut params = vec![("limit", limit.to_string())];
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }

        let response: ListReposResponse = self.query(LIST_REPOS, &params).await?;
        Ok(response.into())
    }
}

/// Turn a route host or resolved endpoint into a base URL.
fn endpoint_url(endpoint: &str) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    if endpoint.starts_with("https://") || endpoint.starts_with("http://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    }
}

/// XRPC error response format.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct XrpcError {
    pub(crate) error: String,
    #[serde(default)]
    pub(crate) message: Option<String>,
}

impl From<XrpcError> for AtprotoError {
    fn from(e: XrpcError) -> Self {
        AtprotoError::Xrpc {
            error: e.error,
            message: e.message.unwrap_or_default(),
        }
    }
}
