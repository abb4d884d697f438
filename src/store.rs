//! Remote content store backed by the GitHub contents API
//!
//! The published artifacts live as plain files in a repository used as a
//! data store. Only three primitives are needed: read a file, update it in
//! place, and create it when it does not exist yet. Authentication,
//! versioning and conflict resolution all belong to the remote side; this
//! client just carries a bearer token and the current blob sha.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use thiserror::Error;
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("proxy-sync/", env!("CARGO_PKG_VERSION"));

/// Errors from the remote store, typed so callers never have to match on
/// message text to tell "missing file" apart from a real failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("remote path not found")]
    NotFound,
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("remote store error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    #[error("undecodable remote content: {0}")]
    Decode(String),
}

/// How a publish landed on the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Created,
    Updated,
}

impl fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishOutcome::Created => write!(f, "Created"),
            PublishOutcome::Updated => write!(f, "Updated"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: Option<String>,
    sha: String,
}

/// Client for one repository on the remote store
#[derive(Debug, Clone)]
pub struct GithubStore {
    client: Client,
    api_base: String,
    owner: String,
    repo: String,
    token: String,
}

impl GithubStore {
    pub fn new(owner: &str, repo: &str, token: &str) -> Result<Self, StoreError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            token: token.to_string(),
        })
    }

    /// Point the client at a different API host. Used by tests.
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            self.owner,
            self.repo,
            path.trim_start_matches('/')
        )
    }

    /// Fetch a file's text content.
    pub async fn get(&self, path: &str) -> Result<String, StoreError> {
        let meta = self.fetch_meta(path).await?;
        let encoded: String = meta
            .content
            .ok_or_else(|| StoreError::Decode(format!("{path}: no content field")))?
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Update an existing file in place. Fails with [`StoreError::NotFound`]
    /// when the file (and therefore its version marker) does not exist.
    pub async fn update(
        &self,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<(), StoreError> {
        let sha = self.fetch_meta(path).await?.sha;
        self.put(path, content, message, Some(&sha)).await
    }

    /// Create a file that does not exist yet.
    pub async fn create(
        &self,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<(), StoreError> {
        self.put(path, content, message, None).await
    }

    /// Idempotent write: update when the file exists, otherwise create it.
    ///
    /// Only a missing file falls through to create; any other update failure
    /// is returned as-is.
    pub async fn publish(
        &self,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<PublishOutcome, StoreError> {
        match self.update(path, content, message).await {
            Ok(()) => Ok(PublishOutcome::Updated),
            Err(StoreError::NotFound) => {
                debug!("{path} missing on remote, creating it");
                self.create(path, content, message).await?;
                Ok(PublishOutcome::Created)
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_meta(&self, path: &str) -> Result<ContentsResponse, StoreError> {
        let response = self
            .client
            .get(self.contents_url(path))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            StatusCode::NOT_FOUND => Err(StoreError::NotFound),
            status => Err(StoreError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }

    async fn put(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut body = json!({
            "message": message,
            "content": BASE64.encode(content),
        });
        if let Some(sha) = sha {
            body["sha"] = json!(sha);
        }

        let response = self
            .client
            .put(self.contents_url(path))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            Ok(())
        } else if status == StatusCode::NOT_FOUND {
            Err(StoreError::NotFound)
        } else {
            Err(StoreError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            })
        }
    }
}
