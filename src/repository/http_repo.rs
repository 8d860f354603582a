//! REST Repository Implementation
//!
//! reqwest-backed access to the catalog backend:
//! - `GET {base}/{resource}?parentId=…` lists a scope
//! - `PUT {base}/{resource}/{id}` with `{ "sortOrder": n }` sets one position

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

use crate::config::AdminConfig;
use crate::domain::{DomainError, DomainResult, RemoteRecord, ScopeContext};
use super::traits::PositionRepository;
use super::wire::{parse_list, SortOrderBody};

/// Characters escaped when an id is used as a path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Query parameter naming the parent scope
const PARENT_PARAM: &str = "parentId";

/// REST implementation of the position repository
#[derive(Clone)]
pub struct HttpRepository {
    client: Client,
    base_url: String,
}

impl HttpRepository {
    pub fn new(base_url: &str, timeout: Duration) -> DomainResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &AdminConfig) -> DomainResult<Self> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, scope: &ScopeContext) -> String {
        format!("{}/{}", self.base_url, scope.resource.path())
    }

    fn entity_url(&self, scope: &ScopeContext, id: &str) -> String {
        format!(
            "{}/{}",
            self.collection_url(scope),
            utf8_percent_encode(id, PATH_SEGMENT)
        )
    }
}

/// Map a non-success status to a domain error
fn status_error(status: StatusCode, body: &str) -> DomainError {
    let detail = if body.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, body)
    };
    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        DomainError::Transient(detail)
    } else if status == StatusCode::NOT_FOUND {
        DomainError::NotFound(detail)
    } else {
        DomainError::Rejected(detail)
    }
}

/// Map a transport-level failure to a domain error
fn transport_error(err: reqwest::Error) -> DomainError {
    if err.is_decode() {
        DomainError::Internal(err.to_string())
    } else {
        DomainError::Transient(err.to_string())
    }
}

async fn ensure_success(response: reqwest::Response) -> DomainResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, body.trim()))
}

#[async_trait]
impl PositionRepository for HttpRepository {
    async fn list(&self, scope: &ScopeContext) -> DomainResult<Vec<RemoteRecord>> {
        let url = self.collection_url(scope);
        log::debug!("GET {} {}={}", url, PARENT_PARAM, scope.parent_id);

        let response = self
            .client
            .get(&url)
            .query(&[(PARENT_PARAM, scope.parent_id.as_str())])
            .send()
            .await
            .map_err(transport_error)?;
        let body: Value = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| DomainError::Internal(format!("Invalid list body: {}", e)))?;

        parse_list(body)
    }

    async fn set_position(&self, scope: &ScopeContext, id: &str, position: u32) -> DomainResult<()> {
        let url = self.entity_url(scope, id);
        log::debug!("PUT {} sortOrder={}", url, position);

        let response = self
            .client
            .put(&url)
            .json(&SortOrderBody { sort_order: position })
            .send()
            .await
            .map_err(transport_error)?;
        ensure_success(response).await?;
        Ok(())
    }
}
