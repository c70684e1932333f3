use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::prelude::*;
use elasticsearch::{
    Elasticsearch, IndexParts,
    cluster::ClusterHealthParts,
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts},
};
use http::header::{ACCEPT_ENCODING, AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::Value;
use std::time::Duration;

use crate::config::DestinationSettings;
use crate::error::{SyncError, SyncResult};
use crate::index::SearchIndex;

/// Timeout applied to the cluster health check only.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Create and configure the Elasticsearch client
pub fn create_client(settings: &DestinationSettings) -> Result<Elasticsearch> {
    log::debug!(
        "Setting up Elasticsearch client connection to {}",
        settings.url.as_str()
    );
    let conn_pool = SingleNodeConnectionPool::new(settings.url.clone());
    let mut transport_builder = TransportBuilder::new(conn_pool);

    let mut headers = HeaderMap::new();

    if let (Some(user), Some(pass)) = (settings.username.as_deref(), settings.password.as_deref())
    {
        log::info!("Using basic authentication for user: {}", user);
        let auth_str = format!("{}:{}", user, pass);
        let auth_val = format!("Basic {}", BASE64_STANDARD.encode(auth_str));
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&auth_val)?);
    } else if settings.username.is_some() || settings.password.is_some() {
        log::warn!(
            "Partial basic auth credentials provided (username or password missing), ignoring."
        );
    }

    if !settings.compress {
        log::debug!("Disabling response compression by setting Accept-Encoding: identity");
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
    }

    if !headers.is_empty() {
        transport_builder = transport_builder.headers(headers);
    }

    let transport = transport_builder
        .build()
        .context("Failed to build Elasticsearch transport")?;

    log::debug!("Elasticsearch client created successfully");
    Ok(Elasticsearch::new(transport))
}

/// `SearchIndex` backed by a live cluster.
#[derive(Clone)]
pub struct ElasticsearchIndex {
    client: Elasticsearch,
}

impl ElasticsearchIndex {
    pub fn new(client: Elasticsearch) -> Self {
        Self { client }
    }

    pub fn from_settings(settings: &DestinationSettings) -> Result<Self> {
        Ok(Self::new(create_client(settings)?))
    }
}

/// Turn a non-2xx response into `SyncError::DestinationStatus`.
async fn ensure_success(response: Response) -> SyncResult<Response> {
    let status = response.status_code();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SyncError::DestinationStatus {
        status: status.as_u16(),
        body,
    })
}

async fn acknowledged(response: Response) -> SyncResult<bool> {
    let body: Value = ensure_success(response).await?.json().await?;
    Ok(body["acknowledged"].as_bool().unwrap_or(false))
}

#[async_trait]
impl SearchIndex for ElasticsearchIndex {
    async fn health(&self) -> SyncResult<String> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .request_timeout(HEALTH_TIMEOUT)
            .send()
            .await?;
        let body: Value = ensure_success(response).await?.json().await?;
        Ok(body["status"].as_str().unwrap_or("unknown").to_string())
    }

    async fn index_exists(&self, index: &str) -> SyncResult<bool> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            _ => ensure_success(response).await.map(|_| true),
        }
    }

    async fn create_index(&self, index: &str) -> SyncResult<bool> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .send()
            .await?;
        acknowledged(response).await
    }

    async fn delete_index(&self, index: &str) -> SyncResult<bool> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[index]))
            .send()
            .await?;
        acknowledged(response).await
    }

    async fn upsert_document(&self, index: &str, id: &str, body: &Value) -> SyncResult<()> {
        let response = self
            .client
            .index(IndexParts::IndexId(index, id))
            .body(body)
            .send()
            .await?;
        let response: Value = ensure_success(response).await?.json().await?;
        log::debug!(
            "Document {} in {}: {}",
            id,
            index,
            response["result"].as_str().unwrap_or("unknown")
        );
        Ok(())
    }
}
