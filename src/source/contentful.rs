use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Response};
use serde_json::Value;
use url::Url;

use super::{ContentSource, EntryQuery, Page};
use crate::config::SourceSettings;
use crate::error::{SyncError, SyncResult};

/// Contentful Content Delivery (or Preview) API client for one space environment.
#[derive(Clone)]
pub struct ContentfulClient {
    client: Client,
    access_token: String,
    space_url: Url,
    entries_url: Url,
}

impl ContentfulClient {
    pub fn new(settings: &SourceSettings, environment: &str) -> Result<Self> {
        let space = settings.space_id.as_deref().unwrap_or_default();
        let invalid_host = || anyhow!("Invalid Contentful host: {}", settings.host);

        // Ids are pushed as path segments so they are percent-encoded
        let mut space_url = Url::parse(&format!("https://{}", settings.host))
            .with_context(invalid_host)?;
        space_url
            .path_segments_mut()
            .map_err(|_| invalid_host())?
            .clear()
            .push("spaces")
            .push(space);

        let mut entries_url = space_url.clone();
        entries_url
            .path_segments_mut()
            .map_err(|_| invalid_host())?
            .push("environments")
            .push(environment)
            .push("entries");
        debug!("Contentful entries endpoint: {}", entries_url);

        let client = Client::builder()
            .user_agent(concat!("contentsync-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build Contentful HTTP client")?;

        Ok(Self {
            client,
            access_token: settings.access_token.clone().unwrap_or_default(),
            space_url,
            entries_url,
        })
    }

    pub fn entries_url(&self, query: &EntryQuery) -> Url {
        let mut url = self.entries_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("content_type", &query.content_type)
                .append_pair("skip", &query.skip.to_string())
                .append_pair("limit", &query.limit.to_string());
            if let Some(locale) = &query.locale {
                pairs.append_pair("locale", locale);
            }
        }
        url
    }

    async fn get(&self, url: Url) -> SyncResult<Response> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::SourceStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ContentSource for ContentfulClient {
    async fn check(&self) -> SyncResult<()> {
        debug!("Checking Contentful space at {}", self.space_url);
        self.get(self.space_url.clone()).await?;
        Ok(())
    }

    async fn get_entries(&self, query: &EntryQuery) -> SyncResult<Page> {
        let url = self.entries_url(query);
        debug!("GET {}", url);

        let bytes = self.get(url).await?.bytes().await?;
        debug!("Read {} bytes of entries", bytes.len());

        let response: Value = serde_json::from_slice(&bytes)?;
        Page::from_response(response)
    }
}
