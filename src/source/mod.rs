mod contentful;

pub use contentful::ContentfulClient;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{SyncError, SyncResult};

/// Upper bound on entries fetched per run. Only a single page is read.
pub const MAX_ITEMS: u32 = 1000;

/// Query for one page of entries within the client's environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryQuery {
    pub content_type: String,
    pub skip: u32,
    pub limit: u32,
    pub locale: Option<String>,
}

/// One fetched entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceItem {
    pub id: String,
    pub fields: Map<String, Value>,
    /// The entry exactly as the source returned it, used as the document body.
    pub body: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<SourceItem>,
    /// Number of matching entries at the source, which may exceed `items.len()`.
    pub total: u64,
}

#[derive(Deserialize)]
struct EntrySys {
    id: String,
}

#[derive(Deserialize)]
struct EntryShape {
    sys: EntrySys,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl SourceItem {
    pub fn from_entry(entry: Value) -> SyncResult<Self> {
        let shape: EntryShape = serde_json::from_value(entry.clone())?;
        Ok(SourceItem {
            id: shape.sys.id,
            fields: shape.fields,
            body: entry,
        })
    }

    /// Display name: the `name` field, else `title`.
    ///
    /// Localized fields (`locale=*`) are maps of locale to value; the first
    /// string found is used.
    pub fn display_name(&self) -> Option<&str> {
        ["name", "title"]
            .iter()
            .filter_map(|key| self.fields.get(*key))
            .find_map(|value| match value {
                Value::String(s) => Some(s.as_str()),
                Value::Object(localized) => localized.values().find_map(Value::as_str),
                _ => None,
            })
    }
}

impl Page {
    /// Parse an entries collection response (`{ "items": [...], "total": n }`).
    pub fn from_response(response: Value) -> SyncResult<Self> {
        #[derive(Deserialize)]
        struct Collection {
            #[serde(default)]
            items: Vec<Value>,
            #[serde(default)]
            total: Option<u64>,
        }

        let collection: Collection = serde_json::from_value(response)?;
        let items = collection
            .items
            .into_iter()
            .map(SourceItem::from_entry)
            .collect::<SyncResult<Vec<_>>>()?;
        let total = collection.total.unwrap_or(items.len() as u64);
        Ok(Page { items, total })
    }
}

/// Read-only access to a content source, scoped to one space environment.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Confirm the source is reachable and the credentials are accepted.
    async fn check(&self) -> SyncResult<()>;

    async fn get_entries(&self, query: &EntryQuery) -> SyncResult<Page>;
}

/// Fetch the single bounded page of entries for `content_type`.
///
/// An empty page is reported as `SyncError::EmptyResult`.
pub async fn fetch_items<S: ContentSource + ?Sized>(
    source: &S,
    content_type: &str,
    locale: Option<&str>,
) -> SyncResult<Page> {
    let query = EntryQuery {
        content_type: content_type.to_string(),
        skip: 0,
        limit: MAX_ITEMS,
        locale: locale.map(str::to_string),
    };
    debug!("Fetching entries: {:?}", query);

    let page = source.get_entries(&query).await?;
    if page.items.is_empty() {
        return Err(SyncError::EmptyResult {
            content_type: content_type.to_string(),
        });
    }

    info!(
        "Fetched {} of {} '{}' entries",
        page.items.len(),
        page.total,
        content_type
    );
    if page.total > page.items.len() as u64 {
        warn!(
            "Only the first {} entries are synced, {} more exist at the source",
            page.items.len(),
            page.total - page.items.len() as u64
        );
    }

    Ok(page)
}
