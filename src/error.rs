use thiserror::Error;

/// Failures of the remote calls made during a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Contentful request failed: {0}")]
    Source(#[from] reqwest::Error),

    #[error("Contentful returned HTTP {status}: {body}")]
    SourceStatus { status: u16, body: String },

    #[error("Failed to decode Contentful response: {0}")]
    SourceDecode(#[from] serde_json::Error),

    #[error("No entries of content type '{content_type}' found")]
    EmptyResult { content_type: String },

    #[error("Elasticsearch request failed: {0}")]
    Destination(#[from] elasticsearch::Error),

    #[error("Elasticsearch returned HTTP {status}: {body}")]
    DestinationStatus { status: u16, body: String },

    #[error("Index '{index}' does not exist and index creation is disabled")]
    IndexMissing { index: String },
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;
