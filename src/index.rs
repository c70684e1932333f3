use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::Value;

use crate::error::{SyncError, SyncResult};

/// The destination search engine, as seen by the sync pipeline.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Cluster health status (`green`, `yellow` or `red`).
    async fn health(&self) -> SyncResult<String>;

    async fn index_exists(&self, index: &str) -> SyncResult<bool>;

    /// Returns whether the cluster acknowledged the creation.
    async fn create_index(&self, index: &str) -> SyncResult<bool>;

    /// Returns whether the cluster acknowledged the deletion.
    async fn delete_index(&self, index: &str) -> SyncResult<bool>;

    /// Create or replace the document `id` in `index`.
    async fn upsert_document(&self, index: &str, id: &str, body: &Value) -> SyncResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexFlags {
    pub create: bool,
    pub reset: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexActionKind {
    Delete,
    Create,
}

/// A best-effort delete or create; a failure here does not abort the run.
#[derive(Debug)]
pub struct IndexAction {
    pub kind: IndexActionKind,
    pub result: SyncResult<bool>,
}

impl IndexAction {
    pub fn succeeded(&self) -> bool {
        matches!(self.result, Ok(true))
    }
}

#[derive(Debug)]
pub struct IndexReadiness {
    pub existed: bool,
    pub actions: Vec<IndexAction>,
}

/// Make sure `index` is ready to receive documents.
///
/// | exists | reset | create | action             |
/// |--------|-------|--------|--------------------|
/// | yes    | yes   | any    | delete, then create |
/// | yes    | no    | any    | none               |
/// | no     | any   | yes    | create             |
/// | no     | any   | no     | abort              |
///
/// Returns `Err` only when publishing must not happen: the existence check
/// failed, or the index is missing and creation is disabled.
pub async fn ensure_index<D: SearchIndex + ?Sized>(
    dest: &D,
    index: &str,
    flags: IndexFlags,
) -> SyncResult<IndexReadiness> {
    let existed = dest.index_exists(index).await?;
    debug!("Index {} exists: {}", index, existed);

    let mut actions = Vec::new();
    match (existed, flags.reset, flags.create) {
        (true, true, _) => {
            info!("Resetting index {}", index);
            actions.push(run_action(dest, index, IndexActionKind::Delete).await);
            actions.push(run_action(dest, index, IndexActionKind::Create).await);
        }
        (true, false, _) => {}
        (false, _, true) => {
            info!("Creating index {}", index);
            actions.push(run_action(dest, index, IndexActionKind::Create).await);
        }
        (false, _, false) => {
            return Err(SyncError::IndexMissing {
                index: index.to_string(),
            });
        }
    }

    Ok(IndexReadiness { existed, actions })
}

async fn run_action<D: SearchIndex + ?Sized>(
    dest: &D,
    index: &str,
    kind: IndexActionKind,
) -> IndexAction {
    let result = match kind {
        IndexActionKind::Delete => dest.delete_index(index).await,
        IndexActionKind::Create => dest.create_index(index).await,
    };
    match &result {
        Ok(true) => debug!("{:?} of index {} acknowledged", kind, index),
        Ok(false) => warn!("{:?} of index {} was not acknowledged", kind, index),
        Err(e) => warn!("{:?} of index {} failed: {}", kind, index, e),
    }
    IndexAction { kind, result }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingIndex {
        exists: bool,
        fail_exists: bool,
        fail_create: bool,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingIndex {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl SearchIndex for RecordingIndex {
        async fn health(&self) -> SyncResult<String> {
            Ok("green".into())
        }

        async fn index_exists(&self, index: &str) -> SyncResult<bool> {
            self.record(format!("exists {}", index));
            if self.fail_exists {
                return Err(SyncError::DestinationStatus {
                    status: 503,
                    body: "cluster_block_exception".into(),
                });
            }
            Ok(self.exists)
        }

        async fn create_index(&self, index: &str) -> SyncResult<bool> {
            self.record(format!("create {}", index));
            if self.fail_create {
                return Err(SyncError::DestinationStatus {
                    status: 400,
                    body: "resource_already_exists_exception".into(),
                });
            }
            Ok(true)
        }

        async fn delete_index(&self, index: &str) -> SyncResult<bool> {
            self.record(format!("delete {}", index));
            Ok(true)
        }

        async fn upsert_document(&self, _index: &str, _id: &str, _body: &Value) -> SyncResult<()> {
            unreachable!("index manager never writes documents")
        }
    }

    const DEFAULT: IndexFlags = IndexFlags {
        create: true,
        reset: false,
    };

    #[tokio::test]
    async fn test_existing_index_is_left_alone() {
        let dest = RecordingIndex {
            exists: true,
            ..Default::default()
        };
        let readiness = ensure_index(&dest, "idx", DEFAULT).await.unwrap();
        assert!(readiness.existed);
        assert!(readiness.actions.is_empty());
        assert_eq!(dest.calls(), vec!["exists idx"]);
    }

    #[tokio::test]
    async fn test_missing_index_is_created() {
        let dest = RecordingIndex::default();
        let readiness = ensure_index(&dest, "idx", DEFAULT).await.unwrap();
        assert!(!readiness.existed);
        assert_eq!(readiness.actions.len(), 1);
        assert!(readiness.actions[0].succeeded());
        assert_eq!(dest.calls(), vec!["exists idx", "create idx"]);
    }

    #[tokio::test]
    async fn test_missing_index_without_create_aborts() {
        let dest = RecordingIndex::default();
        let flags = IndexFlags {
            create: false,
            reset: false,
        };
        let err = ensure_index(&dest, "idx", flags).await.unwrap_err();
        assert!(matches!(err, SyncError::IndexMissing { .. }));
        assert_eq!(dest.calls(), vec!["exists idx"]);
    }

    #[tokio::test]
    async fn test_reset_deletes_then_creates() {
        let dest = RecordingIndex {
            exists: true,
            ..Default::default()
        };
        let flags = IndexFlags {
            create: false,
            reset: true,
        };
        let readiness = ensure_index(&dest, "idx", flags).await.unwrap();
        assert_eq!(dest.calls(), vec!["exists idx", "delete idx", "create idx"]);
        let kinds: Vec<_> = readiness.actions.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![IndexActionKind::Delete, IndexActionKind::Create]);
    }

    #[tokio::test]
    async fn test_reset_on_missing_index_just_creates() {
        let dest = RecordingIndex::default();
        let flags = IndexFlags {
            create: true,
            reset: true,
        };
        ensure_index(&dest, "idx", flags).await.unwrap();
        assert_eq!(dest.calls(), vec!["exists idx", "create idx"]);
    }

    #[tokio::test]
    async fn test_failed_create_is_best_effort() {
        let dest = RecordingIndex {
            fail_create: true,
            ..Default::default()
        };
        let readiness = ensure_index(&dest, "idx", DEFAULT).await.unwrap();
        assert_eq!(readiness.actions.len(), 1);
        assert!(!readiness.actions[0].succeeded());
    }

    #[tokio::test]
    async fn test_failed_existence_check_aborts() {
        let dest = RecordingIndex {
            fail_exists: true,
            ..Default::default()
        };
        let flags = IndexFlags {
            create: true,
            reset: true,
        };
        let err = ensure_index(&dest, "idx", flags).await.unwrap_err();
        assert!(matches!(err, SyncError::DestinationStatus { status: 503, .. }));
        assert_eq!(dest.calls(), vec!["exists idx"], "no create or delete after a failed check");
    }
}
