use log::{debug, info};

use crate::config::RunConfig;
use crate::index::{IndexActionKind, IndexFlags, SearchIndex, ensure_index};
use crate::publish::{PublishOutcome, publish, setup_progress_bar};
use crate::report::Reporter;
use crate::source::{ContentSource, fetch_items};

/// Where a run stopped before publishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortStage {
    /// Source or destination unreachable, or credentials rejected.
    Connectivity,
    /// The entries request failed or returned nothing.
    Fetch,
    /// The index is not usable and publishing was skipped.
    Index,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Completed(PublishOutcome),
    Aborted(AbortStage),
}

impl SyncStatus {
    /// 0 only for a completed publish without failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            SyncStatus::Completed(outcome) if outcome.is_success() => 0,
            _ => 1,
        }
    }
}

/// Run the fetch-then-publish pipeline once and report each step.
///
/// Every remote call is awaited in turn; the only overlap is the pair of
/// capability checks at the start.
pub async fn run_sync<S, D>(
    config: &RunConfig,
    source: &S,
    dest: &D,
    reporter: &Reporter,
) -> SyncStatus
where
    S: ContentSource + ?Sized,
    D: SearchIndex + ?Sized,
{
    let missing = config.missing_settings();
    if missing.is_empty() {
        reporter.step(true, "Environment configured");
    } else {
        reporter.step(false, format!("Environment incomplete, missing {}", missing.join(", ")));
    }

    debug!("Running capability checks");
    let (source_check, dest_check) = futures::join!(source.check(), dest.health());
    reporter.step_result(&source_check, "Contentful space reachable");
    match &dest_check {
        Ok(status) => reporter.step(
            true,
            format!("Elasticsearch reachable (cluster health: {})", status),
        ),
        Err(_) => reporter.step_result(&dest_check, "Elasticsearch reachable"),
    }
    if source_check.is_err() || dest_check.is_err() {
        info!("Aborting sync, capability check failed");
        return SyncStatus::Aborted(AbortStage::Connectivity);
    }

    let page = match fetch_items(source, &config.content_type, config.locale.as_deref()).await {
        Ok(page) => {
            reporter.step(
                true,
                format!(
                    "Found {} '{}' entries in {}",
                    page.items.len(),
                    config.content_type,
                    config.environment
                ),
            );
            page
        }
        Err(e) => {
            reporter.step(false, format!("Fetching '{}' entries, abort sync", config.content_type));
            reporter.detail(e);
            return SyncStatus::Aborted(AbortStage::Fetch);
        }
    };

    if config.summary {
        reporter.item_table(&page.items);
    }

    let flags = IndexFlags {
        create: config.create_index,
        reset: config.reset,
    };
    match ensure_index(dest, &config.index_name, flags).await {
        Ok(readiness) => {
            reporter.step(
                true,
                format!(
                    "Index {} {}",
                    config.index_name,
                    if readiness.existed { "exists" } else { "does not exist" }
                ),
            );
            for action in &readiness.actions {
                let verb = match action.kind {
                    IndexActionKind::Delete => "Deleted",
                    IndexActionKind::Create => "Created",
                };
                reporter.step(action.succeeded(), format!("{} index {}", verb, config.index_name));
                if let Err(e) = &action.result {
                    reporter.detail(e);
                }
            }
        }
        Err(e) => {
            reporter.step(false, format!("Index {} not ready, nothing published", config.index_name));
            reporter.detail(e);
            return SyncStatus::Aborted(AbortStage::Index);
        }
    }

    let progress = (!config.quiet && !config.verbose)
        .then(|| setup_progress_bar(page.items.len() as u64));
    let outcome = publish(dest, &page.items, &config.index_name, progress.as_ref()).await;
    reporter.publish_summary(&config.index_name, &outcome);

    SyncStatus::Completed(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code() {
        let clean = PublishOutcome {
            attempted: 2,
            failed: 0,
            bytes: 10,
        };
        let partial = PublishOutcome {
            attempted: 2,
            failed: 1,
            bytes: 5,
        };

        assert_eq!(SyncStatus::Completed(clean).exit_code(), 0);
        assert_eq!(SyncStatus::Completed(partial).exit_code(), 1);
        assert_eq!(SyncStatus::Aborted(AbortStage::Connectivity).exit_code(), 1);
        assert_eq!(SyncStatus::Aborted(AbortStage::Fetch).exit_code(), 1);
        assert_eq!(SyncStatus::Aborted(AbortStage::Index).exit_code(), 1);
    }
}
