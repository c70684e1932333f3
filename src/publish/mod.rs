mod progress;

pub use progress::setup_progress_bar;

use bytesize::ByteSize;
use indicatif::ProgressBar;
use log::{debug, info, warn};
use std::time::Instant;

use crate::index::SearchIndex;
use crate::source::SourceItem;

/// Counts for one publish pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishOutcome {
    pub attempted: u64,
    pub failed: u64,
    /// Serialized size of the documents that were written successfully.
    pub bytes: u64,
}

impl PublishOutcome {
    pub fn succeeded(&self) -> u64 {
        self.attempted - self.failed
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Upsert every item into `index`, one request at a time, keyed by the item id.
///
/// A failed write is logged and counted; the remaining items are still written.
pub async fn publish<D: SearchIndex + ?Sized>(
    dest: &D,
    items: &[SourceItem],
    index: &str,
    progress: Option<&ProgressBar>,
) -> PublishOutcome {
    debug!("Publishing {} documents to {}", items.len(), index);
    let start_time = Instant::now();
    let mut outcome = PublishOutcome::default();

    for item in items {
        outcome.attempted += 1;
        match dest.upsert_document(index, &item.id, &item.body).await {
            Ok(()) => {
                outcome.bytes += serde_json::to_vec(&item.body).map_or(0, |b| b.len() as u64);
            }
            Err(e) => {
                outcome.failed += 1;
                warn!("Failed to publish document {}: {}", item.id, e);
            }
        }

        if let Some(pb) = progress {
            pb.inc(1);
            pb.set_message(format!("{} failed", outcome.failed));
        }
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    info!(
        "Published {}/{} documents ({}) to {} in {:.2?}",
        outcome.succeeded(),
        outcome.attempted,
        ByteSize(outcome.bytes),
        index,
        start_time.elapsed()
    );
    outcome
}
