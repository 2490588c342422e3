//! Orchestration of the store, the ingestion adapters, and the publisher.
//!
//! Both the HTTP handlers and the scheduler dispatcher call into one shared
//! [`Pipeline`]; nothing here talks HTTP.

use std::sync::Arc;

use dripfeed_publisher::{PublishError, Publisher};
use dripfeed_sources::{LinesFile, TaskSource};
use dripfeed_store::{Ledger, PostedItem, QueueItem, QueueManager};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::PipelineError;

/// `taskName` recorded for items read from the lines file.
pub const FILE_TASK_NAME: &str = "File";
/// `taskName` recorded for items added through the API.
pub const MANUAL_TASK_NAME: &str = "Manual";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullReport {
    pub added: usize,
    pub queue_size: usize,
}

#[derive(Debug)]
pub struct SyncReport {
    pub tracker: Result<PullReport, PipelineError>,
    pub file: Result<PullReport, PipelineError>,
}

#[derive(Debug)]
pub enum PostOutcome {
    /// Nothing was queued.
    Empty,
    Posted {
        item: QueueItem,
        post_id: String,
        remaining: usize,
    },
    /// The publisher refused the post; the item is back at the head.
    Failed { item: QueueItem, error: PublishError },
}

pub struct Pipeline {
    queue: QueueManager,
    ledger: Ledger,
    tracker: Arc<dyn TaskSource>,
    lines: LinesFile,
    publisher: Arc<dyn Publisher>,
    /// Held for a whole tracker pull so overlapping pulls cannot both see an
    /// item as unprocessed. Never held by store operations.
    tracker_pull: Mutex<()>,
    file_pull: Mutex<()>,
}

impl Pipeline {
    pub fn new(
        queue: QueueManager,
        ledger: Ledger,
        tracker: Arc<dyn TaskSource>,
        lines: LinesFile,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            queue,
            ledger,
            tracker,
            lines,
            publisher,
            tracker_pull: Mutex::new(()),
            file_pull: Mutex::new(()),
        }
    }

    pub fn queue(&self) -> &QueueManager {
        &self.queue
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn is_dry_run(&self) -> bool {
        self.publisher.is_dry_run()
    }

    /// Enqueue every done tracker item not yet in the ledger.
    ///
    /// Items are marked processed only after their enqueue succeeded, so a
    /// failure part-way leaves the rest to be picked up by the next pull.
    pub async fn pull_tracker(&self) -> Result<PullReport, PipelineError> {
        let _pull = self.tracker_pull.lock().await;
        let source = self.tracker.name();

        let items = self.tracker.fetch_done_items().await?;
        let mut added = 0;
        for item in items {
            if self.ledger.is_processed(&item.id)? {
                continue;
            }

            let text = self.tracker.format_text(&item).await;
            let entry = QueueItem::new(
                item.id.clone(),
                self.tracker.task_name(&item),
                text,
                self.tracker.external_url(&item),
            );
            self.queue.add_to_queue(entry)?;
            self.ledger.mark_processed(&item.id)?;
            added += 1;
        }

        let queue_size = self.queue.get_queue_size()?;
        info!(source, added, queue_size, "tracker pull finished");
        Ok(PullReport { added, queue_size })
    }

    /// Enqueue lines appended to the lines file since the last read.
    pub async fn pull_file(&self) -> Result<PullReport, PipelineError> {
        let _pull = self.file_pull.lock().await;

        let fresh = self.lines.fetch_new_lines()?;
        let added = fresh.len();
        for line in fresh {
            self.queue
                .add_to_queue(QueueItem::new(line.id, FILE_TASK_NAME, line.text, None))?;
        }

        let queue_size = self.queue.get_queue_size()?;
        info!(added, queue_size, "file pull finished");
        Ok(PullReport { added, queue_size })
    }

    /// Pull every source. A failing source does not stop the others.
    pub async fn sync_all(&self) -> SyncReport {
        let tracker = self.pull_tracker().await;
        if let Err(e) = &tracker {
            warn!(error = %e, code = e.code(), "tracker sync failed");
        }
        let file = self.pull_file().await;
        if let Err(e) = &file {
            warn!(error = %e, code = e.code(), "file sync failed");
        }
        SyncReport { tracker, file }
    }

    /// Publish the head of the queue.
    ///
    /// On publisher failure the item goes back to the head unchanged, so it
    /// is retried before anything else on the next run.
    pub async fn post_next(&self) -> Result<PostOutcome, PipelineError> {
        let Some(item) = self.queue.pop_queue()? else {
            info!("post skipped, queue is empty");
            return Ok(PostOutcome::Empty);
        };

        match self.publisher.post_text(&item.text).await {
            Ok(post_id) => {
                self.queue
                    .add_to_posted(PostedItem::new(item.clone(), post_id.clone()))?;
                let remaining = self.queue.get_queue_size()?;
                info!(item_id = %item.id, %post_id, remaining, "item posted");
                Ok(PostOutcome::Posted {
                    item,
                    post_id,
                    remaining,
                })
            }
            Err(error) => {
                warn!(item_id = %item.id, error = %error, "post failed, returning item to queue");
                self.queue.return_to_queue(item.clone())?;
                Ok(PostOutcome::Failed { item, error })
            }
        }
    }

    /// Queue operator-written text at the tail.
    pub fn add_manual(&self, text: &str) -> Result<QueueItem, PipelineError> {
        let text = non_blank(text)?;
        let item = QueueItem::new(uuid::Uuid::new_v4().to_string(), MANUAL_TASK_NAME, text, None);
        self.queue.add_to_queue(item.clone())?;
        Ok(item)
    }

    /// Replace the text of a queued item. `Ok(false)` when `id` is not queued.
    pub fn edit_text(&self, id: &str, text: &str) -> Result<bool, PipelineError> {
        let text = non_blank(text)?;
        Ok(self.queue.update_queue_item(id, text)?)
    }
}

fn non_blank(text: &str) -> Result<&str, PipelineError> {
    match text.trim() {
        "" => Err(PipelineError::BlankText),
        trimmed => Ok(trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fixture, StubSource};
    use dripfeed_sources::SourceItem;

    fn item(id: &str, title: &str) -> SourceItem {
        SourceItem {
            id: id.into(),
            title: Some(title.into()),
        }
    }

    #[tokio::test]
    async fn tracker_pull_enqueues_and_marks() {
        let fx = Fixture::new(StubSource::with(vec![item("a", "First"), item("b", "Second")]));

        let report = fx.pipeline.pull_tracker().await.unwrap();
        assert_eq!(report, PullReport { added: 2, queue_size: 2 });

        let queue = fx.pipeline.queue().get_queue().unwrap();
        assert_eq!(queue[0].id, "a");
        assert_eq!(queue[0].task_name, "First");
        assert_eq!(queue[0].text, "text for a");
        assert_eq!(queue[0].notion_url.as_deref(), Some("https://tracker.test/a"));
        assert!(fx.pipeline.ledger().is_processed("a").unwrap());
        assert!(fx.pipeline.ledger().is_processed("b").unwrap());
    }

    #[tokio::test]
    async fn processed_items_are_skipped() {
        let fx = Fixture::new(StubSource::with(vec![item("x1", "Done thing")]));

        fx.pipeline.pull_tracker().await.unwrap();
        // Deleting from the queue does not make the item eligible again.
        fx.pipeline.queue().delete_queue_item("x1").unwrap();
        let report = fx.pipeline.pull_tracker().await.unwrap();

        assert_eq!(report.added, 0);
        assert_eq!(fx.pipeline.queue().get_queue_size().unwrap(), 0);
        assert_eq!(fx.source.formatted(), 1);
    }

    #[tokio::test]
    async fn overlapping_tracker_pulls_do_not_duplicate() {
        let items = (0..10).map(|i| item(&format!("t{i}"), "Task")).collect();
        let fx = Fixture::new(StubSource::with(items));

        let (a, b) = tokio::join!(fx.pipeline.pull_tracker(), fx.pipeline.pull_tracker());
        assert_eq!(a.unwrap().added + b.unwrap().added, 10);
        assert_eq!(fx.pipeline.queue().get_queue_size().unwrap(), 10);
    }

    #[tokio::test]
    async fn source_failure_leaves_state_untouched() {
        let fx = Fixture::new(StubSource::failing());

        let err = fx.pipeline.pull_tracker().await.unwrap_err();
        assert_eq!(err.code(), "SOURCE_API_ERROR");
        assert_eq!(fx.pipeline.queue().get_queue_size().unwrap(), 0);
        assert_eq!(fx.pipeline.ledger().processed_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn file_pull_enqueues_new_lines() {
        let fx = Fixture::new(StubSource::with(vec![]));
        fx.write_lines("# ideas\nfirst\n\nsecond\n");

        let report = fx.pipeline.pull_file().await.unwrap();
        assert_eq!(report.added, 2);

        let queue = fx.pipeline.queue().get_queue().unwrap();
        assert_eq!(queue[1].text, "second");
        assert_eq!(queue[1].task_name, FILE_TASK_NAME);
        assert!(queue[1].notion_url.is_none());

        assert_eq!(fx.pipeline.pull_file().await.unwrap().added, 0);
    }

    #[tokio::test]
    async fn sync_all_keeps_going_after_a_failure() {
        let fx = Fixture::new(StubSource::failing());
        fx.write_lines("only line\n");

        let report = fx.pipeline.sync_all().await;
        assert!(report.tracker.is_err());
        assert_eq!(report.file.unwrap().added, 1);
    }

    #[tokio::test]
    async fn post_next_on_empty_queue() {
        let fx = Fixture::new(StubSource::with(vec![]));
        assert!(matches!(
            fx.pipeline.post_next().await.unwrap(),
            PostOutcome::Empty
        ));
        assert_eq!(fx.pipeline.queue().get_posted_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn post_next_moves_head_to_posted() {
        let fx = Fixture::new(StubSource::with(vec![]));
        let first = fx.pipeline.add_manual("one").unwrap();
        fx.pipeline.add_manual("two").unwrap();

        match fx.pipeline.post_next().await.unwrap() {
            PostOutcome::Posted {
                item,
                post_id,
                remaining,
            } => {
                assert_eq!(item, first);
                assert_eq!(post_id, "post-1");
                assert_eq!(remaining, 1);
            }
            other => panic!("expected Posted, got {other:?}"),
        }

        let posted = fx.pipeline.queue().get_posted().unwrap();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].item, first);
        assert_eq!(posted[0].post_id, "post-1");
        assert_eq!(fx.publisher.sent(), vec!["one".to_string()]);
    }

    #[tokio::test]
    async fn failed_post_returns_item_to_head() {
        let fx = Fixture::new(StubSource::with(vec![]));
        let first = fx.pipeline.add_manual("one").unwrap();
        fx.pipeline.add_manual("two").unwrap();
        fx.publisher.fail_next(true);

        match fx.pipeline.post_next().await.unwrap() {
            PostOutcome::Failed { item, error } => {
                assert_eq!(item, first);
                assert_eq!(error.code(), "PUBLISH_REJECTED");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
        assert_eq!(fx.pipeline.queue().peek_queue().unwrap(), Some(first.clone()));
        assert_eq!(fx.pipeline.queue().get_queue_size().unwrap(), 2);
        assert_eq!(fx.pipeline.queue().get_posted_count().unwrap(), 0);

        // The same item goes out on the next run.
        fx.publisher.fail_next(false);
        match fx.pipeline.post_next().await.unwrap() {
            PostOutcome::Posted { item, .. } => assert_eq!(item, first),
            other => panic!("expected Posted, got {other:?}"),
        }
    }

    #[test]
    fn manual_text_is_trimmed_and_required() {
        let fx = Fixture::new(StubSource::with(vec![]));

        let item = fx.pipeline.add_manual("  hello world \n").unwrap();
        assert_eq!(item.text, "hello world");
        assert_eq!(item.task_name, MANUAL_TASK_NAME);
        assert!(matches!(
            fx.pipeline.add_manual("   "),
            Err(PipelineError::BlankText)
        ));
        assert_eq!(fx.pipeline.queue().get_queue_size().unwrap(), 1);
    }

    #[test]
    fn edit_text_validates_and_reports_missing() {
        let fx = Fixture::new(StubSource::with(vec![]));
        let item = fx.pipeline.add_manual("draft").unwrap();

        assert!(fx.pipeline.edit_text(&item.id, " final ").unwrap());
        assert_eq!(fx.pipeline.queue().get_queue().unwrap()[0].text, "final");
        assert!(!fx.pipeline.edit_text("nope", "x").unwrap());
        assert!(matches!(
            fx.pipeline.edit_text(&item.id, ""),
            Err(PipelineError::BlankText)
        ));
    }
}
