//! In-process stand-ins for the tracker and the publisher, plus a pipeline
//! wired to documents in a temp directory.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dripfeed_publisher::{PublishError, Publisher};
use dripfeed_sources::{LinesFile, SourceError, SourceItem, TaskSource};
use dripfeed_store::{Ledger, QueueManager};
use tempfile::TempDir;

use crate::pipeline::Pipeline;

pub struct StubSource {
    items: Vec<SourceItem>,
    fail: bool,
    formatted: AtomicUsize,
}

impl StubSource {
    pub fn with(items: Vec<SourceItem>) -> Self {
        Self {
            items,
            fail: false,
            formatted: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::with(Vec::new())
        }
    }

    pub fn formatted(&self) -> usize {
        self.formatted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskSource for StubSource {
    fn name(&self) -> &str {
        "stub"
    }

    async fn fetch_done_items(&self) -> Result<Vec<SourceItem>, SourceError> {
        tokio::task::yield_now().await;
        if self.fail {
            return Err(SourceError::Api {
                status: 503,
                message: "tracker unavailable".into(),
            });
        }
        Ok(self.items.clone())
    }

    async fn format_text(&self, item: &SourceItem) -> String {
        self.formatted.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        format!("text for {}", item.id)
    }

    fn external_url(&self, item: &SourceItem) -> Option<String> {
        Some(format!("https://tracker.test/{}", item.id))
    }
}

#[derive(Default)]
pub struct StubPublisher {
    fail: AtomicBool,
    sent: Mutex<Vec<String>>,
}

impl StubPublisher {
    pub fn fail_next(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for StubPublisher {
    fn name(&self) -> &str {
        "stub"
    }

    async fn post_text(&self, text: &str) -> Result<String, PublishError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PublishError::Rejected("stub refused".into()));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(text.to_string());
        Ok(format!("post-{}", sent.len()))
    }
}

pub struct Fixture {
    pub dir: TempDir,
    pub pipeline: Arc<Pipeline>,
    pub source: Arc<StubSource>,
    pub publisher: Arc<StubPublisher>,
}

impl Fixture {
    pub fn new(source: StubSource) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(source);
        let publisher = Arc::new(StubPublisher::default());

        let pipeline = Pipeline::new(
            QueueManager::new(dir.path().join("schedule.json")),
            Ledger::new(dir.path().join("sync-state.json")),
            source.clone(),
            LinesFile::new(dir.path().join("tweets.txt"), dir.path().join("file-state.json")),
            publisher.clone(),
        );

        Self {
            dir,
            pipeline: Arc::new(pipeline),
            source,
            publisher,
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write_lines(&self, content: &str) {
        std::fs::write(self.path("tweets.txt"), content).unwrap();
    }
}
