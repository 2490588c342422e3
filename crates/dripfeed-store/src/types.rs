use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pending post awaiting publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    /// Source-stable id (tracker page id) or a generated UUID.
    pub id: String,
    /// Label of where the item came from: the task title, `"File"`, or `"Manual"`.
    pub task_name: String,
    /// Post body.
    pub text: String,
    pub added_at: DateTime<Utc>,
    /// Link back to the tracker page; `null` for file and manual items.
    pub notion_url: Option<String>,
}

impl QueueItem {
    pub fn new(
        id: impl Into<String>,
        task_name: impl Into<String>,
        text: impl Into<String>,
        notion_url: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            task_name: task_name.into(),
            text: text.into(),
            added_at: Utc::now(),
            notion_url,
        }
    }
}

/// A queue item after successful publication. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostedItem {
    #[serde(flatten)]
    pub item: QueueItem,
    pub posted_at: DateTime<Utc>,
    /// Platform-assigned id of the published post.
    #[serde(rename = "tweetId", alias = "postId")]
    pub post_id: String,
}

impl PostedItem {
    /// Stamp a popped item as posted now.
    pub fn new(item: QueueItem, post_id: impl Into<String>) -> Self {
        Self {
            item,
            posted_at: Utc::now(),
            post_id: post_id.into(),
        }
    }
}

/// The schedule document: pending queue (FIFO) plus append-only history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDocument {
    #[serde(default)]
    pub queue: Vec<QueueItem>,
    #[serde(default)]
    pub posted: Vec<PostedItem>,
}

/// The dedup ledger document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerDocument {
    #[serde(default)]
    pub processed_items: BTreeSet<String>,
}
