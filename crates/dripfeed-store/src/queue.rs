use std::path::PathBuf;

use tracing::{debug, info};

use crate::document::{Change, JsonDocument};
use crate::error::Result;
use crate::types::{PostedItem, QueueItem, ScheduleDocument};

/// FIFO queue of pending posts plus the append-only posted history.
///
/// Item lifecycle: `queued → posted | deleted`, with two self-loops on
/// `queued`: [`update_queue_item`](Self::update_queue_item) edits text in
/// place, [`return_to_queue`](Self::return_to_queue) re-inserts at the head.
///
/// The queue does no dedup of its own; ingestion paths consult the
/// [`Ledger`](crate::Ledger) before adding.
pub struct QueueManager {
    doc: JsonDocument<ScheduleDocument>,
}

impl QueueManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            doc: JsonDocument::new(path),
        }
    }

    pub fn document(&self) -> &JsonDocument<ScheduleDocument> {
        &self.doc
    }

    /// Append to the tail. Duplicate ids and texts are accepted.
    pub fn add_to_queue(&self, item: QueueItem) -> Result<()> {
        let id = item.id.clone();
        let size = self.doc.update(|schedule| {
            schedule.queue.push(item);
            Change::Dirty(schedule.queue.len())
        })?;
        info!(item_id = %id, queue_size = size, "item queued");
        Ok(())
    }

    /// Head of the queue without removing it.
    pub fn peek_queue(&self) -> Result<Option<QueueItem>> {
        Ok(self.doc.load()?.queue.into_iter().next())
    }

    /// Remove and return the head. An empty queue is not written.
    pub fn pop_queue(&self) -> Result<Option<QueueItem>> {
        let popped = self.doc.update(|schedule| {
            if schedule.queue.is_empty() {
                Change::Clean(None)
            } else {
                Change::Dirty(Some(schedule.queue.remove(0)))
            }
        })?;
        if let Some(item) = &popped {
            debug!(item_id = %item.id, "item popped");
        }
        Ok(popped)
    }

    /// Put an item back at the head so it is retried before anything else.
    pub fn return_to_queue(&self, item: QueueItem) -> Result<()> {
        let id = item.id.clone();
        self.doc.update(|schedule| {
            schedule.queue.insert(0, item);
            Change::Dirty(())
        })?;
        info!(item_id = %id, "item returned to head of queue");
        Ok(())
    }

    /// Append to the posted history. No check against queue membership.
    pub fn add_to_posted(&self, item: PostedItem) -> Result<()> {
        let id = item.item.id.clone();
        self.doc.update(|schedule| {
            schedule.posted.push(item);
            Change::Dirty(())
        })?;
        debug!(item_id = %id, "item recorded as posted");
        Ok(())
    }

    /// Replace the text of the queued item with `id`, keeping its position.
    /// Returns whether the item was found.
    pub fn update_queue_item(&self, id: &str, new_text: &str) -> Result<bool> {
        self.doc.update(|schedule| match schedule.queue.iter_mut().find(|q| q.id == id) {
            Some(item) => {
                item.text = new_text.to_string();
                Change::Dirty(true)
            }
            None => Change::Clean(false),
        })
    }

    /// Remove the queued item with `id`. Returns whether anything was removed.
    ///
    /// Only the first match is removed when duplicate ids are queued.
    pub fn delete_queue_item(&self, id: &str) -> Result<bool> {
        self.doc.update(|schedule| {
            match schedule.queue.iter().position(|q| q.id == id) {
                Some(index) => {
                    schedule.queue.remove(index);
                    Change::Dirty(true)
                }
                None => Change::Clean(false),
            }
        })
    }

    pub fn get_queue_size(&self) -> Result<usize> {
        Ok(self.doc.load()?.queue.len())
    }

    pub fn get_posted_count(&self) -> Result<usize> {
        Ok(self.doc.load()?.posted.len())
    }

    pub fn get_queue(&self) -> Result<Vec<QueueItem>> {
        Ok(self.doc.load()?.queue)
    }

    pub fn get_posted(&self) -> Result<Vec<PostedItem>> {
        Ok(self.doc.load()?.posted)
    }

    /// Both lists from a single read.
    pub fn snapshot(&self) -> Result<ScheduleDocument> {
        self.doc.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn manager() -> (TempDir, QueueManager) {
        let dir = tempdir().unwrap();
        let queue = QueueManager::new(dir.path().join("schedule.json"));
        (dir, queue)
    }

    fn item(id: &str) -> QueueItem {
        QueueItem::new(id, "Manual", format!("text {id}"), None)
    }

    fn ids(queue: &QueueManager) -> Vec<String> {
        queue.get_queue().unwrap().into_iter().map(|q| q.id).collect()
    }

    #[test]
    fn fifo_with_return_to_head() {
        let (_dir, queue) = manager();
        for id in ["A", "B", "C"] {
            queue.add_to_queue(item(id)).unwrap();
        }

        let a = queue.pop_queue().unwrap().unwrap();
        assert_eq!(a.id, "A");
        queue.return_to_queue(a.clone()).unwrap();

        let again = queue.pop_queue().unwrap().unwrap();
        assert_eq!(again, a);
        assert_eq!(queue.pop_queue().unwrap().unwrap().id, "B");
    }

    #[test]
    fn pop_on_empty_returns_none_and_leaves_posted_alone() {
        let (_dir, queue) = manager();
        queue
            .add_to_posted(PostedItem::new(item("old"), "1"))
            .unwrap();

        assert_eq!(queue.pop_queue().unwrap(), None);
        assert_eq!(queue.get_posted_count().unwrap(), 1);
        assert_eq!(queue.get_queue_size().unwrap(), 0);
    }

    #[test]
    fn peek_does_not_remove() {
        let (_dir, queue) = manager();
        assert_eq!(queue.peek_queue().unwrap(), None);

        queue.add_to_queue(item("A")).unwrap();
        queue.add_to_queue(item("B")).unwrap();
        assert_eq!(queue.peek_queue().unwrap().unwrap().id, "A");
        assert_eq!(queue.get_queue_size().unwrap(), 2);
    }

    #[test]
    fn size_tracks_adds_pops_and_deletes() {
        let (_dir, queue) = manager();
        for i in 0..6 {
            queue.add_to_queue(item(&i.to_string())).unwrap();
        }
        queue.pop_queue().unwrap();
        queue.pop_queue().unwrap();
        assert!(queue.delete_queue_item("4").unwrap());
        assert_eq!(queue.get_queue_size().unwrap(), 6 - 2 - 1);
    }

    #[test]
    fn duplicates_are_accepted() {
        let (_dir, queue) = manager();
        queue.add_to_queue(item("same")).unwrap();
        queue.add_to_queue(item("same")).unwrap();
        assert_eq!(queue.get_queue_size().unwrap(), 2);

        assert!(queue.delete_queue_item("same").unwrap());
        assert_eq!(ids(&queue), vec!["same"]);
    }

    #[test]
    fn update_keeps_position() {
        let (_dir, queue) = manager();
        for id in ["A", "B", "C"] {
            queue.add_to_queue(item(id)).unwrap();
        }

        assert!(queue.update_queue_item("B", "edited").unwrap());
        let items = queue.get_queue().unwrap();
        assert_eq!(items[1].id, "B");
        assert_eq!(items[1].text, "edited");
        assert_eq!(ids(&queue), vec!["A", "B", "C"]);
    }

    #[test]
    fn update_unknown_id_changes_nothing() {
        let (_dir, queue) = manager();
        queue.add_to_queue(item("A")).unwrap();
        let before = queue.get_queue().unwrap();

        assert!(!queue.update_queue_item("missing", "new").unwrap());
        assert_eq!(queue.get_queue().unwrap(), before);
    }

    #[test]
    fn delete_preserves_relative_order() {
        let (_dir, queue) = manager();
        for id in ["A", "B", "C", "D"] {
            queue.add_to_queue(item(id)).unwrap();
        }

        assert!(queue.delete_queue_item("B").unwrap());
        assert!(!queue.delete_queue_item("B").unwrap());
        assert_eq!(ids(&queue), vec!["A", "C", "D"]);
    }

    #[test]
    fn posted_history_appends_in_order() {
        let (_dir, queue) = manager();
        queue.add_to_posted(PostedItem::new(item("1"), "t1")).unwrap();
        queue.add_to_posted(PostedItem::new(item("2"), "t2")).unwrap();

        let posted = queue.get_posted().unwrap();
        assert_eq!(posted.len(), 2);
        assert_eq!(posted[0].post_id, "t1");
        assert_eq!(posted[1].post_id, "t2");
    }

    #[test]
    fn snapshot_reads_both_lists() {
        let (_dir, queue) = manager();
        queue.add_to_queue(item("A")).unwrap();
        queue.add_to_posted(PostedItem::new(item("P"), "t")).unwrap();

        let snap = queue.snapshot().unwrap();
        assert_eq!(snap.queue.len(), 1);
        assert_eq!(snap.posted.len(), 1);
    }
}
