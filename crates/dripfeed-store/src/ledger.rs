use std::path::PathBuf;

use tracing::debug;

use crate::document::{Change, JsonDocument};
use crate::error::Result;
use crate::types::LedgerDocument;

/// Durable set of tracker item ids that have already been enqueued.
///
/// Each call is its own load/save pass; callers marking many ids pay one
/// round trip per id.
pub struct Ledger {
    doc: JsonDocument<LedgerDocument>,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            doc: JsonDocument::new(path),
        }
    }

    pub fn document(&self) -> &JsonDocument<LedgerDocument> {
        &self.doc
    }

    pub fn is_processed(&self, id: &str) -> Result<bool> {
        Ok(self.doc.load()?.processed_items.contains(id))
    }

    /// Record `id` as enqueued. Marking an id twice is a no-op and does not
    /// rewrite the document.
    pub fn mark_processed(&self, id: &str) -> Result<()> {
        self.doc.update(|ledger| {
            if ledger.processed_items.insert(id.to_string()) {
                debug!(item_id = %id, "marked processed");
                Change::Dirty(())
            } else {
                Change::Clean(())
            }
        })
    }

    pub fn processed_count(&self) -> Result<usize> {
        Ok(self.doc.load()?.processed_items.len())
    }
}
