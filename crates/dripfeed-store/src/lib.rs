//! `dripfeed-store`: durable queue and dedup state backed by JSON documents.
//!
//! # Overview
//!
//! Two documents are the sole source of truth:
//!
//! | Document  | Shape                                   | Owner            |
//! |-----------|-----------------------------------------|------------------|
//! | schedule  | `{ "queue": [...], "posted": [...] }`   | [`QueueManager`] |
//! | ledger    | `{ "processedItems": [...] }`           | [`Ledger`]       |
//!
//! Nothing is cached between calls. Every mutation is a full
//! load → modify → save round trip performed under the document's own
//! in-process lock, and every save goes through a temp file + rename so a
//! crash never leaves a half-written document behind.

pub mod document;
pub mod error;
pub mod ledger;
pub mod queue;
pub mod types;

pub use document::{load_json, save_json, Change, JsonDocument};
pub use error::{Result, StoreError};
pub use ledger::Ledger;
pub use queue::QueueManager;
pub use types::{LedgerDocument, PostedItem, QueueItem, ScheduleDocument};
