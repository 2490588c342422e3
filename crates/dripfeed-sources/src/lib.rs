//! `dripfeed-sources`: ingestion adapters that turn external content into
//! queue items.
//!
//! - [`NotionSource`]: pages marked "Done" in a Notion database.
//! - [`LinesFile`]: new non-comment lines appended to a local text file.
//!
//! Adapters hold no dedup state of their own; the caller checks the
//! [`Ledger`](dripfeed_store::Ledger) before transforming a tracker item.

pub mod error;
pub mod lines;
pub mod notion;
pub mod source;

pub use error::SourceError;
pub use lines::{FileCursor, LinesFile, NewLine};
pub use notion::NotionSource;
pub use source::{truncate_post, SourceItem, TaskSource, MAX_POST_CHARS};
