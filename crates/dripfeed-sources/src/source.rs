use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// Platform limit on post length, in characters.
pub const MAX_POST_CHARS: usize = 280;
const ELLIPSIS: &str = "...";
const UNTITLED: &str = "Untitled";

/// A "done" item as reported by a task tracker, reduced to the fields the
/// pipeline reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceItem {
    /// Stable tracker id; the dedup key.
    pub id: String,
    /// Task title, if the tracker record carried one.
    pub title: Option<String>,
}

/// Common interface implemented by every task-tracker adapter.
///
/// The pipeline calls [`fetch_done_items`](Self::fetch_done_items), skips ids
/// already in the ledger, and only then asks for the derived fields, so
/// expensive formatting is never done for items that will be dropped.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Stable lowercase identifier for logs (e.g. `"notion"`).
    fn name(&self) -> &str;

    async fn fetch_done_items(&self) -> Result<Vec<SourceItem>, SourceError>;

    fn task_name(&self, item: &SourceItem) -> String {
        item.title.clone().unwrap_or_else(|| UNTITLED.to_string())
    }

    /// Post text for `item`, already within [`MAX_POST_CHARS`].
    async fn format_text(&self, item: &SourceItem) -> String;

    fn external_url(&self, item: &SourceItem) -> Option<String>;
}

/// Cut `text` to [`MAX_POST_CHARS`] characters, ending in `"..."` when cut.
pub fn truncate_post(text: &str) -> String {
    if text.chars().count() <= MAX_POST_CHARS {
        return text.to_string();
    }
    let keep = MAX_POST_CHARS - ELLIPSIS.len();
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_unchanged() {
        assert_eq!(truncate_post("hello"), "hello");
    }

    #[test]
    fn exact_limit_unchanged() {
        let s = "x".repeat(MAX_POST_CHARS);
        assert_eq!(truncate_post(&s), s);
    }

    #[test]
    fn long_text_cut_to_limit_with_ellipsis() {
        let s: String = (0..300).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let out = truncate_post(&s);

        assert_eq!(out.chars().count(), 280);
        assert!(out.ends_with("..."));
        assert_eq!(&out[..277], &s[..277]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let s = "é".repeat(281);
        let out = truncate_post(&s);
        assert_eq!(out.chars().count(), 280);
        assert!(out.starts_with(&"é".repeat(277)));
    }

    #[test]
    fn default_task_name_is_untitled() {
        struct Bare;

        #[async_trait]
        impl TaskSource for Bare {
            fn name(&self) -> &str {
                "bare"
            }
            async fn fetch_done_items(&self) -> Result<Vec<SourceItem>, SourceError> {
                Ok(Vec::new())
            }
            async fn format_text(&self, _item: &SourceItem) -> String {
                String::new()
            }
            fn external_url(&self, _item: &SourceItem) -> Option<String> {
                None
            }
        }

        let untitled = SourceItem {
            id: "1".into(),
            title: None,
        };
        let titled = SourceItem {
            id: "2".into(),
            title: Some("Write docs".into()),
        };
        assert_eq!(Bare.task_name(&untitled), "Untitled");
        assert_eq!(Bare.task_name(&titled), "Write docs");
    }
}
