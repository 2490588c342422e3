//! Notion task-tracker adapter.
//!
//! Only two endpoints are used: database query (to list "Done" pages in the
//! configured project) and block children (to read a page body). Responses
//! are decoded into the small typed subset below; unknown fields and block
//! types are ignored rather than assumed.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::SourceError;
use crate::source::{truncate_post, SourceItem, TaskSource};

const NOTION_VERSION: &str = "2022-06-28";
const TITLE_PROPERTY: &str = "Task name";
const PAGE_SIZE: u32 = 100;

pub struct NotionSource {
    client: reqwest::Client,
    api_key: String,
    database_id: String,
    project_id: String,
    base_url: String,
}

impl NotionSource {
    pub fn new(
        api_key: String,
        database_id: String,
        project_id: String,
        base_url: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            database_id,
            project_id,
            base_url: base_url
                .unwrap_or_else(|| "https://api.notion.com".to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    /// Plain-text body of a page, built from its top-level blocks.
    pub async fn page_content(&self, page_id: &str) -> Result<String, SourceError> {
        let mut blocks: Vec<Block> = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let url = format!("{}/v1/blocks/{}/children", self.base_url, page_id);
            let mut req = self
                .client
                .get(&url)
                .bearer_auth(&self.api_key)
                .header("Notion-Version", NOTION_VERSION)
                .query(&[("page_size", PAGE_SIZE.to_string())]);
            if let Some(ref c) = cursor {
                req = req.query(&[("start_cursor", c)]);
            }

            let page: Listing<Block> = decode(req.send().await?).await?;
            blocks.extend(page.results);
            match page.next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }

        Ok(render_blocks(&blocks))
    }
}

#[async_trait]
impl TaskSource for NotionSource {
    fn name(&self) -> &str {
        "notion"
    }

    async fn fetch_done_items(&self) -> Result<Vec<SourceItem>, SourceError> {
        let url = format!("{}/v1/databases/{}/query", self.base_url, self.database_id);
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let body = done_query(&self.project_id, cursor.as_deref());
            debug!(database_id = %self.database_id, "querying Notion for done items");

            let resp = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .header("Notion-Version", NOTION_VERSION)
                .json(&body)
                .send()
                .await?;

            let page: Listing<NotionPage> = decode(resp).await?;
            items.extend(page.results.into_iter().map(SourceItem::from));
            match page.next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }

        info!(count = items.len(), "fetched done items from Notion");
        Ok(items)
    }

    async fn format_text(&self, item: &SourceItem) -> String {
        let content = match self.page_content(&item.id).await {
            Ok(content) => content,
            Err(e) => {
                warn!(item_id = %item.id, error = %e, "page content unavailable, using title");
                String::new()
            }
        };

        if content.is_empty() {
            truncate_post(&format!("✅ {}", self.task_name(item)))
        } else {
            truncate_post(&content)
        }
    }

    fn external_url(&self, item: &SourceItem) -> Option<String> {
        Some(page_url(&item.id))
    }
}

/// Public link for a page id: `https://notion.so/<id without dashes>`.
pub fn page_url(page_id: &str) -> String {
    format!("https://notion.so/{}", page_id.replace('-', ""))
}

/// Filter: Status is "Done" and Project relation contains `project_id`,
/// newest edits first.
fn done_query(project_id: &str, start_cursor: Option<&str>) -> Value {
    let mut body = json!({
        "filter": {
            "and": [
                { "property": "Status", "status": { "equals": "Done" } },
                { "property": "Project", "relation": { "contains": project_id } }
            ]
        },
        "sorts": [
            { "timestamp": "last_edited_time", "direction": "descending" }
        ],
        "page_size": PAGE_SIZE,
    });
    if let Some(c) = start_cursor {
        body["start_cursor"] = json!(c);
    }
    body
}

async fn decode<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T, SourceError> {
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %text, "Notion API error");
        return Err(SourceError::Api {
            status: status.as_u16(),
            message: text,
        });
    }
    resp.json::<T>()
        .await
        .map_err(|e| SourceError::Parse(e.to_string()))
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Listing<T> {
    results: Vec<T>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotionPage {
    pub id: String,
    #[serde(default)]
    pub properties: HashMap<String, Property>,
}

/// A page property. Only title-typed properties carry `title`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Property {
    #[serde(default)]
    pub title: Option<Vec<RichText>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RichTextBlock {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph { paragraph: RichTextBlock },
    BulletedListItem { bulleted_list_item: RichTextBlock },
    NumberedListItem { numbered_list_item: RichTextBlock },
    #[serde(other)]
    Unsupported,
}

fn plain_text(parts: &[RichText]) -> String {
    parts.iter().map(|p| p.plain_text.as_str()).collect()
}

impl From<NotionPage> for SourceItem {
    fn from(page: NotionPage) -> Self {
        let title = page
            .properties
            .get(TITLE_PROPERTY)
            .and_then(|p| p.title.as_deref())
            .map(plain_text);
        SourceItem { id: page.id, title }
    }
}

/// One line per text block; bulleted items get a `"• "` prefix. Empty
/// blocks and unsupported block types are skipped.
pub fn render_blocks(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        let (prefix, body) = match block {
            Block::Paragraph { paragraph } => ("", paragraph),
            Block::BulletedListItem { bulleted_list_item } => ("• ", bulleted_list_item),
            Block::NumberedListItem { numbered_list_item } => ("", numbered_list_item),
            Block::Unsupported => continue,
        };
        if body.rich_text.is_empty() {
            continue;
        }
        out.push_str(prefix);
        out.push_str(&plain_text(&body.rich_text));
        out.push('\n');
    }
    out.trim().to_string()
}
