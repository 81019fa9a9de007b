//! In-memory `WikiClient` for unit tests.

use crate::wiki_client::{ItemEntity, NewItem, PageInfo, WikiClient};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use wikimisc::mediawiki::api::NamespaceID;

#[derive(Debug, Clone, Default)]
pub struct MockWiki {
    pub texts: HashMap<String, String>,
    pub infos: HashMap<String, PageInfo>,
    pub subcats: HashMap<String, Vec<String>>,
    pub members: HashMap<String, Vec<String>>,
    pub unconnected: Vec<String>,
    /// Linked items, by page title
    pub items: HashMap<String, ItemEntity>,
    /// Content-wiki page, by item id
    pub item_pages: HashMap<String, String>,
    pub redirects: HashMap<String, Vec<String>>,
    pub search_hits: HashMap<String, Vec<String>>,
    /// Any read or write touching these titles fails
    pub broken: HashSet<String>,
    pub fail_touch: bool,

    pub saved: Vec<(String, String, String)>,
    pub created: Vec<NewItem>,
    pub claims_added: Vec<(String, String, String)>,
    pub touched: Vec<String>,
}

impl MockWiki {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, title: &str, text: &str) -> Self {
        self.texts.insert(title.to_string(), text.to_string());
        self
    }

    pub fn with_info(mut self, info: PageInfo) -> Self {
        self.infos.insert(info.title.to_owned(), info);
        self
    }

    pub fn with_item(mut self, title: &str, item: ItemEntity) -> Self {
        self.items.insert(title.to_string(), item);
        self
    }

    pub fn saves_of(&self, title: &str) -> Vec<&(String, String, String)> {
        self.saved.iter().filter(|(t, _, _)| t == title).collect()
    }

    fn check(&self, title: &str) -> Result<()> {
        if self.broken.contains(title) {
            return Err(anyhow!("Connection reset while loading {title}"));
        }
        Ok(())
    }
}

/// Article metadata aged by `days_edited` / `days_created`, relative to `now`.
pub fn page_info(
    title: &str,
    namespace: NamespaceID,
    now: DateTime<Utc>,
    days_edited: f64,
    days_created: f64,
) -> PageInfo {
    let ago = |days: f64| now - Duration::seconds((days * 86400.0) as i64);
    PageInfo {
        title: title.to_string(),
        namespace,
        last_edited: Some(ago(days_edited)),
        created: Some(ago(days_created)),
        ..Default::default()
    }
}

#[async_trait]
impl WikiClient for MockWiki {
    async fn subcategories(&self, category: &str) -> Result<Vec<String>> {
        self.check(category)?;
        Ok(self.subcats.get(category).cloned().unwrap_or_default())
    }

    async fn category_members(&self, category: &str, limit: Option<usize>) -> Result<Vec<String>> {
        self.check(category)?;
        let mut members = self.members.get(category).cloned().unwrap_or_default();
        if let Some(limit) = limit {
            members.truncate(limit);
        }
        Ok(members)
    }

    async fn unconnected_pages(&self, limit: Option<usize>) -> Result<Vec<String>> {
        let mut pages = self.unconnected.clone();
        if let Some(limit) = limit {
            pages.truncate(limit);
        }
        Ok(pages)
    }

    async fn page_text(&self, title: &str) -> Result<Option<String>> {
        self.check(title)?;
        Ok(self.texts.get(title).cloned())
    }

    async fn page_info(&self, title: &str) -> Result<Option<PageInfo>> {
        self.check(title)?;
        Ok(self.infos.get(title).cloned())
    }

    async fn item_by_sitelink(&self, title: &str) -> Result<Option<ItemEntity>> {
        self.check(title)?;
        Ok(self.items.get(title).cloned())
    }

    async fn page_for_item(&self, item: &str) -> Result<Option<String>> {
        self.check(item)?;
        Ok(self.item_pages.get(item).cloned())
    }

    async fn redirects_to(&self, title: &str, _namespace: NamespaceID) -> Result<Vec<String>> {
        self.check(title)?;
        Ok(self.redirects.get(title).cloned().unwrap_or_default())
    }

    async fn search_entities(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.search_hits.get(text).cloned().unwrap_or_default())
    }

    async fn save_page(&mut self, title: &str, text: &str, summary: &str) -> Result<()> {
        self.check(title)?;
        self.texts.insert(title.to_string(), text.to_string());
        self.saved
            .push((title.to_string(), text.to_string(), summary.to_string()));
        Ok(())
    }

    async fn create_item(&mut self, item: &NewItem, _summary: &str) -> Result<String> {
        self.check(&item.title)?;
        self.created.push(item.clone());
        let id = format!("Q{}", 1000 + self.created.len());
        self.items
            .insert(item.title.to_owned(), ItemEntity::new(&id));
        Ok(id)
    }

    async fn add_item_claim(
        &mut self,
        item: &str,
        property: &str,
        target: &str,
        _summary: &str,
    ) -> Result<()> {
        self.claims_added
            .push((item.to_string(), property.to_string(), target.to_string()));
        Ok(())
    }

    async fn touch_page(&mut self, title: &str) -> Result<()> {
        if self.fail_touch {
            return Err(anyhow!("Touching {title} failed"));
        }
        self.touched.push(title.to_string());
        Ok(())
    }
}
