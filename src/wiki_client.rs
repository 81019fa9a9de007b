use crate::wikitext::{parse_templates, TemplateInvocation};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use wikimisc::mediawiki::api::NamespaceID;

pub const NS_MAIN: NamespaceID = 0;
pub const NS_TEMPLATE: NamespaceID = 10;
pub const NS_CATEGORY: NamespaceID = 14;

/// Page metadata needed by the bots.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageInfo {
    pub title: String,
    pub namespace: NamespaceID,
    pub is_redirect: bool,
    pub is_disambiguation: bool,
    pub is_hidden_category: bool,
    /// Number of members, for categories only
    pub category_size: Option<u64>,
    pub last_edited: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
}

impl PageInfo {
    pub const fn is_category(&self) -> bool {
        self.namespace == NS_CATEGORY
    }
}

//________________________________________________________________________________________________________________________

/// A single statement of an item. `target` is the entity id for item values
/// and the plain string for string and external-id values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub id: String,
    pub property: String,
    pub target: Option<String>,
}

impl Claim {
    pub fn new_from_json(j: &Value) -> Option<Self> {
        let id = j["id"].as_str()?.to_string();
        let property = j["mainsnak"]["property"].as_str()?.to_string();
        let datavalue = &j["mainsnak"]["datavalue"];
        let target = match datavalue["type"].as_str() {
            Some("wikibase-entityid") => datavalue["value"]["id"].as_str().map(|s| s.to_string()),
            Some("string") => datavalue["value"].as_str().map(|s| s.to_string()),
            _ => None,
        };
        Some(Self {
            id,
            property,
            target,
        })
    }
}

//________________________________________________________________________________________________________________________

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemEntity {
    pub id: String,
    pub claims: HashMap<String, Vec<Claim>>,
}

impl ItemEntity {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            claims: HashMap::new(),
        }
    }

    /// Parses one entry of `wbgetentities`' `entities` object; `None` for
    /// the `missing` placeholder.
    pub fn new_from_json(j: &Value) -> Option<Self> {
        if j.get("missing").is_some() {
            return None;
        }
        let id = j["id"].as_str()?;
        let claims = j["claims"]
            .as_object()
            .map(|claims| {
                claims
                    .iter()
                    .map(|(property, list)| {
                        let list = list
                            .as_array()
                            .map(|a| a.iter().filter_map(Claim::new_from_json).collect())
                            .unwrap_or_default();
                        (property.to_string(), list)
                    })
                    .collect()
            })
            .unwrap_or_default();
        Some(Self {
            id: id.to_string(),
            claims,
        })
    }

    pub fn with_claim(mut self, claim: Claim) -> Self {
        self.claims
            .entry(claim.property.to_owned())
            .or_default()
            .push(claim);
        self
    }

    /// `None` if the item has no statement for `property` at all.
    pub fn claims_for(&self, property: &str) -> Option<&[Claim]> {
        self.claims.get(property).map(|v| v.as_slice())
    }
}

//________________________________________________________________________________________________________________________

/// Data for a new item: one label and one sitelink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub language: String,
    pub label: String,
    pub site: String,
    pub title: String,
}

impl NewItem {
    pub fn to_json(&self) -> Value {
        json!({
            "labels": {
                &self.language: {"language": &self.language, "value": &self.label}
            },
            "sitelinks": {
                &self.site: {"site": &self.site, "title": &self.title}
            }
        })
    }
}

//________________________________________________________________________________________________________________________

/// Everything the bots do on a content wiki and its Wikibase repository.
///
/// Lookups return `Ok(None)` when the thing does not exist; `Err` is reserved
/// for transport and API failures.
#[async_trait]
pub trait WikiClient: Send + Sync {
    /// Direct subcategories only
    async fn subcategories(&self, category: &str) -> Result<Vec<String>>;
    async fn category_members(&self, category: &str, limit: Option<usize>) -> Result<Vec<String>>;
    /// Pages without a linked item, from `Special:UnconnectedPages`
    async fn unconnected_pages(&self, limit: Option<usize>) -> Result<Vec<String>>;
    async fn page_text(&self, title: &str) -> Result<Option<String>>;
    async fn page_info(&self, title: &str) -> Result<Option<PageInfo>>;
    async fn item_by_sitelink(&self, title: &str) -> Result<Option<ItemEntity>>;
    /// Title of the page linked from `item` on the content wiki
    async fn page_for_item(&self, item: &str) -> Result<Option<String>>;
    /// Redirects pointing at `title`, restricted to `namespace`
    async fn redirects_to(&self, title: &str, namespace: NamespaceID) -> Result<Vec<String>>;
    /// Item ids found by `wbsearchentities`
    async fn search_entities(&self, text: &str) -> Result<Vec<String>>;

    async fn save_page(&mut self, title: &str, text: &str, summary: &str) -> Result<()>;
    /// Returns the id of the new item
    async fn create_item(&mut self, item: &NewItem, summary: &str) -> Result<String>;
    async fn add_item_claim(
        &mut self,
        item: &str,
        property: &str,
        target: &str,
        summary: &str,
    ) -> Result<()>;
    /// Null edit, to refresh links and page properties
    async fn touch_page(&mut self, title: &str) -> Result<()>;

    /// Templates transcluded by a page, parsed from its wikitext.
    /// A missing page has no templates.
    async fn templates_with_params(&self, title: &str) -> Result<Vec<TemplateInvocation>> {
        Ok(self
            .page_text(title)
            .await?
            .map(|text| parse_templates(&text))
            .unwrap_or_default())
    }
}
