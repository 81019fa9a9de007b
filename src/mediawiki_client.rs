use crate::wiki_client::{ItemEntity, NewItem, PageInfo, WikiClient};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, instrument};
use wikimisc::mediawiki::api::{Api, NamespaceID};

/// `WikiClient` over the MediaWiki action API of a content wiki and its
/// Wikibase repository. For bots that only work on the repository itself,
/// `wiki` is `None` and all page operations go to `repo`.
#[derive(Debug, Clone)]
pub struct MediaWikiClient {
    wiki: Option<Api>,
    repo: Api,
    site_id: String,
    language: String,
}

impl MediaWikiClient {
    pub fn new(wiki: Api, repo: Api, site_id: &str, language: &str) -> Self {
        Self {
            wiki: Some(wiki),
            repo,
            site_id: site_id.to_string(),
            language: language.to_string(),
        }
    }

    pub fn new_repo_only(repo: Api, site_id: &str, language: &str) -> Self {
        Self {
            wiki: None,
            repo,
            site_id: site_id.to_string(),
            language: language.to_string(),
        }
    }

    fn wiki(&self) -> &Api {
        self.wiki.as_ref().unwrap_or(&self.repo)
    }

    fn wiki_mut(&mut self) -> &mut Api {
        match self.wiki.as_mut() {
            Some(api) => api,
            None => &mut self.repo,
        }
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        let mut params: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        params.insert("formatversion".to_string(), "2".to_string());
        params
    }

    /// Turns an API `error` object into an `Err`.
    fn check_api_error(result: Value) -> Result<Value> {
        match result.get("error") {
            Some(error) => Err(anyhow!(
                "API error {}: {}",
                error["code"].as_str().unwrap_or("unknown"),
                error["info"].as_str().unwrap_or_default()
            )),
            None => Ok(result),
        }
    }

    async fn query(api: &Api, params: &HashMap<String, String>) -> Result<Value> {
        let result = api
            .get_query_api_json(params)
            .await
            .map_err(|e| anyhow!("API query failed: {e}"))?;
        Self::check_api_error(result)
    }

    async fn query_limit(
        api: &Api,
        params: &HashMap<String, String>,
        limit: Option<usize>,
    ) -> Result<Value> {
        let result = api
            .get_query_api_json_limit(params, limit)
            .await
            .map_err(|e| anyhow!("API query failed: {e}"))?;
        Self::check_api_error(result)
    }

    /// Adds token and bot flag, then POSTs.
    async fn post_edit(api: &mut Api, mut params: HashMap<String, String>) -> Result<Value> {
        let token = api
            .get_edit_token()
            .await
            .map_err(|e| anyhow!("Could not get edit token: {e}"))?;
        params.insert("token".to_string(), token);
        if api.user().is_bot() {
            params.insert("bot".to_string(), "1".to_string());
        }
        let result = api
            .post_query_api_json_mut(&params)
            .await
            .map_err(|e| anyhow!("API edit failed: {e}"))?;
        Self::check_api_error(result)
    }

    fn titles_from_list(result: &Value, list: &str) -> Vec<String> {
        result["query"][list]
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(|x| x["title"].as_str())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn first_page(result: &Value) -> Option<&Value> {
        let page = result["query"]["pages"].as_array()?.first()?;
        if page.get("missing").is_some() || page.get("invalid").is_some() {
            return None;
        }
        Some(page)
    }

    fn parse_timestamp(ts: &Value) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(ts.as_str()?)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub(crate) fn page_info_from_json(page: &Value) -> Option<PageInfo> {
        Some(PageInfo {
            title: page["title"].as_str()?.to_string(),
            namespace: page["ns"].as_i64()?,
            is_redirect: page["redirect"].as_bool().unwrap_or(false),
            is_disambiguation: page["pageprops"].get("disambiguation").is_some(),
            is_hidden_category: page["pageprops"].get("hiddencat").is_some()
                || page["categoryinfo"]["hidden"].as_bool().unwrap_or(false),
            category_size: page["categoryinfo"]["size"].as_u64(),
            last_edited: Self::parse_timestamp(&page["revisions"][0]["timestamp"]),
            created: None,
        })
    }

    async fn creation_time(&self, title: &str) -> Result<Option<DateTime<Utc>>> {
        let params = Self::params(&[
            ("action", "query"),
            ("prop", "revisions"),
            ("titles", title),
            ("rvprop", "timestamp"),
            ("rvdir", "newer"),
            ("rvlimit", "1"),
        ]);
        let result = Self::query(self.wiki(), &params).await?;
        Ok(Self::first_page(&result)
            .and_then(|page| Self::parse_timestamp(&page["revisions"][0]["timestamp"])))
    }
}

#[async_trait]
impl WikiClient for MediaWikiClient {
    #[instrument(skip(self))]
    async fn subcategories(&self, category: &str) -> Result<Vec<String>> {
        let params = Self::params(&[
            ("action", "query"),
            ("list", "categorymembers"),
            ("cmtitle", category),
            ("cmtype", "subcat"),
            ("cmlimit", "max"),
        ]);
        let result = Self::query_limit(self.wiki(), &params, None).await?;
        Ok(Self::titles_from_list(&result, "categorymembers"))
    }

    #[instrument(skip(self))]
    async fn category_members(&self, category: &str, limit: Option<usize>) -> Result<Vec<String>> {
        let cmlimit = limit.map_or("max".to_string(), |l| l.min(500).to_string());
        let params = Self::params(&[
            ("action", "query"),
            ("list", "categorymembers"),
            ("cmtitle", category),
            ("cmtype", "page"),
            ("cmlimit", cmlimit.as_str()),
        ]);
        let result = Self::query_limit(self.wiki(), &params, limit).await?;
        let mut titles = Self::titles_from_list(&result, "categorymembers");
        if let Some(limit) = limit {
            titles.truncate(limit);
        }
        Ok(titles)
    }

    async fn unconnected_pages(&self, limit: Option<usize>) -> Result<Vec<String>> {
        let params = Self::params(&[
            ("action", "query"),
            ("list", "querypage"),
            ("qppage", "UnconnectedPages"),
            ("qplimit", "max"),
        ]);
        let result = Self::query_limit(self.wiki(), &params, limit).await?;
        let titles = result["query"]["querypage"]["results"]
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(|x| x["title"].as_str())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default();
        Ok(titles)
    }

    #[instrument(skip(self))]
    async fn page_text(&self, title: &str) -> Result<Option<String>> {
        let params = Self::params(&[
            ("action", "query"),
            ("prop", "revisions"),
            ("titles", title),
            ("rvprop", "content"),
            ("rvslots", "main"),
        ]);
        let result = Self::query(self.wiki(), &params).await?;
        Ok(Self::first_page(&result)
            .and_then(|page| page["revisions"][0]["slots"]["main"]["content"].as_str())
            .map(|s| s.to_string()))
    }

    #[instrument(skip(self))]
    async fn page_info(&self, title: &str) -> Result<Option<PageInfo>> {
        let params = Self::params(&[
            ("action", "query"),
            ("prop", "info|pageprops|revisions|categoryinfo"),
            ("titles", title),
            ("ppprop", "disambiguation|hiddencat"),
            ("rvprop", "timestamp"),
        ]);
        let result = Self::query(self.wiki(), &params).await?;
        let mut info = match Self::first_page(&result).and_then(Self::page_info_from_json) {
            Some(info) => info,
            None => return Ok(None),
        };
        info.created = self.creation_time(title).await?;
        Ok(Some(info))
    }

    #[instrument(skip(self))]
    async fn item_by_sitelink(&self, title: &str) -> Result<Option<ItemEntity>> {
        let params = Self::params(&[
            ("action", "wbgetentities"),
            ("sites", self.site_id.as_str()),
            ("titles", title),
            ("props", "claims"),
        ]);
        let result = Self::query(&self.repo, &params).await?;
        let entities = result["entities"]
            .as_object()
            .ok_or_else(|| anyhow!("wbgetentities: no entities in result for '{title}'"))?;
        Ok(entities.values().find_map(ItemEntity::new_from_json))
    }

    async fn page_for_item(&self, item: &str) -> Result<Option<String>> {
        let params = Self::params(&[
            ("action", "wbgetentities"),
            ("ids", item),
            ("props", "sitelinks"),
            ("sitefilter", self.site_id.as_str()),
        ]);
        let result = Self::query(&self.repo, &params).await?;
        Ok(result["entities"][item]["sitelinks"][&self.site_id]["title"]
            .as_str()
            .map(|s| s.to_string()))
    }

    async fn redirects_to(&self, title: &str, namespace: NamespaceID) -> Result<Vec<String>> {
        let namespace = namespace.to_string();
        let params = Self::params(&[
            ("action", "query"),
            ("list", "backlinks"),
            ("bltitle", title),
            ("blfilterredir", "redirects"),
            ("blnamespace", namespace.as_str()),
            ("bllimit", "max"),
        ]);
        let result = Self::query_limit(self.wiki(), &params, None).await?;
        Ok(Self::titles_from_list(&result, "backlinks"))
    }

    async fn search_entities(&self, text: &str) -> Result<Vec<String>> {
        let params = Self::params(&[
            ("action", "wbsearchentities"),
            ("search", text),
            ("language", self.language.as_str()),
            ("type", "item"),
        ]);
        let result = Self::query(&self.repo, &params).await?;
        Ok(result["search"]
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(|x| x["id"].as_str())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn save_page(&mut self, title: &str, text: &str, summary: &str) -> Result<()> {
        debug!("Saving {title}: {summary}");
        let params = Self::params(&[
            ("action", "edit"),
            ("title", title),
            ("text", text),
            ("summary", summary),
        ]);
        let result = Self::post_edit(self.wiki_mut(), params).await?;
        match result["edit"]["result"].as_str() {
            Some("Success") => Ok(()),
            _ => Err(anyhow!("Saving '{title}' failed: {result}")),
        }
    }

    async fn create_item(&mut self, item: &NewItem, summary: &str) -> Result<String> {
        let data = item.to_json().to_string();
        let params = Self::params(&[
            ("action", "wbeditentity"),
            ("new", "item"),
            ("data", data.as_str()),
            ("summary", summary),
        ]);
        let result = Self::post_edit(&mut self.repo, params).await?;
        result["entity"]["id"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow!("wbeditentity returned no entity id: {result}"))
    }

    async fn add_item_claim(
        &mut self,
        item: &str,
        property: &str,
        target: &str,
        summary: &str,
    ) -> Result<()> {
        let value = json!({"entity-type": "item", "id": target}).to_string();
        let params = Self::params(&[
            ("action", "wbcreateclaim"),
            ("entity", item),
            ("property", property),
            ("snaktype", "value"),
            ("value", value.as_str()),
            ("summary", summary),
        ]);
        Self::post_edit(&mut self.repo, params).await?;
        Ok(())
    }

    async fn touch_page(&mut self, title: &str) -> Result<()> {
        let params = Self::params(&[
            ("action", "edit"),
            ("title", title),
            ("appendtext", ""),
            ("nocreate", "1"),
        ]);
        Self::post_edit(self.wiki_mut(), params).await?;
        Ok(())
    }
}
