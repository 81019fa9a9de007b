pub mod confirm;
pub mod eligibility;

use crate::bot_config::BotConfig;
use crate::new_items::confirm::Confirm;
use crate::new_items::eligibility::{EligibilityFilter, SkipReason, TemplateSet, Verdict};
use crate::wiki_client::{NewItem, PageInfo, WikiClient};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewItemReport {
    pub pages_seen: usize,
    /// (page title, new item id)
    pub created: Vec<(String, String)>,
    pub declined: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
    pub errors: Vec<String>,
    pub reached_limit: bool,
}

impl NewItemReport {
    fn error(&mut self, context: &str, e: anyhow::Error) {
        warn!("{context}: {e}");
        self.errors.push(format!("{context}: {e}"));
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// Creates items for unconnected pages of the content wiki.
#[derive(Debug, Clone, Copy)]
pub struct NewItemCreator<'a> {
    config: &'a BotConfig,
}

impl<'a> NewItemCreator<'a> {
    pub const fn new(config: &'a BotConfig) -> Self {
        Self { config }
    }

    pub async fn run<C: WikiClient, F: Confirm + ?Sized>(
        &self,
        client: &mut C,
        confirm: &mut F,
        now: DateTime<Utc>,
    ) -> Result<NewItemReport> {
        let mut report = NewItemReport::default();
        let config = &self.config.new_items;
        let (skip_templates, errors) =
            TemplateSet::from_items(&*client, &config.skip_template_items).await;
        report.errors.extend(errors);
        info!("{} templates to skip", skip_templates.len());
        let (category_redirects, errors) =
            TemplateSet::with_redirects(&*client, &config.category_redirect_templates).await;
        report.errors.extend(errors);
        info!("{} category redirect templates", category_redirects.len());

        let filter = EligibilityFilter::new(config, &skip_templates, &category_redirects, now);
        let pages = client.unconnected_pages(None).await?;
        for title in pages {
            report.pages_seen += 1;
            let info = match filter.evaluate(&*client, &title).await {
                Ok(Verdict::Eligible(info)) => info,
                Ok(Verdict::Skip(reason)) => {
                    *report.skipped.entry(reason).or_default() += 1;
                    continue;
                }
                Err(e) => {
                    report.error(&title, e);
                    continue;
                }
            };

            let new_item = self.new_item_for(&title);
            if confirm.confirm(&format!("{}", new_item.to_json()))? {
                match self.create(client, &info, &new_item).await {
                    Ok(item) => {
                        info!("Created {item} for {title}");
                        report.created.push((title.to_owned(), item));
                    }
                    Err(e) => report.error(&title, e),
                }
            } else {
                report.declined += 1;
            }

            if let Err(e) = client.touch_page(&title).await {
                warn!("Could not touch {title}: {e}");
            }

            if report.created.len() >= config.max_new_items {
                info!(
                    "Reached the maximum of {} entries modified, quitting!",
                    config.max_new_items
                );
                report.reached_limit = true;
                break;
            }
        }
        Ok(report)
    }

    pub fn new_item_for(&self, title: &str) -> NewItem {
        NewItem {
            language: self.config.language.to_owned(),
            label: title.to_string(),
            site: self.config.site_id.to_owned(),
            title: title.to_string(),
        }
    }

    /// The `instance of` value for a new item, with the edit summary.
    pub fn classification(&self, info: &PageInfo) -> Option<(&str, &str)> {
        let config = &self.config.new_items;
        match (info.is_category(), info.is_disambiguation) {
            (true, true) => Some((&config.disambiguation_category_item, "Category item")),
            (true, false) => Some((&config.category_item, "Category item")),
            (false, true) => Some((&config.disambiguation_page_item, "Disambig page")),
            (false, false) => None,
        }
    }

    async fn create<C: WikiClient>(
        &self,
        client: &mut C,
        info: &PageInfo,
        new_item: &NewItem,
    ) -> Result<String> {
        let summary = format!("Creating item from {}", self.config.site_id);
        let item = client.create_item(new_item, &summary).await?;
        if let Some((target, summary)) = self.classification(info) {
            client
                .add_item_claim(&item, &self.config.new_items.instance_of, target, summary)
                .await?;
        }
        Ok(item)
    }
}
