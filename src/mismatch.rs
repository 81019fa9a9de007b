use crate::bot_config::{BotConfig, MismatchConfig};
use crate::template_params::ParameterMatcher;
use crate::wiki_client::WikiClient;
use anyhow::Result;
use std::fmt;
use tracing::{debug, info, warn};
use wikimisc::mediawiki::title::Title;

/// A page whose local identifier differs from the single Wikidata value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchRecord {
    pub claim_id: String,
    pub property_id: String,
    pub wikidata_value: String,
    pub local_id: String,
    pub page_url: String,
}

impl fmt::Display for MismatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{}",
            self.claim_id, self.property_id, self.wikidata_value, self.local_id, self.page_url
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MismatchReport {
    pub records: Vec<MismatchRecord>,
    pub categories_scanned: usize,
    pub categories_skipped: usize,
    pub pages_checked: usize,
    pub errors: Vec<String>,
}

impl MismatchReport {
    fn error(&mut self, context: &str, e: anyhow::Error) {
        warn!("{context}: {e}");
        self.errors.push(format!("{context}: {e}"));
    }
}

/// Compares locally templated identifiers on tracking-category member pages
/// with the corresponding single-valued claim on the linked item.
#[derive(Debug, Clone, Copy)]
pub struct MismatchReporter<'a> {
    config: &'a MismatchConfig,
    article_url_prefix: &'a str,
}

impl<'a> MismatchReporter<'a> {
    pub fn new(config: &'a BotConfig) -> Self {
        Self {
            config: &config.mismatch,
            article_url_prefix: &config.article_url_prefix,
        }
    }

    pub async fn run<C: WikiClient>(&self, client: &C) -> Result<MismatchReport> {
        let mut report = MismatchReport::default();
        let subcats = client.subcategories(&self.config.root_category).await?;
        info!(
            "{} tracking categories in {}",
            subcats.len(),
            self.config.root_category
        );
        for subcat in subcats {
            self.check_category(client, &subcat, &mut report).await;
        }
        Ok(report)
    }

    /// Reads the (property, template) pair a tracking category declares.
    pub async fn tracking_pair<C: WikiClient>(
        &self,
        client: &C,
        category: &str,
    ) -> Result<Option<(String, String)>> {
        let templates = client.templates_with_params(category).await?;
        let property = ParameterMatcher::named(&self.config.tracking_template, "property")
            .extract(&templates);
        let template = ParameterMatcher::named(&self.config.tracking_template, "template")
            .extract(&templates);
        Ok(property.zip(template))
    }

    async fn check_category<C: WikiClient>(
        &self,
        client: &C,
        category: &str,
        report: &mut MismatchReport,
    ) {
        let (property, template) = match self.tracking_pair(client, category).await {
            Ok(Some(pair)) => pair,
            Ok(None) => {
                debug!("{category}: no property/template declared");
                report.categories_skipped += 1;
                return;
            }
            Err(e) => return report.error(category, e),
        };
        report.categories_scanned += 1;
        debug!("{category}: {property} / {template}");

        let pages = match client
            .category_members(category, Some(self.config.max_per_category))
            .await
        {
            Ok(pages) => pages,
            Err(e) => return report.error(category, e),
        };
        for page in pages.iter().take(self.config.max_per_category) {
            report.pages_checked += 1;
            match self.check_page(client, page, &property, &template).await {
                Ok(Some(record)) => {
                    info!("{record}");
                    report.records.push(record);
                }
                Ok(None) => {}
                Err(e) => report.error(page, e),
            }
        }
    }

    /// `Ok(None)` covers every "nothing to compare" case: no local id, no
    /// linked item, no claim for the property, or not exactly one claim.
    pub async fn check_page<C: WikiClient>(
        &self,
        client: &C,
        page: &str,
        property: &str,
        template: &str,
    ) -> Result<Option<MismatchRecord>> {
        let templates = client.templates_with_params(page).await?;
        let local_id = match ParameterMatcher::named_or_positional(template, "id").extract(&templates)
        {
            Some(id) => id,
            None => return Ok(None),
        };
        let item = match client.item_by_sitelink(page).await? {
            Some(item) => item,
            None => return Ok(None),
        };
        let claim = match item.claims_for(property) {
            Some([claim]) => claim,
            _ => return Ok(None),
        };
        let wikidata_value = match &claim.target {
            Some(target) => target.trim(),
            None => return Ok(None),
        };
        let local_id = local_id.trim();
        if wikidata_value == local_id {
            return Ok(None);
        }
        Ok(Some(MismatchRecord {
            claim_id: claim.id.to_owned(),
            property_id: property.to_string(),
            wikidata_value: wikidata_value.to_string(),
            local_id: local_id.to_string(),
            page_url: format!(
                "{}{}",
                self.article_url_prefix,
                Title::spaces_to_underscores(page)
            ),
        }))
    }
}
