use crate::bot_config::NewItemConfig;
use crate::wiki_client::{PageInfo, WikiClient, NS_CATEGORY, NS_MAIN, NS_TEMPLATE};
use crate::wikitext::normalize_title;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};

const SECONDS_PER_DAY: f64 = 86400.0;

/// Why a page did not get an item. Ordered like the checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    Missing,
    Namespace,
    Redirect,
    CategoryRedirect,
    SkipTemplate,
    RecentlyEdited,
    RecentlyCreated,
    HasItem,
    EmptyCategory,
    HiddenCategory,
    RecentWithSearchResults,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Missing => "page does not exist",
            Self::Namespace => "not an article or category",
            Self::Redirect => "redirect",
            Self::CategoryRedirect => "category redirect",
            Self::SkipTemplate => "uses a template to skip",
            Self::RecentlyEdited => "recently edited",
            Self::RecentlyCreated => "recently created",
            Self::HasItem => "already has an item",
            Self::EmptyCategory => "empty category",
            Self::HiddenCategory => "hidden category",
            Self::RecentWithSearchResults => "recently edited with search results",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Eligible(PageInfo),
    Skip(SkipReason),
}

//________________________________________________________________________________________________________________________

/// Template pages together with their redirects, e.g. the templates that
/// disqualify a page or those that mark a category redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateSet {
    titles: HashSet<String>,
}

impl TemplateSet {
    pub fn new<I: IntoIterator<Item = S>, S: AsRef<str>>(titles: I) -> Self {
        Self {
            titles: titles
                .into_iter()
                .map(|t| normalize_title(t.as_ref()))
                .collect(),
        }
    }

    /// Resolves each template item to its page on the content wiki, then
    /// adds the redirects to it. Items without a page are ignored; lookup
    /// failures are returned alongside the (partial) set.
    pub async fn from_items<C: WikiClient>(client: &C, items: &[String]) -> (Self, Vec<String>) {
        let mut templates = vec![];
        let mut errors = vec![];
        for item in items {
            match client.page_for_item(item).await {
                Ok(Some(template)) => templates.push(template),
                Ok(None) => debug!("{item} has no template page"),
                Err(e) => {
                    warn!("{item}: {e}");
                    errors.push(format!("{item}: {e}"));
                }
            }
        }
        let (ret, more_errors) = Self::with_redirects(client, &templates).await;
        errors.extend(more_errors);
        (ret, errors)
    }

    /// The given templates and every redirect in the Template namespace to them.
    pub async fn with_redirects<C: WikiClient>(
        client: &C,
        templates: &[String],
    ) -> (Self, Vec<String>) {
        let mut titles = vec![];
        let mut errors = vec![];
        for template in templates {
            match client.redirects_to(template, NS_TEMPLATE).await {
                Ok(redirects) => titles.extend(redirects),
                Err(e) => {
                    warn!("{template}: {e}");
                    errors.push(format!("{template}: {e}"));
                }
            }
            titles.push(template.to_owned());
        }
        (Self::new(titles), errors)
    }

    pub fn contains(&self, title: &str) -> bool {
        self.titles.contains(&normalize_title(title))
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

//________________________________________________________________________________________________________________________

/// The chain of checks a page has to pass before an item is created for it.
/// Checks run in a fixed order and stop at the first failure.
#[derive(Debug, Clone)]
pub struct EligibilityFilter<'a> {
    config: &'a NewItemConfig,
    skip_templates: &'a TemplateSet,
    category_redirects: &'a TemplateSet,
    now: DateTime<Utc>,
}

impl<'a> EligibilityFilter<'a> {
    pub fn new(
        config: &'a NewItemConfig,
        skip_templates: &'a TemplateSet,
        category_redirects: &'a TemplateSet,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            config,
            skip_templates,
            category_redirects,
            now,
        }
    }

    /// Fractional days since `timestamp`; an unknown timestamp counts as now.
    pub fn age_in_days(&self, timestamp: Option<DateTime<Utc>>) -> f64 {
        match timestamp {
            Some(ts) => (self.now - ts).num_seconds() as f64 / SECONDS_PER_DAY,
            None => 0.0,
        }
    }

    pub async fn evaluate<C: WikiClient>(&self, client: &C, title: &str) -> Result<Verdict> {
        let info = match client.page_info(title).await? {
            Some(info) => info,
            None => return Ok(Verdict::Skip(SkipReason::Missing)),
        };
        if info.namespace != NS_MAIN && info.namespace != NS_CATEGORY {
            return Ok(Verdict::Skip(SkipReason::Namespace));
        }
        if info.is_redirect {
            return Ok(Verdict::Skip(SkipReason::Redirect));
        }

        let templates = client.templates_with_params(title).await?;
        if info.is_category()
            && templates
                .iter()
                .any(|t| self.category_redirects.contains(&t.title))
        {
            return Ok(Verdict::Skip(SkipReason::CategoryRedirect));
        }
        if let Some(template) = templates
            .iter()
            .find(|t| self.skip_templates.contains(&t.title))
        {
            info!("{title} contains {}, skipping", template.title);
            return Ok(Verdict::Skip(SkipReason::SkipTemplate));
        }

        let edited = self.age_in_days(info.last_edited);
        if edited < self.config.days_since_last_edit {
            info!("{title}: recently edited ({edited:.2} days)");
            return Ok(Verdict::Skip(SkipReason::RecentlyEdited));
        }
        let created = self.age_in_days(info.created);
        if created < self.config.creation_threshold() {
            info!("{title}: recently created ({created:.2} days)");
            return Ok(Verdict::Skip(SkipReason::RecentlyCreated));
        }

        if let Some(item) = client.item_by_sitelink(title).await? {
            info!("{title} has a sitelink already - {}", item.id);
            return Ok(Verdict::Skip(SkipReason::HasItem));
        }

        if info.is_category() {
            if info.category_size.unwrap_or(0) == 0 {
                return Ok(Verdict::Skip(SkipReason::EmptyCategory));
            }
            if info.is_hidden_category {
                return Ok(Verdict::Skip(SkipReason::HiddenCategory));
            }
        }

        let hits = client.search_entities(title).await?;
        if !hits.is_empty() && edited < self.config.days_since_last_edit_but_search {
            info!("{title}: recently edited with search results ({edited:.2} days)");
            return Ok(Verdict::Skip(SkipReason::RecentWithSearchResults));
        }

        Ok(Verdict::Eligible(info))
    }
}
