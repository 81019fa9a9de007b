use anyhow::{anyhow, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Environment variables with this prefix override the config file,
/// e.g. `WIKIDATA_BOTS_PASSWORD` or `WIKIDATA_BOTS_NEW_ITEMS__MAX_NEW_ITEMS`.
const ENV_PREFIX: &str = "WIKIDATA_BOTS";

const SKIP_TEMPLATE_ITEMS: &[&str] = &[
    "Q4847311", "Q6687153", "Q21528265", "Q26004972", "Q6838010", "Q14446424", "Q7926719",
    "Q5849910", "Q6535522", "Q12857463", "Q14397354", "Q18198962", "Q13107809", "Q6916118",
    "Q15630429", "Q6868608", "Q6868546", "Q5931187", "Q26021926", "Q21684530", "Q20310993",
    "Q25970270", "Q57620750", "Q4844001", "Q97159332", "Q20765099", "Q17586361", "Q17588240",
    "Q13420881", "Q17589095", "Q17586294", "Q13421187", "Q97709865", "Q17586502", "Q5828850",
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Action API of the content wiki
    pub wiki_api: String,
    /// Action API of the Wikibase repository
    pub repo_api: String,
    /// Site id of the content wiki in the repository, e.g. `enwiki`
    pub site_id: String,
    pub language: String,
    pub article_url_prefix: String,
    /// Bot-password login; without it the bots cannot edit
    pub user: Option<String>,
    pub password: Option<String>,
    pub edit_delay_ms: Option<u64>,
    pub mismatch: MismatchConfig,
    pub new_items: NewItemConfig,
    pub pfd: PfdConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            wiki_api: "https://en.wikipedia.org/w/api.php".to_string(),
            repo_api: "https://www.wikidata.org/w/api.php".to_string(),
            site_id: "enwiki".to_string(),
            language: "en".to_string(),
            article_url_prefix: "http://en.wikipedia.org/wiki/".to_string(),
            user: None,
            password: None,
            edit_delay_ms: None,
            mismatch: MismatchConfig::default(),
            new_items: NewItemConfig::default(),
            pfd: PfdConfig::default(),
        }
    }
}

impl BotConfig {
    /// Reads `path` (if it exists) and applies environment overrides on top
    /// of the built-in defaults.
    pub fn load(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| anyhow!("Can not read configuration from '{path}': {e}"))?;
        settings
            .try_deserialize()
            .map_err(|e| anyhow!("Invalid configuration in '{path}': {e}"))
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.user, &self.password) {
            (Some(user), Some(password)) => Some((user.as_str(), password.as_str())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MismatchConfig {
    pub root_category: String,
    /// Template on each tracking category naming the property and the local template
    pub tracking_template: String,
    pub max_per_category: usize,
}

impl Default for MismatchConfig {
    fn default() -> Self {
        Self {
            root_category: "Category:Wikipedia categories tracking Wikidata differences"
                .to_string(),
            tracking_template: "Wikidata tracking category".to_string(),
            max_per_category: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NewItemConfig {
    /// Items of templates (disambiguation, maintenance, ...) that rule a page out
    pub skip_template_items: Vec<String>,
    /// Category pages transcluding one of these are category redirects
    pub category_redirect_templates: Vec<String>,
    pub max_new_items: usize,
    pub days_since_last_edit: f64,
    pub days_since_last_edit_but_search: f64,
    /// Minimum page age; the last-edit threshold applies when unset
    pub creation_threshold_days: Option<f64>,
    /// Ask on stdin before each new item
    pub interactive: bool,
    pub instance_of: String,
    pub disambiguation_category_item: String,
    pub category_item: String,
    pub disambiguation_page_item: String,
}

impl Default for NewItemConfig {
    fn default() -> Self {
        Self {
            skip_template_items: SKIP_TEMPLATE_ITEMS.iter().map(|s| s.to_string()).collect(),
            category_redirect_templates: vec!["Template:Category redirect".to_string()],
            max_new_items: 100,
            days_since_last_edit: 1.0,
            days_since_last_edit_but_search: 7.0,
            creation_threshold_days: None,
            interactive: true,
            instance_of: "P31".to_string(),
            disambiguation_category_item: "Q15407973".to_string(),
            category_item: "Q4167836".to_string(),
            disambiguation_page_item: "Q4167410".to_string(),
        }
    }
}

impl NewItemConfig {
    pub fn creation_threshold(&self) -> f64 {
        self.creation_threshold_days
            .unwrap_or(self.days_since_last_edit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PfdConfig {
    pub listing_page: String,
    /// Separates open requests from those on hold
    pub on_hold_marker: String,
    pub notice_page: String,
    /// `{year}` is replaced by the current year
    pub archive_page_format: String,
    pub closing_marker: String,
}

impl Default for PfdConfig {
    fn default() -> Self {
        Self {
            listing_page: "Wikidata:Properties for deletion".to_string(),
            on_hold_marker: "<!-- Below are request currently on hold, means consensus has been reached and they are waiting for deletion -->".to_string(),
            notice_page: "Template:Watchlist summary/PFD".to_string(),
            archive_page_format: "Wikidata:Properties for deletion/Archive/{year}".to_string(),
            closing_marker: "{{discussion bottom}}".to_string(),
        }
    }
}

impl PfdConfig {
    pub fn archive_page(&self, year: i32) -> String {
        self.archive_page_format.replace("{year}", &year.to_string())
    }
}
