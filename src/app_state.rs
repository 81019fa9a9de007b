use crate::bot_config::BotConfig;
use crate::mediawiki_client::MediaWikiClient;
use anyhow::{anyhow, Result};
use tracing::{info, warn};
use wikimisc::mediawiki::api::Api;

/// Everything a bot run needs: the configuration, and the means to get
/// logged-in API clients for the content wiki and its repository.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    config: BotConfig,
}

impl AppState {
    pub const fn new(config: BotConfig) -> Self {
        Self { config }
    }

    pub fn new_from_file(path: &str) -> Result<Self> {
        Ok(Self::new(BotConfig::load(path)?))
    }

    pub const fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Client for bots that read the content wiki and write to the repository.
    pub async fn wikipedia_client(&self) -> Result<MediaWikiClient> {
        let wiki = self.get_api(&self.config.wiki_api).await?;
        let repo = self.get_api(&self.config.repo_api).await?;
        Ok(MediaWikiClient::new(
            wiki,
            repo,
            &self.config.site_id,
            &self.config.language,
        ))
    }

    /// Client for bots that only work on the repository itself.
    pub async fn wikidata_client(&self) -> Result<MediaWikiClient> {
        let repo = self.get_api(&self.config.repo_api).await?;
        Ok(MediaWikiClient::new_repo_only(
            repo,
            &self.config.site_id,
            &self.config.language,
        ))
    }

    async fn get_api(&self, url: &str) -> Result<Api> {
        let mut api = Api::new(url)
            .await
            .map_err(|e| anyhow!("Can't talk to {url}: {e}"))?;
        api.set_edit_delay(self.config.edit_delay_ms);
        match self.config.credentials() {
            Some((user, password)) => {
                api.login(user, password)
                    .await
                    .map_err(|e| anyhow!("Login to {url} as {user} failed: {e}"))?;
                info!("Logged in to {url} as {user}");
            }
            None => warn!("No credentials configured, {url} is read-only"),
        }
        Ok(api)
    }
}
