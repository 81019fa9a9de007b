pub mod listing;
pub mod notice;

use crate::bot_config::PfdConfig;
use crate::pfd::listing::Listing;
use crate::pfd::notice::WatchlistNotice;
use crate::wiki_client::WikiClient;
use anyhow::{anyhow, Result};
use tracing::{debug, info, warn};

/// A discussion is closed when one of its last three lines carries the marker.
pub fn is_closed(text: &str, closing_marker: &str) -> bool {
    let marker = closing_marker.to_lowercase();
    text.lines()
        .rev()
        .take(3)
        .any(|line| line.to_lowercase().contains(&marker))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PfdReport {
    /// Discussion pages moved to the archive
    pub archived: Vec<String>,
    pub still_open: usize,
    pub notice_saves: usize,
    pub archive_saved: bool,
    pub listing_saved: bool,
    pub errors: Vec<String>,
}

impl PfdReport {
    fn error(&mut self, context: &str, e: anyhow::Error) {
        warn!("{context}: {e}");
        self.errors.push(format!("{context}: {e}"));
    }
}

/// Moves closed property deletion requests to the yearly archive and keeps
/// the watchlist notice in line with the open ones.
#[derive(Debug, Clone, Copy)]
pub struct PfdArchiver<'a> {
    config: &'a PfdConfig,
}

impl<'a> PfdArchiver<'a> {
    pub const fn new(config: &'a PfdConfig) -> Self {
        Self { config }
    }

    pub async fn run<C: WikiClient>(&self, client: &mut C, year: i32) -> Result<PfdReport> {
        let mut report = PfdReport::default();
        let archive_page = self.config.archive_page(year);
        let archive_text = client.page_text(&archive_page).await?.unwrap_or_default();
        let listing_text = client
            .page_text(&self.config.listing_page)
            .await?
            .ok_or_else(|| anyhow!("{} does not exist", self.config.listing_page))?;
        let mut notice_text = client
            .page_text(&self.config.notice_page)
            .await?
            .unwrap_or_default();

        let mut listing = Listing::parse(&listing_text, &self.config.on_hold_marker);
        let mut notice = WatchlistNotice::parse(&notice_text);
        debug!("On notice: {:?}", notice.properties());
        let mut new_archive_text = archive_text.to_owned();

        for request in listing.requests() {
            let discussion = match client.page_text(&request.page).await {
                Ok(Some(text)) => text,
                Ok(None) => {
                    report.error(&request.page, anyhow!("discussion page does not exist"));
                    continue;
                }
                Err(e) => {
                    report.error(&request.page, e);
                    continue;
                }
            };
            if is_closed(&discussion, &self.config.closing_marker) {
                info!("{} is closed, archiving", request.page);
                new_archive_text = format!("{new_archive_text}\n{}", request.line);
                listing.remove(&request);
                report.archived.push(request.page.to_owned());
                match request.property.as_deref() {
                    Some(property) if notice.remove(property) => {
                        let summary = self.notice_summary('-', property);
                        self.save_notice(client, &notice, &mut notice_text, &summary, &mut report)
                            .await;
                    }
                    _ => {}
                }
            } else {
                report.still_open += 1;
                match request.property.as_deref() {
                    Some(property) if notice.insert(property) => {
                        let summary = self.notice_summary('+', property);
                        self.save_notice(client, &notice, &mut notice_text, &summary, &mut report)
                            .await;
                    }
                    _ => {}
                }
            }
        }

        listing.tidy();
        let new_listing_text = listing.to_string();

        // The listing only loses requests once they are in the archive
        if new_archive_text != archive_text {
            client
                .save_page(
                    &archive_page,
                    &new_archive_text,
                    &format!("Archiving from [[{}]]", self.config.listing_page),
                )
                .await?;
            report.archive_saved = true;
        }
        if new_listing_text != listing_text {
            client
                .save_page(
                    &self.config.listing_page,
                    &new_listing_text,
                    &format!("Archiving closed requests to [[{archive_page}]]"),
                )
                .await?;
            report.listing_saved = true;
        }
        Ok(report)
    }

    fn notice_summary(&self, sign: char, property: &str) -> String {
        format!(
            "{sign} [[Property:P{property}]] ([[{}/P{property}|discussion]])",
            self.config.listing_page
        )
    }

    async fn save_notice<C: WikiClient>(
        &self,
        client: &mut C,
        notice: &WatchlistNotice,
        notice_text: &mut String,
        summary: &str,
        report: &mut PfdReport,
    ) {
        let text = notice.to_string();
        if text == *notice_text {
            return;
        }
        match client
            .save_page(&self.config.notice_page, &text, summary)
            .await
        {
            Ok(()) => {
                *notice_text = text;
                report.notice_saves += 1;
            }
            Err(e) => report.error(&self.config.notice_page, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_wiki::MockWiki;

    const LISTING: &str = "Wikidata:Properties for deletion";
    const NOTICE: &str = "Template:Watchlist summary/PFD";
    const ARCHIVE: &str = "Wikidata:Properties for deletion/Archive/2024";

    fn listing_text(config: &PfdConfig) -> String {
        format!(
            "{{{{Wikidata:Properties for deletion/Header}}}}\n{{{{Wikidata:Properties for deletion/P100}}}}\n{{{{Wikidata:Properties for deletion/P200}}}}\n{}\n{{{{Wikidata:Properties for deletion/P300}}}}\n",
            config.on_hold_marker
        )
    }

    fn notice_text(ids: &[&str]) -> String {
        let mut notice = WatchlistNotice::default();
        for id in ids {
            notice.insert(id);
        }
        notice.to_string()
    }

    fn wiki(config: &PfdConfig) -> MockWiki {
        MockWiki::new()
            .with_text(LISTING, &listing_text(config))
            .with_text(NOTICE, &notice_text(&["100"]))
            .with_text(ARCHIVE, "== Archive ==")
            .with_text(
                "Wikidata:Properties for deletion/P100",
                "=== P100 ===\nDelete.\n{{Discussion bottom}}\n",
            )
            .with_text(
                "Wikidata:Properties for deletion/P200",
                "=== P200 ===\nKeep?\n--~~~~",
            )
    }

    #[test]
    fn test_is_closed() {
        let marker = "{{discussion bottom}}";
        assert!(is_closed("a\nb\n{{Discussion Bottom}}", marker));
        assert!(is_closed("a\n{{discussion bottom}}\nb\nc", marker));
        assert!(!is_closed("{{discussion bottom}}\na\nb\nc", marker));
        assert!(is_closed("{{discussion bottom}}", marker));
        assert!(!is_closed("", marker));
    }

    #[tokio::test]
    async fn test_closed_request_is_archived() {
        let config = PfdConfig::default();
        let mut wiki = wiki(&config);
        let report = PfdArchiver::new(&config).run(&mut wiki, 2024).await.unwrap();
        assert_eq!(report.archived, vec!["Wikidata:Properties for deletion/P100"]);
        assert_eq!(report.still_open, 1);
        assert!(report.errors.is_empty());
        assert!(report.archive_saved);
        assert!(report.listing_saved);

        assert_eq!(
            wiki.texts[ARCHIVE],
            "== Archive ==\n{{Wikidata:Properties for deletion/P100}}"
        );
        let listing = &wiki.texts[LISTING];
        assert!(!listing.contains("/P100}}"));
        assert!(listing.contains("/P200}}"));
        assert!(listing.contains("/P300}}"));
        assert!(listing.contains(&config.on_hold_marker));

        assert_eq!(wiki.texts[NOTICE], notice_text(&["200"]));
        let notice_saves = wiki.saves_of(NOTICE);
        assert_eq!(notice_saves.len(), 2);
        assert_eq!(
            notice_saves[0].2,
            "- [[Property:P100]] ([[Wikidata:Properties for deletion/P100|discussion]])"
        );
        assert_eq!(
            notice_saves[1].2,
            "+ [[Property:P200]] ([[Wikidata:Properties for deletion/P200|discussion]])"
        );
        assert_eq!(
            wiki.saves_of(LISTING)[0].2,
            "Archiving closed requests to [[Wikidata:Properties for deletion/Archive/2024]]"
        );
        assert_eq!(
            wiki.saves_of(ARCHIVE)[0].2,
            "Archiving from [[Wikidata:Properties for deletion]]"
        );
    }

    #[tokio::test]
    async fn test_rerun_changes_nothing() {
        let config = PfdConfig::default();
        let mut wiki = wiki(&config);
        PfdArchiver::new(&config).run(&mut wiki, 2024).await.unwrap();
        let saves = wiki.saved.len();
        let report = PfdArchiver::new(&config).run(&mut wiki, 2024).await.unwrap();
        assert!(report.archived.is_empty());
        assert_eq!(report.notice_saves, 0);
        assert!(!report.archive_saved);
        assert!(!report.listing_saved);
        assert_eq!(wiki.saved.len(), saves);
    }

    #[tokio::test]
    async fn test_open_request_already_on_notice() {
        let config = PfdConfig::default();
        let mut wiki = wiki(&config)
            .with_text(NOTICE, &notice_text(&["100", "200"]))
            .with_text("Wikidata:Properties for deletion/P100", "Still talking");
        let report = PfdArchiver::new(&config).run(&mut wiki, 2024).await.unwrap();
        assert_eq!(report.still_open, 2);
        assert_eq!(report.notice_saves, 0);
        assert!(wiki.saved.is_empty());
    }

    #[tokio::test]
    async fn test_missing_discussion_is_reported() {
        let config = PfdConfig::default();
        let mut wiki = wiki(&config);
        wiki.texts.remove("Wikidata:Properties for deletion/P200");
        let report = PfdArchiver::new(&config).run(&mut wiki, 2024).await.unwrap();
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.archived.len(), 1);
        assert_eq!(report.still_open, 0);
    }

    #[tokio::test]
    async fn test_closed_multi_property_request_is_archived() {
        let config = PfdConfig::default();
        let listing = format!(
            "{{{{Wikidata:Properties for deletion/P2010 and P2011}}}}\n{{{{Wikidata:Properties for deletion/P200}}}}\n{}\n",
            config.on_hold_marker
        );
        let mut wiki = wiki(&config)
            .with_text(LISTING, &listing)
            .with_text(NOTICE, &notice_text(&["200"]))
            .with_text(
                "Wikidata:Properties for deletion/P2010 and P2011",
                "=== P2010, P2011 ===\nDeleted both.\n{{discussion bottom}}",
            );
        let report = PfdArchiver::new(&config).run(&mut wiki, 2024).await.unwrap();
        assert_eq!(
            report.archived,
            vec!["Wikidata:Properties for deletion/P2010 and P2011"]
        );
        assert_eq!(report.still_open, 1);
        assert_eq!(report.notice_saves, 0);
        assert!(report.errors.is_empty());
        assert_eq!(
            wiki.texts[ARCHIVE],
            "== Archive ==\n{{Wikidata:Properties for deletion/P2010 and P2011}}"
        );
        assert!(!wiki.texts[LISTING].contains("P2010"));
        assert!(wiki.texts[LISTING].contains("/P200}}"));
        assert_eq!(wiki.texts[NOTICE], notice_text(&["200"]));
    }

    #[tokio::test]
    async fn test_missing_listing_aborts() {
        let config = PfdConfig::default();
        let mut wiki = wiki(&config);
        wiki.texts.remove(LISTING);
        assert!(PfdArchiver::new(&config).run(&mut wiki, 2024).await.is_err());
    }

    #[tokio::test]
    async fn test_unreadable_archive_aborts_before_saving() {
        let config = PfdConfig::default();
        let mut wiki = wiki(&config);
        let listing = wiki.texts[LISTING].clone();
        wiki.broken.insert(ARCHIVE.to_string());
        assert!(PfdArchiver::new(&config).run(&mut wiki, 2024).await.is_err());
        assert_eq!(wiki.texts[LISTING], listing);
        assert!(wiki.saved.is_empty());
    }
}
