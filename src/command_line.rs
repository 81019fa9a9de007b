use crate::app_state::AppState;
use crate::mismatch::MismatchReporter;
use crate::new_items::confirm::{AlwaysConfirm, Confirm, StdinConfirm};
use crate::new_items::NewItemCreator;
use crate::pfd::PfdArchiver;
use anyhow::{anyhow, Result};
use chrono::{Datelike, Utc};

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
const USAGE: &str = "Usage: wikidata_bots <mismatch|new-items|pfd> [config-file]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Mismatch,
    NewItems,
    Pfd,
}

impl BotCommand {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "mismatch" => Ok(Self::Mismatch),
            "new-items" => Ok(Self::NewItems),
            "pfd" => Ok(Self::Pfd),
            other => Err(anyhow!("Unknown command '{other}'\n{USAGE}")),
        }
    }
}

/// Command and config file path from the arguments (program name excluded).
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<(BotCommand, String)> {
    let mut args = args.into_iter();
    let command = args.next().ok_or_else(|| anyhow!("{USAGE}"))?;
    let command = BotCommand::parse(&command)?;
    let config_file = args
        .next()
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
    if args.next().is_some() {
        return Err(anyhow!("Too many arguments\n{USAGE}"));
    }
    Ok((command, config_file))
}

pub async fn command_line_usage() -> Result<()> {
    let mut args = std::env::args();
    let _ = args.next(); // the actual command
    let (command, config_file) = parse_args(args)?;
    let app_state = AppState::new_from_file(&config_file)?;
    run_command(command, &app_state).await
}

pub async fn run_command(command: BotCommand, app_state: &AppState) -> Result<()> {
    let config = app_state.config();
    let errors = match command {
        BotCommand::Mismatch => {
            let client = app_state.wikipedia_client().await?;
            let report = MismatchReporter::new(config).run(&client).await?;
            for record in &report.records {
                println!("{record}");
            }
            println!(
                "{} mismatches in {} pages of {} categories ({} categories skipped)",
                report.records.len(),
                report.pages_checked,
                report.categories_scanned,
                report.categories_skipped
            );
            report.errors
        }
        BotCommand::NewItems => {
            let mut client = app_state.wikipedia_client().await?;
            let mut confirm: Box<dyn Confirm> = if config.new_items.interactive {
                Box::new(StdinConfirm)
            } else {
                Box::new(AlwaysConfirm)
            };
            let report = NewItemCreator::new(config)
                .run(&mut client, confirm.as_mut(), Utc::now())
                .await?;
            for (title, item) in &report.created {
                println!("{item}\t{title}");
            }
            println!(
                "{} items created, {} declined, {} skipped of {} pages",
                report.created.len(),
                report.declined,
                report.skipped_total(),
                report.pages_seen
            );
            for (reason, count) in &report.skipped {
                println!("  {reason}: {count}");
            }
            report.errors
        }
        BotCommand::Pfd => {
            let mut client = app_state.wikidata_client().await?;
            let report = PfdArchiver::new(&config.pfd)
                .run(&mut client, Utc::now().year())
                .await?;
            for page in &report.archived {
                println!("Archived {page}");
            }
            println!(
                "{} archived, {} still open, {} notice updates",
                report.archived.len(),
                report.still_open,
                report.notice_saves
            );
            report.errors
        }
    };
    if !errors.is_empty() {
        println!("{} errors:", errors.len());
        for error in &errors {
            println!("  {error}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(a: &[&str]) -> Vec<String> {
        a.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        assert_eq!(
            parse_args(args(&["pfd"])).unwrap(),
            (BotCommand::Pfd, DEFAULT_CONFIG_FILE.to_string())
        );
        assert_eq!(
            parse_args(args(&["new-items", "/etc/bots.toml"])).unwrap(),
            (BotCommand::NewItems, "/etc/bots.toml".to_string())
        );
        assert_eq!(
            parse_args(args(&["mismatch"])).unwrap().0,
            BotCommand::Mismatch
        );
    }

    #[test]
    fn test_bad_args() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["sync"])).is_err());
        assert!(parse_args(args(&["pfd", "a.json", "b.json"])).is_err());
    }
}
