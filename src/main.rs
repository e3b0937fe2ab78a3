use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::warn;

use clubgain::batch::{self, ExportTarget};
use clubgain::config::{load_config, AppConfig, ClubConfig};
use clubgain::sheets_export::SheetsClient;

enum Selection {
    One(usize),
    All,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = load_config()?;
    let target = resolve_target(&config)?;

    let arg = env::args().nth(1);
    let selection = match arg {
        Some(choice) => parse_selection(&config, &choice),
        None => prompt_selection(&config)?,
    };

    match selection {
        Selection::One(idx) => {
            let club = &config.clubs[idx];
            announce(club, &target);
            let records = batch::fetch_club_with_retry(club)
                .with_context(|| format!("fetching {}", club.title))?;
            let destination = batch::export_club(club, &records, &target)?;
            println!("Exported {} to {destination}", club.title);
        }
        Selection::All => {
            println!("Exporting all {} clubs", config.clubs.len());
            let fetches = batch::fetch_all_clubs(&config.clubs);
            let summary = batch::export_clubs(&fetches, &target);
            println!(
                "Done: {} exported, {} failed",
                summary.exported.len(),
                summary.failed.len()
            );
            if !summary.failed.is_empty() {
                println!("Failed: {}", summary.failed.join(", "));
            }
            if summary.exported.is_empty() {
                anyhow::bail!("no club exported successfully");
            }
        }
    }

    Ok(())
}

/// Spreadsheet delivery when a spreadsheet id is configured, local
/// workbook files otherwise.
fn resolve_target(config: &AppConfig) -> Result<ExportTarget> {
    match config.spreadsheet_id.as_deref() {
        Some(spreadsheet_id) => {
            let token = env::var("SHEETS_ACCESS_TOKEN")
                .context("SHEETS_ACCESS_TOKEN must be set for spreadsheet export")?;
            Ok(ExportTarget::Spreadsheet(SheetsClient::new(
                spreadsheet_id,
                token.trim(),
            )))
        }
        None => Ok(ExportTarget::Workbook {
            dir: PathBuf::from("."),
        }),
    }
}

fn prompt_selection(config: &AppConfig) -> Result<Selection> {
    println!("=== Choose a club to export ===");
    for (idx, club) in config.clubs.iter().enumerate() {
        println!("{}. {}", idx + 1, club.title);
    }
    println!("A. ALL clubs");
    print!("Enter 1-{} or A: ", config.clubs.len());
    io::stdout().flush().ok();

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("failed reading selection")?;
    Ok(parse_selection(config, &line))
}

fn parse_selection(config: &AppConfig, raw: &str) -> Selection {
    let choice = raw.trim();
    if choice.eq_ignore_ascii_case("a") || choice.eq_ignore_ascii_case("all") {
        return Selection::All;
    }
    match choice.parse::<usize>() {
        Ok(n) if n >= 1 && n <= config.clubs.len() => Selection::One(n - 1),
        _ if config.default_all => {
            warn!("invalid choice {choice:?}, defaulting to ALL");
            Selection::All
        }
        _ => {
            warn!("invalid choice {choice:?}, defaulting to 1");
            Selection::One(0)
        }
    }
}

fn announce(club: &ClubConfig, target: &ExportTarget) {
    println!("\nSelected: {}", club.title);
    println!("URL: {}", club.url);
    println!("Threshold: {}", club.threshold);
    match target {
        ExportTarget::Workbook { dir } => {
            println!("Workbook: {}\n", dir.join(club.workbook_file()).display());
        }
        ExportTarget::Spreadsheet(_) => println!("Sheet: {}\n", club.title),
    }
}
