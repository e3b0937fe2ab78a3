use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{error, info};
use rayon::prelude::*;

use crate::config::ClubConfig;
use crate::grid::build_report_grid;
use crate::history_fetch::{self, ContributionRecord};
use crate::report::build_club_report;
use crate::retry::retry;
use crate::sheets_export::{is_service_internal_error, SheetsClient};
use crate::workbook_export;

const FETCH_ATTEMPTS: u32 = 3;
const FETCH_RETRY_DELAY: Duration = Duration::from_secs(2);
const EXPORT_ATTEMPTS: u32 = 5;
const EXPORT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Per-club fetch outcome. The batch itself never fails; every club
/// settles with its own result.
pub struct ClubFetch {
    pub club: ClubConfig,
    pub records: Result<Vec<ContributionRecord>>,
}

pub enum ExportTarget {
    /// Local workbook files written into this directory.
    Workbook { dir: PathBuf },
    /// Named sheets inside the shared spreadsheet.
    Spreadsheet(SheetsClient),
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub exported: Vec<String>,
    pub failed: Vec<String>,
}

pub fn fetch_club_with_retry(club: &ClubConfig) -> Result<Vec<ContributionRecord>> {
    retry(
        &format!("fetch {}", club.title),
        FETCH_ATTEMPTS,
        FETCH_RETRY_DELAY,
        history_fetch::is_transient_fetch_error,
        || history_fetch::fetch_club_history(&club.url),
    )
}

/// Fetch every club concurrently on the bounded fetch pool. Results come
/// back in configured club order, not completion order.
pub fn fetch_all_clubs(clubs: &[ClubConfig]) -> Vec<ClubFetch> {
    with_fetch_pool(|| {
        clubs
            .par_iter()
            .map(|club| ClubFetch {
                club: club.clone(),
                records: fetch_club_with_retry(club),
            })
            .collect()
    })
}

/// Transform and deliver one club's records. Returns a description of the
/// destination for the run log.
pub fn export_club(
    club: &ClubConfig,
    records: &[ContributionRecord],
    target: &ExportTarget,
) -> Result<String> {
    let report = build_club_report(records);
    let grid = build_report_grid(&club.title, &report, club.threshold);

    match target {
        ExportTarget::Workbook { dir } => {
            let path = dir.join(club.workbook_file());
            workbook_export::write_workbook(&grid, &path)?;
            Ok(path.display().to_string())
        }
        ExportTarget::Spreadsheet(client) => {
            retry(
                &format!("export {}", club.title),
                EXPORT_ATTEMPTS,
                EXPORT_RETRY_DELAY,
                is_service_internal_error,
                || client.replace_sheet(&grid),
            )
            .with_context(|| format!("delivering sheet {:?}", club.title))?;
            Ok(format!("sheet {:?}", club.title))
        }
    }
}

/// Sequential delivery in configured club order. A failed club is logged
/// and skipped; the batch keeps going.
pub fn export_clubs(fetches: &[ClubFetch], target: &ExportTarget) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for fetch in fetches {
        let title = &fetch.club.title;
        match &fetch.records {
            Err(err) => {
                error!("{title}: fetch failed: {err:#}");
                summary.failed.push(title.clone());
            }
            Ok(records) => match export_club(&fetch.club, records, target) {
                Ok(destination) => {
                    info!("{title}: exported to {destination}");
                    summary.exported.push(title.clone());
                }
                Err(err) => {
                    error!("{title}: export failed: {err:#}");
                    summary.failed.push(title.clone());
                }
            },
        }
    }
    summary
}

fn with_fetch_pool<T>(action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    let threads = fetch_parallelism();
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(action),
        Err(_) => action(),
    }
}

fn fetch_parallelism() -> usize {
    env::var("FETCH_PARALLELISM")
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(6)
        .clamp(2, 32)
}
