use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_CLUBS_FILE: &str = "clubs.json";

/// One configured club. Immutable for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClubConfig {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub workbook_name: Option<String>,
    pub threshold: f64,
}

impl ClubConfig {
    /// File name for the workbook medium, falling back to the club title.
    pub fn workbook_file(&self) -> String {
        match self.workbook_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => format!("{}_export.xlsx", self.title.replace(' ', "_")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    #[serde(default)]
    pub default_all: bool,
    pub clubs: Vec<ClubConfig>,
}

/// Load the club list from the JSON config file, then let the environment
/// override the spreadsheet target (`SHEET_ID`).
pub fn load_config() -> Result<AppConfig> {
    let path = env::var("CLUBS_FILE").unwrap_or_else(|_| DEFAULT_CLUBS_FILE.to_string());
    let mut config = read_config_file(Path::new(&path))?;

    if let Ok(sheet_id) = env::var("SHEET_ID") {
        if !sheet_id.trim().is_empty() {
            config.spreadsheet_id = Some(sheet_id.trim().to_string());
        }
    }

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<AppConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading club config {}", path.display()))?;
    let config: AppConfig = serde_json::from_str(&raw)
        .with_context(|| format!("invalid club config {}", path.display()))?;
    if config.clubs.is_empty() {
        anyhow::bail!("club config {} lists no clubs", path.display());
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workbook_file_defaults_to_title() {
        let club = ClubConfig {
            title: "ENDGAME S".to_string(),
            url: "https://example.net/club_profile?circle_id=endgame".to_string(),
            workbook_name: None,
            threshold: 1_800_000.0,
        };
        assert_eq!(club.workbook_file(), "ENDGAME_S_export.xlsx");
    }

    #[test]
    fn config_parses_with_optional_fields_missing() {
        let raw = r#"{
            "clubs": [
                {"title": "EndGame", "url": "https://example.net/a", "threshold": 1800000}
            ]
        }"#;
        let config: AppConfig = serde_json::from_str(raw).expect("config should parse");
        assert!(config.spreadsheet_id.is_none());
        assert!(!config.default_all);
        assert_eq!(config.clubs.len(), 1);
    }
}
