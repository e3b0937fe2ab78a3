use std::fmt;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::grid::{
    CellStyle, CellValue, ColumnKind, ReportGrid, ACCENT_FILL, ACCENT_TEXT, ALERT_FILL,
    BLANK_FILL, NUMBER_FORMAT,
};
use crate::history_fetch::http_client;

const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Error answer from the Sheets API, with the HTTP status attached.
#[derive(Debug)]
pub struct SheetsApiError {
    pub status: u16,
    pub message: String,
}

impl fmt::Display for SheetsApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sheets api http {}: {}", self.status, self.message)
    }
}

impl std::error::Error for SheetsApiError {}

/// Retry only the service's own internal failures; quota, permission and
/// malformed-request answers must surface immediately.
pub fn is_service_internal_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<SheetsApiError>()
            .is_some_and(|e| e.status == 500 || e.status == 503)
    })
}

/// Thin client over the Sheets v4 REST surface. The access token is an
/// opaque input; obtaining it is someone else's job.
pub struct SheetsClient {
    spreadsheet_id: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    #[serde(rename = "sheetId")]
    sheet_id: i64,
    title: String,
}

impl SheetsClient {
    pub fn new(spreadsheet_id: impl Into<String>, token: impl Into<String>) -> Self {
        SheetsClient {
            spreadsheet_id: spreadsheet_id.into(),
            token: token.into(),
        }
    }

    /// Deliver the grid into its club sheet, destroying any existing sheet
    /// of the same title first. One bulk cell write, then one batched
    /// formatting call.
    pub fn replace_sheet(&self, grid: &ReportGrid) -> Result<()> {
        let existing = self.find_sheet_id(&grid.title)?;

        let mut requests = Vec::new();
        if let Some(sheet_id) = existing {
            requests.push(json!({ "deleteSheet": { "sheetId": sheet_id } }));
        }
        requests.push(json!({
            "addSheet": {
                "properties": {
                    "title": grid.title,
                    "gridProperties": {
                        "rowCount": grid.row_count(),
                        "columnCount": grid.column_count(),
                    },
                }
            }
        }));
        let reply = self.batch_update(&requests).context("recreate sheet")?;
        let sheet_id = added_sheet_id(&reply)?;

        self.batch_update(&[bulk_write_request(grid, sheet_id)])
            .context("bulk cell write")?;
        self.batch_update(&format_requests(grid, sheet_id))
            .context("apply formatting")?;
        Ok(())
    }

    fn find_sheet_id(&self, title: &str) -> Result<Option<i64>> {
        let url = format!(
            "{SHEETS_API_URL}/{}?fields=sheets.properties(sheetId,title)",
            self.spreadsheet_id
        );
        let body = self.api_get(&url)?;
        let meta: SpreadsheetMeta =
            serde_json::from_value(body).context("invalid spreadsheet metadata")?;
        Ok(meta
            .sheets
            .into_iter()
            .find(|entry| entry.properties.title == title)
            .map(|entry| entry.properties.sheet_id))
    }

    fn batch_update(&self, requests: &[Value]) -> Result<Value> {
        let url = format!("{SHEETS_API_URL}/{}:batchUpdate", self.spreadsheet_id);
        self.api_post(&url, &json!({ "requests": requests }))
    }

    fn api_get(&self, url: &str) -> Result<Value> {
        let resp = http_client()?
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .context("sheets request failed")?;
        read_api_response(resp)
    }

    fn api_post(&self, url: &str, body: &Value) -> Result<Value> {
        let resp = http_client()?
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .context("sheets request failed")?;
        read_api_response(resp)
    }
}

fn read_api_response(resp: reqwest::blocking::Response) -> Result<Value> {
    let status = resp.status();
    let body = resp.text().context("failed reading sheets response")?;
    if !status.is_success() {
        return Err(SheetsApiError {
            status: status.as_u16(),
            message: body.chars().take(400).collect(),
        }
        .into());
    }
    serde_json::from_str(&body).context("invalid sheets response json")
}

fn added_sheet_id(reply: &Value) -> Result<i64> {
    reply["replies"]
        .as_array()
        .into_iter()
        .flatten()
        .find_map(|entry| entry["addSheet"]["properties"]["sheetId"].as_i64())
        .ok_or_else(|| anyhow::anyhow!("batchUpdate reply carries no new sheet id"))
}

/// CellData for the bulk write: values only, formats come later.
fn cell_data(value: &CellValue) -> Value {
    match value {
        CellValue::Text(text) => json!({ "userEnteredValue": { "stringValue": text } }),
        CellValue::Number(number) => json!({ "userEnteredValue": { "numberValue": number } }),
        CellValue::Blank => json!({}),
    }
}

/// The single bulk cell write for the whole grid.
pub fn bulk_write_request(grid: &ReportGrid, sheet_id: i64) -> Value {
    let rows: Vec<Value> = grid
        .rows()
        .map(|row| json!({ "values": row.iter().map(|cell| cell_data(&cell.value)).collect::<Vec<_>>() }))
        .collect();
    json!({
        "updateCells": {
            "start": { "sheetId": sheet_id, "rowIndex": 0, "columnIndex": 0 },
            "rows": rows,
            "fields": "userEnteredValue",
        }
    })
}

/// Batched formatting: widths, borders, number formats, fills, frozen
/// header, basic filter.
pub fn format_requests(grid: &ReportGrid, sheet_id: i64) -> Vec<Value> {
    let n_rows = grid.row_count();
    let n_cols = grid.column_count();
    let mut requests = Vec::new();

    for (col, spec) in grid.columns.iter().enumerate() {
        requests.push(json!({
            "updateDimensionProperties": {
                "range": {
                    "sheetId": sheet_id,
                    "dimension": "COLUMNS",
                    "startIndex": col,
                    "endIndex": col + 1,
                },
                "properties": { "pixelSize": pixel_width(spec.width) },
                "fields": "pixelSize",
            }
        }));
    }

    let border = json!({ "style": "SOLID" });
    requests.push(json!({
        "updateBorders": {
            "range": grid_range(sheet_id, 0, n_rows, 0, n_cols),
            "top": border,
            "bottom": border,
            "left": border,
            "right": border,
            "innerHorizontal": border,
            "innerVertical": border,
        }
    }));

    // Literal text for ids and names, thousands-separated integers for
    // every numeric column.
    for (start, end, kind) in column_spans(grid) {
        let number_format = match kind {
            SpanKind::Text => json!({ "type": "TEXT" }),
            SpanKind::Numeric => json!({ "type": "NUMBER", "pattern": NUMBER_FORMAT }),
            SpanKind::Gap => continue,
        };
        requests.push(json!({
            "repeatCell": {
                "range": grid_range(sheet_id, 1, n_rows, start, end),
                "cell": { "userEnteredFormat": { "numberFormat": number_format } },
                "fields": "userEnteredFormat.numberFormat",
            }
        }));
    }

    requests.push(json!({
        "repeatCell": {
            "range": grid_range(sheet_id, 0, 1, 0, n_cols),
            "cell": { "userEnteredFormat": {
                "backgroundColor": color_json(ACCENT_FILL),
                "horizontalAlignment": "CENTER",
                "textFormat": { "bold": true, "foregroundColor": color_json(ACCENT_TEXT) },
            } },
            "fields": "userEnteredFormat(backgroundColor,horizontalAlignment,textFormat)",
        }
    }));

    let summary_start = grid.filter_row_count();
    requests.push(json!({
        "repeatCell": {
            "range": grid_range(sheet_id, summary_start, n_rows, 0, n_cols),
            "cell": { "userEnteredFormat": {
                "backgroundColor": color_json(ACCENT_FILL),
                "textFormat": { "bold": true, "foregroundColor": color_json(ACCENT_TEXT) },
            } },
            "fields": "userEnteredFormat(backgroundColor,textFormat)",
        }
    }));

    if let Some(gap_col) = grid
        .columns
        .iter()
        .position(|spec| spec.kind == ColumnKind::Gap)
    {
        requests.push(json!({
            "repeatCell": {
                "range": grid_range(sheet_id, 0, n_rows, gap_col, gap_col + 1),
                "cell": { "userEnteredFormat": { "backgroundColor": color_json(ACCENT_FILL) } },
                "fields": "userEnteredFormat.backgroundColor",
            }
        }));
    }

    for run in fill_runs(grid) {
        requests.push(json!({
            "repeatCell": {
                "range": grid_range(sheet_id, run.row, run.row + 1, run.start_col, run.end_col),
                "cell": { "userEnteredFormat": { "backgroundColor": color_json(run.fill) } },
                "fields": "userEnteredFormat.backgroundColor",
            }
        }));
    }

    requests.push(json!({
        "updateSheetProperties": {
            "properties": {
                "sheetId": sheet_id,
                "gridProperties": { "frozenRowCount": grid.frozen_rows() },
            },
            "fields": "gridProperties.frozenRowCount",
        }
    }));

    requests.push(json!({
        "setBasicFilter": {
            "filter": { "range": grid_range(sheet_id, 0, grid.filter_row_count(), 0, n_cols) }
        }
    }));

    requests
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpanKind {
    Text,
    Numeric,
    Gap,
}

fn span_kind(kind: ColumnKind) -> SpanKind {
    match kind {
        ColumnKind::MemberId | ColumnKind::MemberName => SpanKind::Text,
        ColumnKind::Average | ColumnKind::Day(_) | ColumnKind::Total => SpanKind::Numeric,
        ColumnKind::Gap => SpanKind::Gap,
    }
}

/// Contiguous column spans sharing one format class, half-open.
fn column_spans(grid: &ReportGrid) -> Vec<(usize, usize, SpanKind)> {
    let mut spans: Vec<(usize, usize, SpanKind)> = Vec::new();
    for (col, spec) in grid.columns.iter().enumerate() {
        let kind = span_kind(spec.kind);
        match spans.last_mut() {
            Some((_, end, last_kind)) if *last_kind == kind && *end == col => *end = col + 1,
            _ => spans.push((col, col + 1, kind)),
        }
    }
    spans
}

struct FillRun {
    row: usize,
    start_col: usize,
    end_col: usize,
    fill: u32,
}

/// Horizontal runs of alert/blank fills in the data rows, one request per
/// run rather than per cell.
fn fill_runs(grid: &ReportGrid) -> Vec<FillRun> {
    let mut runs: Vec<FillRun> = Vec::new();
    for (data_idx, row) in grid.data_rows.iter().enumerate() {
        let row_idx = 1 + data_idx;
        for (col_idx, cell) in row.iter().enumerate() {
            let fill = match cell.style {
                CellStyle::NumberAlert => ALERT_FILL,
                CellStyle::BlankShade => BLANK_FILL,
                _ => continue,
            };
            match runs.last_mut() {
                Some(run) if run.row == row_idx && run.end_col == col_idx && run.fill == fill => {
                    run.end_col = col_idx + 1;
                }
                _ => runs.push(FillRun {
                    row: row_idx,
                    start_col: col_idx,
                    end_col: col_idx + 1,
                    fill,
                }),
            }
        }
    }
    runs
}

fn grid_range(sheet_id: i64, start_row: usize, end_row: usize, start_col: usize, end_col: usize) -> Value {
    json!({
        "sheetId": sheet_id,
        "startRowIndex": start_row,
        "endRowIndex": end_row,
        "startColumnIndex": start_col,
        "endColumnIndex": end_col,
    })
}

fn color_json(hex: u32) -> Value {
    let red = ((hex >> 16) & 0xFF) as f64 / 255.0;
    let green = ((hex >> 8) & 0xFF) as f64 / 255.0;
    let blue = (hex & 0xFF) as f64 / 255.0;
    json!({ "red": red, "green": green, "blue": blue })
}

fn pixel_width(chars: f64) -> u32 {
    (chars * 7.0 + 5.0).round() as u32
}
