use crate::report::ClubReport;

/// Shared palette and number format. Both back ends must realize these
/// identically.
pub const ACCENT_FILL: u32 = 0x4472C4;
pub const ACCENT_TEXT: u32 = 0xFFFFFF;
pub const ALERT_FILL: u32 = 0xFFC7CE;
pub const BLANK_FILL: u32 = 0xF2F2F2;
pub const NUMBER_FORMAT: &str = "#,##0";

pub const GAP_TITLE: &str = " ";

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Blank,
}

/// Style role of a cell. Back ends map roles to concrete formats; the
/// roles themselves are decided here, once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    /// Bold, accent fill, light centered text.
    Header,
    /// Accent fill, used for the gap column through every row.
    Gap,
    /// Literal text with a thin border.
    Text,
    /// Thousands-separated integer with a thin border.
    Number,
    /// Present value below the club threshold, alert fill.
    NumberAlert,
    /// Missing day value in a data row, grey fill.
    BlankShade,
    /// Summary-row label, accent fill and bold.
    SummaryLabel,
    /// Summary-row number, accent fill and bold.
    SummaryNumber,
    /// Empty summary-row cell, accent fill.
    SummaryBlank,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: CellStyle,
}

impl Cell {
    fn text(value: impl Into<String>) -> Self {
        Cell {
            value: CellValue::Text(value.into()),
            style: CellStyle::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    MemberId,
    MemberName,
    Average,
    Day(i64),
    Gap,
    Total,
}

#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub kind: ColumnKind,
    pub title: String,
    /// Character width, as the file medium measures columns.
    pub width: f64,
}

/// The fully laid-out grid: every cell's value and style role, plus the
/// extents the media need (filter span, frozen header). Both renderers
/// consume this and nothing else.
#[derive(Debug, Clone)]
pub struct ReportGrid {
    pub title: String,
    pub columns: Vec<ColumnSpec>,
    pub header: Vec<Cell>,
    pub data_rows: Vec<Vec<Cell>>,
    pub summary_rows: Vec<Vec<Cell>>,
}

impl ReportGrid {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Header + data + summary.
    pub fn row_count(&self) -> usize {
        1 + self.data_rows.len() + self.summary_rows.len()
    }

    /// The interactive filter spans the header and data rows only.
    pub fn filter_row_count(&self) -> usize {
        1 + self.data_rows.len()
    }

    pub fn frozen_rows(&self) -> u32 {
        1
    }

    /// All rows in render order.
    pub fn rows(&self) -> impl Iterator<Item = &Vec<Cell>> {
        std::iter::once(&self.header)
            .chain(self.data_rows.iter())
            .chain(self.summary_rows.iter())
    }
}

pub fn build_report_grid(title: &str, report: &ClubReport, threshold: f64) -> ReportGrid {
    let columns = build_columns(&report.days);

    let header = columns
        .iter()
        .map(|col| Cell {
            value: CellValue::Text(col.title.clone()),
            style: match col.kind {
                ColumnKind::Gap => CellStyle::Gap,
                _ => CellStyle::Header,
            },
        })
        .collect();

    let data_rows = report
        .members
        .iter()
        .map(|member| {
            columns
                .iter()
                .map(|col| match col.kind {
                    ColumnKind::MemberId => Cell::text(member.member_id.clone()),
                    ColumnKind::MemberName => Cell::text(member.member_name.clone()),
                    ColumnKind::Average => metric_cell(member.average_per_day, threshold),
                    ColumnKind::Day(day) => day_cell(member.days.get(&day).copied(), threshold),
                    ColumnKind::Gap => gap_cell(),
                    ColumnKind::Total => plain_number_cell(member.total),
                })
                .collect()
        })
        .collect();

    let day_index: std::collections::HashMap<i64, usize> = report
        .days
        .iter()
        .enumerate()
        .map(|(idx, day)| (*day, idx))
        .collect();

    let totals_row = columns
        .iter()
        .map(|col| match col.kind {
            ColumnKind::MemberId => summary_blank(),
            ColumnKind::MemberName => summary_label("Total"),
            ColumnKind::Average => summary_number_cell(report.totals.average),
            ColumnKind::Day(day) => summary_number_cell(report.totals.days[day_index[&day]]),
            ColumnKind::Gap => gap_cell(),
            ColumnKind::Total => summary_number_cell(report.totals.total),
        })
        .collect();

    let day_avg_row = columns
        .iter()
        .map(|col| match col.kind {
            ColumnKind::MemberName => summary_label("Day AVG"),
            ColumnKind::Day(day) => summary_number_cell(report.day_averages[day_index[&day]]),
            ColumnKind::Gap => gap_cell(),
            _ => summary_blank(),
        })
        .collect();

    ReportGrid {
        title: title.to_string(),
        columns,
        header,
        data_rows,
        summary_rows: vec![totals_row, day_avg_row],
    }
}

fn build_columns(days: &[i64]) -> Vec<ColumnSpec> {
    let mut columns = vec![
        ColumnSpec {
            kind: ColumnKind::MemberId,
            title: "Member_ID".to_string(),
            width: 20.0,
        },
        ColumnSpec {
            kind: ColumnKind::MemberName,
            title: "Member_Name".to_string(),
            width: 18.0,
        },
        ColumnSpec {
            kind: ColumnKind::Average,
            title: "AVG/d".to_string(),
            width: 12.0,
        },
    ];
    for day in days {
        columns.push(ColumnSpec {
            kind: ColumnKind::Day(*day),
            title: format!("Day {day}"),
            width: 12.0,
        });
    }
    columns.push(ColumnSpec {
        kind: ColumnKind::Gap,
        title: GAP_TITLE.to_string(),
        width: 2.0,
    });
    columns.push(ColumnSpec {
        kind: ColumnKind::Total,
        title: "Total".to_string(),
        width: 12.0,
    });
    columns
}

/// AVG/d cell: numeric, alert-filled below threshold. A member with no
/// recorded values keeps a plain bordered blank.
fn metric_cell(value: Option<f64>, threshold: f64) -> Cell {
    match value {
        Some(v) if v < threshold => Cell {
            value: CellValue::Number(v),
            style: CellStyle::NumberAlert,
        },
        Some(v) => Cell {
            value: CellValue::Number(v),
            style: CellStyle::Number,
        },
        None => Cell {
            value: CellValue::Blank,
            style: CellStyle::Text,
        },
    }
}

/// Day cell: like AVG/d, except a missing value gets the grey blank shade.
fn day_cell(value: Option<f64>, threshold: f64) -> Cell {
    match value {
        Some(_) => metric_cell(value, threshold),
        None => Cell {
            value: CellValue::Blank,
            style: CellStyle::BlankShade,
        },
    }
}

fn plain_number_cell(value: Option<f64>) -> Cell {
    match value {
        Some(v) => Cell {
            value: CellValue::Number(v),
            style: CellStyle::Number,
        },
        None => Cell {
            value: CellValue::Blank,
            style: CellStyle::Text,
        },
    }
}

fn summary_number_cell(value: Option<f64>) -> Cell {
    match value {
        Some(v) => Cell {
            value: CellValue::Number(v),
            style: CellStyle::SummaryNumber,
        },
        None => summary_blank(),
    }
}

fn summary_label(label: &str) -> Cell {
    Cell {
        value: CellValue::Text(label.to_string()),
        style: CellStyle::SummaryLabel,
    }
}

fn summary_blank() -> Cell {
    Cell {
        value: CellValue::Blank,
        style: CellStyle::SummaryBlank,
    }
}

fn gap_cell() -> Cell {
    Cell {
        value: CellValue::Blank,
        style: CellStyle::Gap,
    }
}
