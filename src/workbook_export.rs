use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook};

use crate::grid::{
    CellStyle, CellValue, ReportGrid, ACCENT_FILL, ACCENT_TEXT, ALERT_FILL, BLANK_FILL,
    NUMBER_FORMAT,
};

struct GridFormats {
    header: Format,
    gap: Format,
    text: Format,
    number: Format,
    number_alert: Format,
    blank_shade: Format,
    summary_label: Format,
    summary_number: Format,
    summary_blank: Format,
}

fn build_formats() -> GridFormats {
    let header = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_background_color(ACCENT_FILL)
        .set_font_color(ACCENT_TEXT)
        .set_border(FormatBorder::Thin);

    let gap = Format::new()
        .set_background_color(ACCENT_FILL)
        .set_border(FormatBorder::Thin);

    let text = Format::new()
        .set_num_format("@")
        .set_border(FormatBorder::Thin);

    let number = Format::new()
        .set_num_format(NUMBER_FORMAT)
        .set_border(FormatBorder::Thin);

    let number_alert = Format::new()
        .set_num_format(NUMBER_FORMAT)
        .set_background_color(ALERT_FILL)
        .set_border(FormatBorder::Thin);

    let blank_shade = Format::new()
        .set_background_color(BLANK_FILL)
        .set_border(FormatBorder::Thin);

    let summary_label = Format::new()
        .set_bold()
        .set_background_color(ACCENT_FILL)
        .set_font_color(ACCENT_TEXT)
        .set_border(FormatBorder::Thin);

    let summary_number = Format::new()
        .set_bold()
        .set_num_format(NUMBER_FORMAT)
        .set_background_color(ACCENT_FILL)
        .set_font_color(ACCENT_TEXT)
        .set_border(FormatBorder::Thin);

    let summary_blank = Format::new()
        .set_bold()
        .set_background_color(ACCENT_FILL)
        .set_border(FormatBorder::Thin);

    GridFormats {
        header,
        gap,
        text,
        number,
        number_alert,
        blank_shade,
        summary_label,
        summary_number,
        summary_blank,
    }
}

fn style_format<'a>(formats: &'a GridFormats, style: CellStyle) -> &'a Format {
    match style {
        CellStyle::Header => &formats.header,
        CellStyle::Gap => &formats.gap,
        CellStyle::Text => &formats.text,
        CellStyle::Number => &formats.number,
        CellStyle::NumberAlert => &formats.number_alert,
        CellStyle::BlankShade => &formats.blank_shade,
        CellStyle::SummaryLabel => &formats.summary_label,
        CellStyle::SummaryNumber => &formats.summary_number,
        CellStyle::SummaryBlank => &formats.summary_blank,
    }
}

/// Realize the grid as a single-sheet workbook.
pub fn build_workbook(grid: &ReportGrid) -> Result<Workbook> {
    let formats = build_formats();
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet
        .set_name(&grid.title)
        .with_context(|| format!("invalid sheet name {:?}", grid.title))?;

    for (col_idx, column) in grid.columns.iter().enumerate() {
        sheet
            .set_column_width(col_idx as u16, column.width)
            .with_context(|| format!("set width of column {col_idx}"))?;
    }

    for (row_idx, row) in grid.rows().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let format = style_format(&formats, cell.style);
            let (row_idx, col_idx) = (row_idx as u32, col_idx as u16);
            match &cell.value {
                CellValue::Text(text) => sheet.write_string_with_format(row_idx, col_idx, text, format),
                CellValue::Number(value) => {
                    sheet.write_number_with_format(row_idx, col_idx, *value, format)
                }
                CellValue::Blank => sheet.write_blank(row_idx, col_idx, format),
            }
            .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }

    let last_col = grid.column_count().saturating_sub(1) as u16;
    let last_filter_row = grid.filter_row_count().saturating_sub(1) as u32;
    sheet
        .autofilter(0, 0, last_filter_row, last_col)
        .context("apply autofilter")?;
    sheet.set_freeze_panes(grid.frozen_rows(), 0).context("freeze header")?;

    Ok(workbook)
}

pub fn write_workbook(grid: &ReportGrid, path: &Path) -> Result<()> {
    let mut workbook = build_workbook(grid)?;
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}
