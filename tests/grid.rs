use clubgain::grid::{build_report_grid, CellStyle, CellValue, ColumnKind};
use clubgain::history_fetch::ContributionRecord;
use clubgain::report::build_club_report;

fn record(id: &str, name: &str, day: i64, contribution: impl Into<Option<f64>>) -> ContributionRecord {
    ContributionRecord {
        member_id: id.to_string(),
        member_name: name.to_string(),
        day: Some(day),
        contribution: contribution.into(),
    }
}

fn sample_records() -> Vec<ContributionRecord> {
    vec![
        record("101", "Hazuki", 1, 2_000_000.0),
        record("101", "Hazuki", 2, 1_000_000.0),
        record("202", "Mizuki", 1, 900_000.0),
        record("202", "Mizuki", 2, 800_000.0),
    ]
}

#[test]
fn column_layout_matches_the_contract() {
    let report = build_club_report(&sample_records());
    let grid = build_report_grid("ENDGAME S", &report, 1_500_000.0);

    let kinds: Vec<ColumnKind> = grid.columns.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ColumnKind::MemberId,
            ColumnKind::MemberName,
            ColumnKind::Average,
            ColumnKind::Day(1),
            ColumnKind::Day(2),
            ColumnKind::Gap,
            ColumnKind::Total,
        ]
    );

    let titles: Vec<&str> = grid.columns.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Member_ID", "Member_Name", "AVG/d", "Day 1", "Day 2", " ", "Total"]
    );

    // Header, two data rows, totals row, day-average row.
    assert_eq!(grid.row_count(), 5);
    assert_eq!(grid.filter_row_count(), 3);
    assert_eq!(grid.frozen_rows(), 1);
}

#[test]
fn summary_rows_carry_labels_and_blanks_where_specified() {
    let report = build_club_report(&sample_records());
    let grid = build_report_grid("ENDGAME S", &report, 1_500_000.0);

    let totals = &grid.summary_rows[0];
    assert_eq!(totals[0].value, CellValue::Blank);
    assert_eq!(totals[1].value, CellValue::Text("Total".to_string()));
    // AVG/d sum: 1,500,000 + 850,000.
    assert_eq!(totals[2].value, CellValue::Number(2_350_000.0));
    assert_eq!(totals[6].value, CellValue::Number(4_700_000.0));

    let day_avg = &grid.summary_rows[1];
    assert_eq!(day_avg[1].value, CellValue::Text("Day AVG".to_string()));
    // No value under AVG/d, gap, or Total.
    assert_eq!(day_avg[0].value, CellValue::Blank);
    assert_eq!(day_avg[2].value, CellValue::Blank);
    assert_eq!(day_avg[5].value, CellValue::Blank);
    assert_eq!(day_avg[6].value, CellValue::Blank);
    assert_eq!(day_avg[3].value, CellValue::Number(1_450_000.0));
}

#[test]
fn threshold_highlights_data_rows_only() {
    let report = build_club_report(&sample_records());
    let grid = build_report_grid("ENDGAME S", &report, 1_500_000.0);

    // Mizuki (ranked second) is below threshold on every metric.
    let mizuki = &grid.data_rows[1];
    assert_eq!(mizuki[2].style, CellStyle::NumberAlert);
    assert_eq!(mizuki[3].style, CellStyle::NumberAlert);
    assert_eq!(mizuki[4].style, CellStyle::NumberAlert);

    // Hazuki's day 2 is below threshold, day 1 is not.
    let hazuki = &grid.data_rows[0];
    assert_eq!(hazuki[3].style, CellStyle::Number);
    assert_eq!(hazuki[4].style, CellStyle::NumberAlert);

    // The day-average row dips below threshold too, but summary rows are
    // never flagged.
    let day_avg = &grid.summary_rows[1];
    assert_eq!(day_avg[4].value, CellValue::Number(900_000.0));
    assert_eq!(day_avg[4].style, CellStyle::SummaryNumber);
    for cell in grid.summary_rows.iter().flatten() {
        assert_ne!(cell.style, CellStyle::NumberAlert);
    }
}

#[test]
fn missing_day_cells_get_the_blank_shade() {
    let mut records = sample_records();
    records.push(record("303", "Touya", 2, 700_000.0));
    let report = build_club_report(&records);
    let grid = build_report_grid("ENDGAME S", &report, 1_500_000.0);

    let touya = grid
        .data_rows
        .iter()
        .find(|row| row[1].value == CellValue::Text("Touya".to_string()))
        .expect("Touya row should render");
    assert_eq!(touya[3].value, CellValue::Blank);
    assert_eq!(touya[3].style, CellStyle::BlankShade);
    // The total column blank is plain bordered, not day-shaded.
    assert_eq!(touya[6].style, CellStyle::Number);
}

#[test]
fn gap_column_is_accent_filled_through_every_row() {
    let report = build_club_report(&sample_records());
    let grid = build_report_grid("ENDGAME S", &report, 1_500_000.0);
    let gap_col = 5;
    for row in grid.rows() {
        assert_eq!(row[gap_col].style, CellStyle::Gap);
    }
}

#[test]
fn ids_render_as_literal_text() {
    let records = vec![
        record("007", "Bond", 1, 2_000_000.0),
        record("007", "Bond", 2, 2_000_000.0),
    ];
    let report = build_club_report(&records);
    let grid = build_report_grid("ENDGAME S", &report, 1_500_000.0);
    assert_eq!(grid.data_rows[0][0].value, CellValue::Text("007".to_string()));
    assert_eq!(grid.data_rows[0][0].style, CellStyle::Text);
}

#[test]
fn grid_round_trips_the_report() {
    let report = build_club_report(&sample_records());
    let grid = build_report_grid("ENDGAME S", &report, 1_500_000.0);

    // Reading the data rows back (ignoring formatting) reconstructs the
    // ranked report: same member order, same day values, same totals.
    for (row, member) in grid.data_rows.iter().zip(report.members.iter()) {
        assert_eq!(row[0].value, CellValue::Text(member.member_id.clone()));
        assert_eq!(row[1].value, CellValue::Text(member.member_name.clone()));
        for (offset, day) in report.days.iter().enumerate() {
            let expected = match member.days.get(day) {
                Some(value) => CellValue::Number(*value),
                None => CellValue::Blank,
            };
            assert_eq!(row[3 + offset].value, expected);
        }
        let expected_total = match member.total {
            Some(value) => CellValue::Number(value),
            None => CellValue::Blank,
        };
        assert_eq!(row[6].value, expected_total);
    }

    let totals = &grid.summary_rows[0];
    for (offset, expected) in report.totals.days.iter().enumerate() {
        let expected = match expected {
            Some(value) => CellValue::Number(*value),
            None => CellValue::Blank,
        };
        assert_eq!(totals[3 + offset].value, expected);
    }
}
