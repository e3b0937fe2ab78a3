use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use crate::history_fetch::ContributionRecord;

/// One ranked report row. `days` holds only the values that were actually
/// recorded; a missing day stays missing rather than becoming zero.
#[derive(Debug, Clone)]
pub struct MemberRow {
    pub member_id: String,
    pub member_name: String,
    pub days: HashMap<i64, f64>,
    pub average_per_day: Option<f64>,
    pub total: Option<f64>,
}

/// Bottom summary values, aligned with the day column order.
#[derive(Debug, Clone)]
pub struct SummaryRow {
    pub average: Option<f64>,
    pub days: Vec<Option<f64>>,
    pub total: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ClubReport {
    pub members: Vec<MemberRow>,
    pub days: Vec<i64>,
    pub totals: SummaryRow,
    pub day_averages: Vec<Option<f64>>,
}

/// Pivot raw records into the ranked wide report.
///
/// Duplicate (member, day) pairs keep the first present value in input
/// order. Members with no value on the latest observed day are dropped.
/// Averages round half away from zero.
pub fn build_club_report(records: &[ContributionRecord]) -> ClubReport {
    let (mut members, day_set) = pivot_records(records);
    let days: Vec<i64> = day_set.into_iter().collect();

    for member in &mut members {
        let present: Vec<f64> = member.days.values().copied().collect();
        member.average_per_day = mean_rounded(&present);
        member.total = sum_present(present.iter().copied().map(Some));
    }

    if let Some(&latest) = days.last() {
        members.retain(|member| member.days.contains_key(&latest));
    }

    rank_members(&mut members);

    let totals = SummaryRow {
        average: sum_present(members.iter().map(|m| m.average_per_day)),
        days: days
            .iter()
            .map(|day| sum_present(members.iter().map(|m| m.days.get(day).copied())))
            .collect(),
        total: sum_present(members.iter().map(|m| m.total)),
    };

    let day_averages = days
        .iter()
        .map(|day| {
            let present: Vec<f64> = members
                .iter()
                .filter_map(|m| m.days.get(day).copied())
                .collect();
            mean_rounded(&present)
        })
        .collect();

    ClubReport {
        members,
        days,
        totals,
        day_averages,
    }
}

fn pivot_records(records: &[ContributionRecord]) -> (Vec<MemberRow>, BTreeSet<i64>) {
    let mut members: Vec<MemberRow> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut day_set = BTreeSet::new();

    for record in records {
        let key = (record.member_id.clone(), record.member_name.clone());
        let slot = *index.entry(key).or_insert_with(|| {
            members.push(MemberRow {
                member_id: record.member_id.clone(),
                member_name: record.member_name.clone(),
                days: HashMap::new(),
                average_per_day: None,
                total: None,
            });
            members.len() - 1
        });

        let Some(day) = record.day else {
            continue;
        };
        day_set.insert(day);
        if let Some(value) = record.contribution {
            members[slot].days.entry(day).or_insert(value);
        }
    }

    (members, day_set)
}

/// Stable: average descending, then name ascending; fully-equal keys keep
/// their input order.
fn rank_members(members: &mut [MemberRow]) {
    members.sort_by(|a, b| {
        let a_avg = a.average_per_day.unwrap_or(f64::NEG_INFINITY);
        let b_avg = b.average_per_day.unwrap_or(f64::NEG_INFINITY);
        match b_avg.partial_cmp(&a_avg).unwrap_or(Ordering::Equal) {
            Ordering::Equal => a.member_name.cmp(&b.member_name),
            other => other,
        }
    });
}

/// Mean over present values, rounded half away from zero. Empty input has
/// no mean.
fn mean_rounded(present: &[f64]) -> Option<f64> {
    if present.is_empty() {
        return None;
    }
    let sum: f64 = present.iter().sum();
    Some((sum / present.len() as f64).round())
}

/// Sum with min-count-1 semantics: a column with zero present values sums
/// to no-data, not zero.
fn sum_present(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let mut total = None;
    for value in values.flatten() {
        total = Some(total.unwrap_or(0.0) + value);
    }
    total
}
