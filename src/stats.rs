use crate::models::Record;
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportStats {
    pub total_records: usize,
    pub total_count: i64,
    /// Average `count` per record across the filtered range.
    pub average_count: f64,
    /// Largest single-record `count` in the filtered range.
    pub max_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonTotal {
    pub person: String,
    pub total: i64,
}

pub fn build_stats(records: &[Record]) -> ReportStats {
    let total_records = records.len();
    let total_count: i64 = records.iter().map(|record| record.count).sum();
    let average_count = if total_records > 0 {
        total_count as f64 / total_records as f64
    } else {
        0.0
    };
    let max_count = records.iter().map(|record| record.count).max().unwrap_or(0);

    ReportStats {
        total_records,
        total_count,
        average_count,
        max_count,
    }
}

/// Series for the totals-by-day chart, in date order.
pub fn daily_series(records: &[Record]) -> Vec<DailyTotal> {
    let mut totals: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for record in records {
        *totals.entry(record.date).or_default() += record.count;
    }
    totals
        .into_iter()
        .map(|(date, total)| DailyTotal { date, total })
        .collect()
}

/// Series for the totals-by-person chart, in name order.
pub fn person_series(records: &[Record]) -> Vec<PersonTotal> {
    let mut totals: BTreeMap<String, i64> = BTreeMap::new();
    for record in records {
        *totals.entry(record.person.clone()).or_default() += record.count;
    }
    totals
        .into_iter()
        .map(|(person, total)| PersonTotal { person, total })
        .collect()
}
