//! Aggregation primitives shared by every report
//!
//! Everything here is pure: callers pass `now` explicitly so results are
//! reproducible from the fetched lists alone.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::Period;

/// Sentinel bucket for records without a category
pub const UNKNOWN: &str = "Unknown";
/// Sentinel bucket for leads without a campaign
pub const NO_CAMPAIGN: &str = "No Campaign";
/// Sentinel bucket for lost leads without a reason
pub const NOT_SPECIFIED: &str = "Not Specified";

/// Partition `items` by key and count each bucket.
///
/// Missing or blank keys land in `sentinel`, so the bucket counts always sum
/// to `items.len()`.
pub fn group_count<'a, T, I, F>(items: I, key: F, sentinel: &str) -> BTreeMap<String, usize>
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> Option<&str>,
{
    let mut counts = BTreeMap::new();
    for item in items {
        let bucket = key(item)
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .unwrap_or(sentinel);
        *counts.entry(bucket.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Percentage of `part` in `total`, rounded to one decimal.
///
/// Defined as 0 when `total` is 0.
pub fn rate(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(part as f64 / total as f64 * 100.0)
}

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// True when `timestamp` falls inside `period` ending at `now`.
///
/// Records without a timestamp are never inside a window.
pub fn within_window(timestamp: Option<DateTime<Utc>>, period: Period, now: DateTime<Utc>) -> bool {
    timestamp.is_some_and(|ts| ts >= period.cutoff(now))
}

/// Whole days between `then` and `now`, floored
pub fn days_since(then: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - then).num_seconds().div_euclid(86_400)
}

/// Latest of two optional timestamps
pub fn latest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// One labelled count, used for rankings and chart bars
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedCount {
    pub label: String,
    pub count: usize,
}

/// Sort buckets by count descending (ties alphabetical) and keep the first `n`
pub fn top_n(counts: &BTreeMap<String, usize>, n: usize) -> Vec<RankedCount> {
    let mut ranked: Vec<RankedCount> = counts
        .iter()
        .map(|(label, count)| RankedCount {
            label: label.clone(),
            count: *count,
        })
        .collect();
    // BTreeMap iteration is already alphabetical, a stable sort keeps it for ties
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(n);
    ranked
}

/// Bucket granularity for time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Month,
}

impl Granularity {
    /// Daily buckets up to 30 days, monthly beyond
    pub fn for_period(period: Period) -> Self {
        if period.days() <= 30 {
            Granularity::Day
        } else {
            Granularity::Month
        }
    }

    pub fn key(&self, ts: DateTime<Utc>) -> String {
        match self {
            Granularity::Day => ts.format("%Y-%m-%d").to_string(),
            Granularity::Month => ts.format("%Y-%m").to_string(),
        }
    }
}

/// Chronologically ordered buckets with a count and a summed value
#[derive(Debug, Clone, Default, Serialize)]
pub struct TimeSeries {
    pub buckets: Vec<String>,
    pub counts: Vec<usize>,
    pub values: Vec<f64>,
}

impl TimeSeries {
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Counts as u64 for sparkline widgets
    pub fn counts_u64(&self) -> Vec<u64> {
        self.counts.iter().map(|c| *c as u64).collect()
    }
}

/// Build a time series over records inside `period`.
///
/// `value` contributes to the per-bucket sum (use `|_| 0.0` for plain counts).
pub fn time_series<'a, T, I, F, V>(
    items: I,
    timestamp: F,
    value: V,
    period: Period,
    now: DateTime<Utc>,
) -> TimeSeries
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> Option<DateTime<Utc>>,
    V: Fn(&T) -> f64,
{
    let granularity = Granularity::for_period(period);
    let mut buckets: BTreeMap<String, (usize, f64)> = BTreeMap::new();

    for item in items {
        let ts = timestamp(item);
        if !within_window(ts, period, now) {
            continue;
        }
        let Some(ts) = ts else { continue };
        let entry = buckets.entry(granularity.key(ts)).or_default();
        entry.0 += 1;
        entry.1 += value(item);
    }

    TimeSeries {
        buckets: buckets.keys().cloned().collect(),
        counts: buckets.values().map(|(c, _)| *c).collect(),
        values: buckets.values().map(|(_, v)| *v).collect(),
    }
}
