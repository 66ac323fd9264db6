//! Revenue from transactions and payments

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::metrics::{group_count, time_series, within_window, TimeSeries, UNKNOWN};
use super::Period;
use crate::models::{Dataset, Transaction};

#[derive(Debug, Clone, Default, Serialize)]
pub struct RevenueReport {
    pub transactions: usize,
    pub settled: usize,
    pub pending: usize,
    /// Settled amounts
    pub total_revenue: f64,
    pub pending_amount: f64,
    pub total_commission: f64,
    pub average_deal: f64,
    pub by_status: BTreeMap<String, usize>,
    pub payments_count: usize,
    pub payments_total: f64,
    /// Settled revenue per day or month
    pub series: TimeSeries,
}

/// One bucket of the revenue series
#[derive(Debug, Clone, Serialize)]
pub struct RevenueRow {
    pub period: String,
    pub transactions: usize,
    pub revenue: f64,
}

impl RevenueReport {
    pub fn series_rows(&self) -> Vec<RevenueRow> {
        self.series
            .buckets
            .iter()
            .zip(&self.series.counts)
            .zip(&self.series.values)
            .map(|((bucket, count), value)| RevenueRow {
                period: bucket.clone(),
                transactions: *count,
                revenue: *value,
            })
            .collect()
    }
}

pub fn compute(data: &Dataset, period: Period, now: DateTime<Utc>) -> RevenueReport {
    let in_period = |t: &&Transaction| within_window(t.occurred_at(), period, now);

    let transactions: Vec<&Transaction> = data.transactions.iter().filter(in_period).collect();
    let settled: Vec<&Transaction> = transactions.iter().copied().filter(|t| t.is_settled()).collect();
    let pending: Vec<&Transaction> = transactions
        .iter()
        .copied()
        .filter(|t| t.status_is("pending"))
        .collect();
    let payments: Vec<&Transaction> = data.payments.iter().filter(in_period).collect();

    let total_revenue: f64 = settled.iter().map(|t| t.amount).sum();

    RevenueReport {
        transactions: transactions.len(),
        settled: settled.len(),
        pending: pending.len(),
        total_revenue,
        pending_amount: pending.iter().map(|t| t.amount).sum(),
        total_commission: settled.iter().map(|t| t.commission).sum(),
        average_deal: if settled.is_empty() {
            0.0
        } else {
            total_revenue / settled.len() as f64
        },
        by_status: group_count(transactions.iter().copied(), |t| t.status.as_deref(), UNKNOWN),
        payments_count: payments.len(),
        payments_total: payments.iter().map(|p| p.amount).sum(),
        series: time_series(
            settled.iter().copied(),
            |t| t.occurred_at(),
            |t| t.amount,
            period,
            now,
        ),
    }
}
