//! Lead funnel: stage counts, conversion and loss over the period

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::metrics::{group_count, rate, top_n, within_window, RankedCount, NOT_SPECIFIED, UNKNOWN};
use super::Period;
use crate::models::{Lead, LeadStage};

/// One row of the funnel table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelStage {
    pub stage: LeadStage,
    pub label: String,
    pub count: usize,
    /// Share of the period's leads, in percent
    pub share: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FunnelReport {
    pub total: usize,
    pub stages: Vec<FunnelStage>,
    /// Converted or booked
    pub converted: usize,
    pub lost: usize,
    pub conversion_rate: f64,
    pub loss_rate: f64,
    pub by_source: BTreeMap<String, usize>,
    pub by_priority: BTreeMap<String, usize>,
    pub lost_reasons: BTreeMap<String, usize>,
    pub top_sources: Vec<RankedCount>,
}

impl FunnelReport {
    pub fn stage_count(&self, stage: LeadStage) -> usize {
        self.stages
            .iter()
            .find(|s| s.stage == stage)
            .map_or(0, |s| s.count)
    }
}

pub fn compute(leads: &[Lead], period: Period, now: DateTime<Utc>) -> FunnelReport {
    let leads: Vec<&Lead> = leads
        .iter()
        .filter(|l| within_window(l.created_at, period, now))
        .collect();
    let total = leads.len();

    let mut per_stage: BTreeMap<LeadStage, usize> = BTreeMap::new();
    for lead in &leads {
        *per_stage.entry(lead.stage()).or_insert(0) += 1;
    }

    let stages = LeadStage::all()
        .iter()
        .map(|stage| {
            let count = per_stage.get(stage).copied().unwrap_or(0);
            FunnelStage {
                stage: *stage,
                label: stage.label().to_string(),
                count,
                share: rate(count, total),
            }
        })
        .collect();

    let converted = leads.iter().filter(|l| l.is_won()).count();
    let lost: Vec<&Lead> = leads.iter().copied().filter(|l| l.is_lost()).collect();

    let by_source = group_count(leads.iter().copied(), |l| l.source.as_deref(), UNKNOWN);

    FunnelReport {
        total,
        stages,
        converted,
        lost: lost.len(),
        conversion_rate: rate(converted, total),
        loss_rate: rate(lost.len(), total),
        top_sources: top_n(&by_source, 5),
        by_source,
        by_priority: group_count(leads.iter().copied(), |l| l.priority.as_deref(), UNKNOWN),
        lost_reasons: group_count(lost, |l| l.lost_reason.as_deref(), NOT_SPECIFIED),
    }
}
