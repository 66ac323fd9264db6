//! Agency health scoring and activity recency
//!
//! Uses all fetched data rather than the period: health describes the
//! agency as it stands today.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use super::metrics::{days_since, latest, rate};
use crate::models::Dataset;

/// Three-tier qualitative activity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Good,
    Average,
    Poor,
}

impl HealthStatus {
    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Good => "good",
            HealthStatus::Average => "average",
            HealthStatus::Poor => "poor",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify an agency. Total over every input triple.
pub fn health_status(is_active: bool, agents: usize, leads: usize) -> HealthStatus {
    if is_active && agents >= 1 && leads > 5 {
        HealthStatus::Good
    } else if is_active && (agents >= 1 || leads >= 1) {
        HealthStatus::Average
    } else {
        HealthStatus::Poor
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgencyHealth {
    pub agency_id: String,
    pub name: String,
    pub is_active: bool,
    pub agents: usize,
    pub properties: usize,
    pub leads: usize,
    pub converted: usize,
    pub conversion_rate: f64,
    pub health: HealthStatus,
    pub last_activity: Option<DateTime<Utc>>,
    /// `None` when the agency has no lead or listing yet
    pub days_since_activity: Option<i64>,
}

impl AgencyHealth {
    pub fn activity(&self) -> usize {
        self.leads + self.properties
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AgencyReport {
    pub agencies: Vec<AgencyHealth>,
    pub good: usize,
    pub average: usize,
    pub poor: usize,
    pub inactive: usize,
    /// Agencies ordered by leads + properties, busiest first
    pub activity_ranking: Vec<AgencyHealth>,
}

pub fn compute(data: &Dataset, now: DateTime<Utc>) -> AgencyReport {
    let agencies: Vec<AgencyHealth> = data
        .agencies
        .iter()
        .filter_map(|agency| {
            let agency_id = agency.id.id()?;

            let agents = data
                .agents()
                .filter(|u| u.agency.points_to(agency_id))
                .count();

            let properties: Vec<_> = data
                .properties
                .iter()
                .filter(|p| p.agency.points_to(agency_id))
                .collect();
            let leads: Vec<_> = data
                .leads
                .iter()
                .filter(|l| l.agency.points_to(agency_id))
                .collect();
            let converted = leads.iter().filter(|l| l.is_won()).count();

            let last_lead = leads.iter().filter_map(|l| l.created_at).max();
            let last_listing = properties.iter().filter_map(|p| p.created_at).max();
            let last_activity = latest(last_lead, last_listing);

            Some(AgencyHealth {
                agency_id: agency_id.to_string(),
                name: agency.display_name().to_string(),
                is_active: agency.is_active,
                agents,
                properties: properties.len(),
                leads: leads.len(),
                converted,
                conversion_rate: rate(converted, leads.len()),
                health: health_status(agency.is_active, agents, leads.len()),
                last_activity,
                days_since_activity: last_activity.map(|ts| days_since(ts, now)),
            })
        })
        .collect();

    let count = |status| agencies.iter().filter(|a| a.health == status).count();
    let (good, average, poor) = (
        count(HealthStatus::Good),
        count(HealthStatus::Average),
        count(HealthStatus::Poor),
    );

    let mut activity_ranking = agencies.clone();
    activity_ranking.sort_by(|a, b| {
        b.activity()
            .cmp(&a.activity())
            .then_with(|| a.name.cmp(&b.name))
    });

    AgencyReport {
        good,
        average,
        poor,
        inactive: agencies.iter().filter(|a| !a.is_active).count(),
        activity_ranking,
        agencies,
    }
}
