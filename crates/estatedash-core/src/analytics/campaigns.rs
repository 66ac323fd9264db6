//! Campaign ROI

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::metrics::{rate, within_window, NO_CAMPAIGN};
use super::Period;
use crate::models::Lead;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CampaignPerformance {
    pub campaign: String,
    pub leads: usize,
    pub site_visits: usize,
    pub converted: usize,
    pub lost: usize,
    pub conversion_rate: f64,
    /// Budgets of converted or booked leads
    pub revenue: f64,
    pub revenue_per_lead: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CampaignReport {
    pub total_leads: usize,
    pub total_revenue: f64,
    /// Ranked by converted leads, then leads
    pub campaigns: Vec<CampaignPerformance>,
    pub best_campaign: Option<String>,
}

pub fn compute(leads: &[Lead], period: Period, now: DateTime<Utc>) -> CampaignReport {
    let mut grouped: BTreeMap<String, Vec<&Lead>> = BTreeMap::new();
    let mut total_leads = 0;

    for lead in leads.iter().filter(|l| within_window(l.created_at, period, now)) {
        let name = lead
            .campaign
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(NO_CAMPAIGN);
        grouped.entry(name.to_string()).or_default().push(lead);
        total_leads += 1;
    }

    let mut campaigns: Vec<CampaignPerformance> = grouped
        .into_iter()
        .map(|(campaign, leads)| {
            let won: Vec<_> = leads.iter().filter(|l| l.is_won()).collect();
            let revenue: f64 = won.iter().filter_map(|l| l.budget).sum();
            CampaignPerformance {
                campaign,
                leads: leads.len(),
                site_visits: leads.iter().filter(|l| l.site_visit_status().is_some()).count(),
                converted: won.len(),
                lost: leads.iter().filter(|l| l.is_lost()).count(),
                conversion_rate: rate(won.len(), leads.len()),
                revenue,
                revenue_per_lead: if leads.is_empty() {
                    0.0
                } else {
                    revenue / leads.len() as f64
                },
            }
        })
        .collect();

    campaigns.sort_by(|a, b| {
        b.converted
            .cmp(&a.converted)
            .then_with(|| b.leads.cmp(&a.leads))
    });

    CampaignReport {
        total_leads,
        total_revenue: campaigns.iter().map(|c| c.revenue).sum(),
        best_campaign: campaigns
            .iter()
            .find(|c| c.converted > 0)
            .map(|c| c.campaign.clone()),
        campaigns,
    }
}
