//! Agent leaderboard

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::metrics::{rate, within_window};
use super::Period;
use crate::models::Dataset;

/// Per-agent row; listings are all-time, leads are the period's
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentPerformance {
    pub agent_id: String,
    pub name: String,
    pub email: String,
    pub agency_id: String,
    pub is_active: bool,
    pub listings: usize,
    pub active_listings: usize,
    /// Sold or rented
    pub closed_listings: usize,
    pub leads: usize,
    pub converted: usize,
    pub lost: usize,
    pub conversion_rate: f64,
    pub overdue_follow_ups: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AgentReport {
    pub total_agents: usize,
    pub active_agents: usize,
    /// Period leads whose assignee is not a known agent
    pub unassigned_leads: usize,
    /// Sorted by converted leads, then leads assigned
    pub agents: Vec<AgentPerformance>,
}

impl AgentReport {
    pub fn top(&self, n: usize) -> &[AgentPerformance] {
        &self.agents[..n.min(self.agents.len())]
    }
}

pub fn compute(data: &Dataset, period: Period, now: DateTime<Utc>) -> AgentReport {
    let period_leads: Vec<_> = data
        .leads
        .iter()
        .filter(|l| within_window(l.created_at, period, now))
        .collect();

    let mut agents: Vec<AgentPerformance> = data
        .agents()
        .filter_map(|agent| {
            let agent_id = agent.id.id()?;

            let listings: Vec<_> = data
                .properties
                .iter()
                .filter(|p| p.agent.points_to(agent_id))
                .collect();
            let leads: Vec<_> = period_leads
                .iter()
                .filter(|l| l.assigned_to.points_to(agent_id))
                .collect();
            let converted = leads.iter().filter(|l| l.is_won()).count();

            Some(AgentPerformance {
                agent_id: agent_id.to_string(),
                name: agent.display_name(),
                email: agent.email.clone().unwrap_or_default(),
                agency_id: agent.agency.to_string(),
                is_active: agent.is_active,
                listings: listings.len(),
                active_listings: listings.iter().filter(|p| p.status_is("active")).count(),
                closed_listings: listings.iter().filter(|p| p.is_closed()).count(),
                leads: leads.len(),
                converted,
                lost: leads.iter().filter(|l| l.is_lost()).count(),
                conversion_rate: rate(converted, leads.len()),
                overdue_follow_ups: leads
                    .iter()
                    .filter(|l| l.is_follow_up_overdue(now))
                    .count(),
            })
        })
        .collect();

    agents.sort_by(|a, b| {
        b.converted
            .cmp(&a.converted)
            .then_with(|| b.leads.cmp(&a.leads))
            .then_with(|| a.name.cmp(&b.name))
    });

    let unassigned_leads = period_leads
        .iter()
        .filter(|l| match l.assigned_to.id() {
            Some(id) => !agents.iter().any(|a| a.agent_id == id),
            None => true,
        })
        .count();

    AgentReport {
        total_agents: agents.len(),
        active_agents: agents.iter().filter(|a| a.is_active).count(),
        unassigned_leads,
        agents,
    }
}
