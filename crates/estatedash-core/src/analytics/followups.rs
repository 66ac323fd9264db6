//! Follow-up compliance
//!
//! A follow-up is honored when the lead was touched (status moved past `new`
//! or a communication was logged) before its date passed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::metrics::{days_since, rate, within_window};
use super::Period;
use crate::models::{Dataset, Lead};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverdueLead {
    pub lead_id: String,
    pub name: String,
    pub phone: String,
    pub agent_id: String,
    pub follow_up_date: DateTime<Utc>,
    pub days_overdue: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentCompliance {
    pub agent_id: String,
    pub name: String,
    pub due: usize,
    pub overdue: usize,
    pub compliance_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FollowUpReport {
    /// Leads with any follow-up date
    pub scheduled: usize,
    /// Follow-up date at or before now
    pub due: usize,
    pub overdue: usize,
    pub upcoming: usize,
    pub due_today: usize,
    pub compliance_rate: f64,
    /// Oldest first
    pub overdue_leads: Vec<OverdueLead>,
    pub by_agent: Vec<AgentCompliance>,
}

pub fn compute(data: &Dataset, period: Period, now: DateTime<Utc>) -> FollowUpReport {
    let leads: Vec<(&Lead, DateTime<Utc>)> = data
        .leads
        .iter()
        .filter(|l| within_window(l.created_at, period, now))
        .filter_map(|l| l.follow_up_date.map(|date| (l, date)))
        .collect();

    let due = leads.iter().filter(|(_, date)| *date <= now).count();
    let upcoming = leads.iter().filter(|(_, date)| *date > now).count();
    let due_today = leads
        .iter()
        .filter(|(_, date)| date.date_naive() == now.date_naive())
        .count();

    let mut overdue_leads: Vec<OverdueLead> = leads
        .iter()
        .filter(|(lead, _)| lead.is_follow_up_overdue(now))
        .map(|(lead, date)| OverdueLead {
            lead_id: lead.id.to_string(),
            name: lead.contact_name(),
            phone: lead.phone.clone().unwrap_or_default(),
            agent_id: lead.assigned_to.to_string(),
            follow_up_date: *date,
            days_overdue: days_since(*date, now),
        })
        .collect();
    overdue_leads.sort_by_key(|l| l.follow_up_date);
    let overdue = overdue_leads.len();

    // (due, overdue) per assignee
    let mut per_agent: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for (lead, date) in &leads {
        let Some(agent_id) = lead.assigned_to.id() else {
            continue;
        };
        if *date > now {
            continue;
        }
        let entry = per_agent.entry(agent_id.to_string()).or_default();
        entry.0 += 1;
        if lead.is_follow_up_overdue(now) {
            entry.1 += 1;
        }
    }

    let mut by_agent: Vec<AgentCompliance> = per_agent
        .into_iter()
        .map(|(agent_id, (due, overdue))| {
            let name = data
                .users
                .iter()
                .find(|u| u.id.points_to(&agent_id))
                .map_or_else(|| agent_id.clone(), |u| u.display_name());
            AgentCompliance {
                compliance_rate: rate(due - overdue, due),
                agent_id,
                name,
                due,
                overdue,
            }
        })
        .collect();
    by_agent.sort_by(|a, b| {
        a.compliance_rate
            .total_cmp(&b.compliance_rate)
            .then_with(|| b.overdue.cmp(&a.overdue))
    });

    FollowUpReport {
        scheduled: leads.len(),
        due,
        overdue,
        upcoming,
        due_today,
        compliance_rate: rate(due - overdue, due),
        overdue_leads,
        by_agent,
    }
}
