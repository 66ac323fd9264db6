//! Site-visit outcomes and visit-to-conversion

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::metrics::{rate, within_window};
use super::{MetricRow, Period};
use crate::models::Lead;

/// Canonical visit outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitOutcome {
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

impl VisitOutcome {
    pub fn from_status(status: &str) -> Self {
        match status {
            "completed" | "done" | "visited" => VisitOutcome::Completed,
            "cancelled" | "canceled" => VisitOutcome::Cancelled,
            "no_show" | "noshow" | "missed" => VisitOutcome::NoShow,
            _ => VisitOutcome::Scheduled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpcomingVisit {
    pub lead_id: String,
    pub name: String,
    pub agent_id: String,
    pub scheduled_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SiteVisitReport {
    /// Leads carrying a visit record
    pub total: usize,
    pub scheduled: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub no_show: usize,
    /// Scheduled visits whose date is still ahead
    pub pending: usize,
    pub show_up_rate: f64,
    /// Converted or booked among completed visits
    pub converted_after_visit: usize,
    pub visit_conversion_rate: f64,
    pub upcoming: Vec<UpcomingVisit>,
}

impl SiteVisitReport {
    pub fn status_rows(&self) -> Vec<MetricRow> {
        vec![
            MetricRow::new("Total Visits", self.total),
            MetricRow::new("Scheduled", self.scheduled),
            MetricRow::new("Completed", self.completed),
            MetricRow::new("Cancelled", self.cancelled),
            MetricRow::new("No Show", self.no_show),
            MetricRow::new("Pending", self.pending),
            MetricRow::new("Show-up Rate (%)", self.show_up_rate),
            MetricRow::new("Converted After Visit", self.converted_after_visit),
            MetricRow::new("Visit Conversion Rate (%)", self.visit_conversion_rate),
        ]
    }
}

pub fn compute(leads: &[Lead], period: Period, now: DateTime<Utc>) -> SiteVisitReport {
    let mut report = SiteVisitReport::default();
    let mut upcoming = Vec::new();

    for lead in leads.iter().filter(|l| within_window(l.created_at, period, now)) {
        let Some(status) = lead.site_visit_status() else {
            continue;
        };
        report.total += 1;

        let scheduled_date = lead.site_visit.as_ref().and_then(|v| v.scheduled_date);
        match VisitOutcome::from_status(&status) {
            VisitOutcome::Completed => {
                report.completed += 1;
                if lead.is_won() {
                    report.converted_after_visit += 1;
                }
            }
            VisitOutcome::Cancelled => report.cancelled += 1,
            VisitOutcome::NoShow => report.no_show += 1,
            VisitOutcome::Scheduled => {
                report.scheduled += 1;
                if let Some(date) = scheduled_date.filter(|d| *d >= now) {
                    report.pending += 1;
                    upcoming.push(UpcomingVisit {
                        lead_id: lead.id.to_string(),
                        name: lead.contact_name(),
                        agent_id: lead.assigned_to.to_string(),
                        scheduled_date: date,
                    });
                }
            }
        }
    }

    upcoming.sort_by_key(|v| v.scheduled_date);
    upcoming.truncate(10);
    report.upcoming = upcoming;

    report.show_up_rate = rate(
        report.completed,
        report.completed + report.no_show + report.cancelled,
    );
    report.visit_conversion_rate = rate(report.converted_after_visit, report.completed);
    report
}
