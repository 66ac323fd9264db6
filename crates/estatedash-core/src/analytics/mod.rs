//! Report analytics for the CRM dashboards
//!
//! Turns fetched entity lists into report metrics: funnel counts, agent
//! leaderboards, agency health, campaign ROI, follow-up compliance, site-visit
//! conversion and revenue. Every function is pure and takes `now` explicitly.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::export::{to_records, ExportError};
use crate::fetcher::Collection;
use crate::models::Dataset;

pub mod agencies;
pub mod agents;
pub mod campaigns;
pub mod followups;
pub mod funnel;
pub mod metrics;
pub mod overview;
pub mod revenue;
pub mod site_visits;

#[cfg(test)]
mod tests;

pub use agencies::{health_status, AgencyHealth, AgencyReport, HealthStatus};
pub use agents::{AgentPerformance, AgentReport};
pub use campaigns::{CampaignPerformance, CampaignReport};
pub use followups::{AgentCompliance, FollowUpReport, OverdueLead};
pub use funnel::{FunnelReport, FunnelStage};
pub use metrics::{group_count, rate, top_n, within_window, RankedCount, TimeSeries};
pub use overview::OverviewReport;
pub use revenue::RevenueReport;
pub use site_visits::{SiteVisitReport, UpcomingVisit};

/// Reporting period selected in the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Period {
    #[serde(rename = "7d")]
    Last7d,
    #[default]
    #[serde(rename = "30d")]
    Last30d,
    #[serde(rename = "90d")]
    Last90d,
    #[serde(rename = "1y")]
    LastYear,
}

impl Period {
    pub fn all() -> &'static [Period] {
        &[
            Period::Last7d,
            Period::Last30d,
            Period::Last90d,
            Period::LastYear,
        ]
    }

    /// Resolve a period label; unrecognized labels fall back to 30 days
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "7d" | "7" | "week" => Period::Last7d,
            "30d" | "30" | "month" => Period::Last30d,
            "90d" | "90" | "quarter" => Period::Last90d,
            "1y" | "365d" | "365" | "year" => Period::LastYear,
            _ => Period::Last30d,
        }
    }

    /// Window length in days
    pub fn days(&self) -> i64 {
        match self {
            Period::Last7d => 7,
            Period::Last30d => 30,
            Period::Last90d => 90,
            Period::LastYear => 365,
        }
    }

    /// Short label ("7d", "30d", "90d", "1y")
    pub fn label(&self) -> &'static str {
        match self {
            Period::Last7d => "7d",
            Period::Last30d => "30d",
            Period::Last90d => "90d",
            Period::LastYear => "1y",
        }
    }

    /// Display label for headers
    pub fn display(&self) -> &'static str {
        match self {
            Period::Last7d => "Last 7 days",
            Period::Last30d => "Last 30 days",
            Period::Last90d => "Last 90 days",
            Period::LastYear => "Last year",
        }
    }

    /// Earliest instant inside the window ending at `now`
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days())
    }
}

impl FromStr for Period {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Period::parse(s))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One report screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReportKind {
    #[default]
    Overview,
    Funnel,
    Agents,
    Agencies,
    Campaigns,
    FollowUps,
    SiteVisits,
    Revenue,
}

impl ReportKind {
    pub fn all() -> &'static [ReportKind] {
        &[
            ReportKind::Overview,
            ReportKind::Funnel,
            ReportKind::Agents,
            ReportKind::Agencies,
            ReportKind::Campaigns,
            ReportKind::FollowUps,
            ReportKind::SiteVisits,
            ReportKind::Revenue,
        ]
    }

    pub fn index(&self) -> usize {
        Self::all().iter().position(|k| k == self).unwrap_or(0)
    }

    pub fn from_index(idx: usize) -> Self {
        Self::all().get(idx).copied().unwrap_or_default()
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReportKind::Overview => "Overview",
            ReportKind::Funnel => "Lead Funnel",
            ReportKind::Agents => "Agents",
            ReportKind::Agencies => "Agencies",
            ReportKind::Campaigns => "Campaigns",
            ReportKind::FollowUps => "Follow-ups",
            ReportKind::SiteVisits => "Site Visits",
            ReportKind::Revenue => "Revenue",
        }
    }

    /// Stable identifier used on the command line and in export file names
    pub fn slug(&self) -> &'static str {
        match self {
            ReportKind::Overview => "overview",
            ReportKind::Funnel => "lead-funnel",
            ReportKind::Agents => "agent-performance",
            ReportKind::Agencies => "agency-health",
            ReportKind::Campaigns => "campaigns",
            ReportKind::FollowUps => "follow-ups",
            ReportKind::SiteVisits => "site-visits",
            ReportKind::Revenue => "revenue",
        }
    }

    /// Collections the report needs; the fetcher only reads these
    pub fn required_collections(&self) -> &'static [Collection] {
        match self {
            ReportKind::Overview => &[
                Collection::Users,
                Collection::Properties,
                Collection::Leads,
                Collection::Agencies,
                Collection::Transactions,
            ],
            ReportKind::Funnel | ReportKind::Campaigns | ReportKind::SiteVisits => {
                &[Collection::Leads]
            }
            ReportKind::Agents | ReportKind::FollowUps => &[
                Collection::Users,
                Collection::Properties,
                Collection::Leads,
            ],
            ReportKind::Agencies => &[
                Collection::Users,
                Collection::Properties,
                Collection::Leads,
                Collection::Agencies,
            ],
            ReportKind::Revenue => &[Collection::Transactions, Collection::Payments],
        }
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overview" | "dashboard" => Ok(ReportKind::Overview),
            "lead-funnel" | "funnel" | "leads" => Ok(ReportKind::Funnel),
            "agent-performance" | "agents" => Ok(ReportKind::Agents),
            "agency-health" | "agencies" => Ok(ReportKind::Agencies),
            "campaigns" | "campaign-roi" => Ok(ReportKind::Campaigns),
            "follow-ups" | "followups" => Ok(ReportKind::FollowUps),
            "site-visits" | "visits" => Ok(ReportKind::SiteVisits),
            "revenue" | "transactions" => Ok(ReportKind::Revenue),
            _ => {
                let known: Vec<_> = ReportKind::all().iter().map(|k| k.slug()).collect();
                Err(format!(
                    "unknown report '{}' (expected one of: {})",
                    s,
                    known.join(", ")
                ))
            }
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Computed report for one screen
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "report", rename_all = "snake_case")]
pub enum ReportData {
    Overview(OverviewReport),
    Funnel(FunnelReport),
    Agents(AgentReport),
    Agencies(AgencyReport),
    Campaigns(CampaignReport),
    FollowUps(FollowUpReport),
    SiteVisits(SiteVisitReport),
    Revenue(RevenueReport),
}

impl ReportData {
    /// Compute `kind` from a fetched dataset (sync function)
    ///
    /// Cheap enough for a few thousand records per collection; callers on a
    /// render loop may still offload it to `tokio::task::spawn_blocking`.
    pub fn compute(kind: ReportKind, data: &Dataset, period: Period, now: DateTime<Utc>) -> Self {
        match kind {
            ReportKind::Overview => ReportData::Overview(overview::compute(data, period, now)),
            ReportKind::Funnel => ReportData::Funnel(funnel::compute(&data.leads, period, now)),
            ReportKind::Agents => ReportData::Agents(agents::compute(data, period, now)),
            ReportKind::Agencies => ReportData::Agencies(agencies::compute(data, now)),
            ReportKind::Campaigns => {
                ReportData::Campaigns(campaigns::compute(&data.leads, period, now))
            }
            ReportKind::FollowUps => ReportData::FollowUps(followups::compute(data, period, now)),
            ReportKind::SiteVisits => {
                ReportData::SiteVisits(site_visits::compute(&data.leads, period, now))
            }
            ReportKind::Revenue => ReportData::Revenue(revenue::compute(data, period, now)),
        }
    }

    pub fn kind(&self) -> ReportKind {
        match self {
            ReportData::Overview(_) => ReportKind::Overview,
            ReportData::Funnel(_) => ReportKind::Funnel,
            ReportData::Agents(_) => ReportKind::Agents,
            ReportData::Agencies(_) => ReportKind::Agencies,
            ReportData::Campaigns(_) => ReportKind::Campaigns,
            ReportData::FollowUps(_) => ReportKind::FollowUps,
            ReportData::SiteVisits(_) => ReportKind::SiteVisits,
            ReportData::Revenue(_) => ReportKind::Revenue,
        }
    }

    /// Flat records for CSV export: the report's main table.
    ///
    /// Every row becomes one record; a row that fails to serialize fails
    /// the whole export.
    pub fn export_records(&self) -> Result<Vec<Value>, ExportError> {
        match self {
            ReportData::Overview(r) => to_records(&r.metric_rows()),
            ReportData::Funnel(r) => to_records(&r.stages),
            ReportData::Agents(r) => to_records(&r.agents),
            ReportData::Agencies(r) => to_records(&r.agencies),
            ReportData::Campaigns(r) => to_records(&r.campaigns),
            ReportData::FollowUps(r) => to_records(&r.overdue_leads),
            ReportData::SiteVisits(r) => to_records(&r.status_rows()),
            ReportData::Revenue(r) => to_records(&r.series_rows()),
        }
    }
}

/// One `metric,value` line for key-figure exports
#[derive(Debug, Clone, Serialize)]
pub struct MetricRow {
    pub metric: String,
    pub value: String,
}

impl MetricRow {
    pub fn new(metric: impl Into<String>, value: impl ToString) -> Self {
        Self {
            metric: metric.into(),
            value: value.to_string(),
        }
    }
}
