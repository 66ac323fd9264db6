//! Admin overview: headline cards and breakdowns across every collection

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::metrics::{group_count, rate, time_series, top_n, within_window, RankedCount, TimeSeries, UNKNOWN};
use super::{MetricRow, Period};
use crate::models::Dataset;

#[derive(Debug, Clone, Default, Serialize)]
pub struct OverviewReport {
    pub total_users: usize,
    pub active_users: usize,
    pub users_by_role: BTreeMap<String, usize>,
    pub total_agents: usize,
    pub total_agencies: usize,
    pub active_agencies: usize,

    pub total_properties: usize,
    /// Listings created inside the period
    pub new_properties: usize,
    pub properties_by_status: BTreeMap<String, usize>,
    pub properties_by_type: BTreeMap<String, usize>,
    pub properties_by_listing_type: BTreeMap<String, usize>,
    pub properties_by_city: BTreeMap<String, usize>,
    pub top_cities: Vec<RankedCount>,
    /// Headline figure over every fetched listing, regardless of period
    pub total_property_value: f64,
    /// Same sum restricted to listings created inside the period
    pub period_property_value: f64,
    pub average_property_price: f64,

    pub total_leads: usize,
    pub period_leads: usize,
    pub converted_leads: usize,
    pub conversion_rate: f64,

    /// Settled transaction amounts inside the period
    pub revenue: f64,
    pub total_commission: f64,

    pub leads_series: TimeSeries,
    pub listings_series: TimeSeries,

    pub server_stats: Option<Map<String, Value>>,
}

pub fn compute(data: &Dataset, period: Period, now: DateTime<Utc>) -> OverviewReport {
    let period_leads: Vec<_> = data
        .leads
        .iter()
        .filter(|l| within_window(l.created_at, period, now))
        .collect();
    let converted_leads = period_leads.iter().filter(|l| l.is_won()).count();

    let period_properties: Vec<_> = data
        .properties
        .iter()
        .filter(|p| within_window(p.created_at, period, now))
        .collect();

    let total_property_value: f64 = data.properties.iter().map(|p| p.price).sum();
    let period_property_value: f64 = period_properties.iter().map(|p| p.price).sum();
    let average_property_price = if data.properties.is_empty() {
        0.0
    } else {
        total_property_value / data.properties.len() as f64
    };

    let settled: Vec<_> = data
        .transactions
        .iter()
        .filter(|t| t.is_settled() && within_window(t.occurred_at(), period, now))
        .collect();

    let properties_by_city = group_count(
        &data.properties,
        |p| p.location.city.as_deref(),
        UNKNOWN,
    );

    OverviewReport {
        total_users: data.users.len(),
        active_users: data.users.iter().filter(|u| u.is_active).count(),
        users_by_role: group_count(&data.users, |u| u.role.as_deref(), UNKNOWN),
        total_agents: data.agents().count(),
        total_agencies: data.agencies.len(),
        active_agencies: data.agencies.iter().filter(|a| a.is_active).count(),

        total_properties: data.properties.len(),
        new_properties: period_properties.len(),
        properties_by_status: group_count(&data.properties, |p| p.status.as_deref(), UNKNOWN),
        properties_by_type: group_count(
            &data.properties,
            |p| p.property_type.as_deref(),
            UNKNOWN,
        ),
        properties_by_listing_type: group_count(
            &data.properties,
            |p| p.listing_type.as_deref(),
            UNKNOWN,
        ),
        top_cities: top_n(&properties_by_city, 5),
        properties_by_city,
        total_property_value,
        period_property_value,
        average_property_price,

        total_leads: data.leads.len(),
        period_leads: period_leads.len(),
        converted_leads,
        conversion_rate: rate(converted_leads, period_leads.len()),

        revenue: settled.iter().map(|t| t.amount).sum(),
        total_commission: settled.iter().map(|t| t.commission).sum(),

        leads_series: time_series(&data.leads, |l| l.created_at, |_| 0.0, period, now),
        listings_series: time_series(
            &data.properties,
            |p| p.created_at,
            |p| p.price,
            period,
            now,
        ),

        server_stats: data.server_stats.clone(),
    }
}

impl OverviewReport {
    /// Key figures as `metric,value` rows
    pub fn metric_rows(&self) -> Vec<MetricRow> {
        let mut rows = vec![
            MetricRow::new("Total Users", self.total_users),
            MetricRow::new("Active Users", self.active_users),
            MetricRow::new("Agents", self.total_agents),
            MetricRow::new("Agencies", self.total_agencies),
            MetricRow::new("Active Agencies", self.active_agencies),
            MetricRow::new("Total Properties", self.total_properties),
            MetricRow::new("New Properties", self.new_properties),
            MetricRow::new("Total Property Value", format!("{:.2}", self.total_property_value)),
            MetricRow::new("Period Property Value", format!("{:.2}", self.period_property_value)),
            MetricRow::new("Average Property Price", format!("{:.2}", self.average_property_price)),
            MetricRow::new("Total Leads", self.total_leads),
            MetricRow::new("Period Leads", self.period_leads),
            MetricRow::new("Converted Leads", self.converted_leads),
            MetricRow::new("Conversion Rate (%)", self.conversion_rate),
            MetricRow::new("Revenue", format!("{:.2}", self.revenue)),
            MetricRow::new("Commission", format!("{:.2}", self.total_commission)),
        ];

        for (status, count) in &self.properties_by_status {
            rows.push(MetricRow::new(format!("Properties: {}", status), count));
        }
        for (role, count) in &self.users_by_role {
            rows.push(MetricRow::new(format!("Users: {}", role), count));
        }

        rows
    }
}
