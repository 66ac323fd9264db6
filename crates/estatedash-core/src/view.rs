//! Transient view state and composable row filters
//!
//! Filtering never goes back to the network: it narrows rows of the report
//! already computed from the committed snapshot.

use std::collections::BTreeSet;

use crate::analytics::revenue::RevenueRow;
use crate::analytics::{
    AgencyHealth, AgentCompliance, AgentPerformance, CampaignPerformance, FunnelStage,
    MetricRow, OverdueLead, Period, ReportKind, UpcomingVisit,
};
use crate::fetcher::FetchScope;
use crate::store::LoadStatus;

/// A row the category filter and search box can match
pub trait Filterable {
    /// Bucket for the category filter; rows without one only pass when no
    /// category is selected
    fn category(&self) -> Option<String> {
        None
    }

    /// Text the search box matches against
    fn search_text(&self) -> String;
}

/// Category AND free-text search, each resettable on its own
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    category: Option<String>,
    search: String,
}

impl ReportFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        let category = category.into();
        self.category = (!category.trim().is_empty()).then_some(category);
    }

    pub fn clear_category(&mut self) {
        self.category = None;
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
    }

    pub fn clear(&mut self) {
        self.clear_category();
        self.clear_search();
    }

    pub fn is_active(&self) -> bool {
        self.category.is_some() || !self.search.trim().is_empty()
    }

    /// Step through `categories`: none → first → ... → last → none
    pub fn cycle_category(&mut self, categories: &[String]) {
        let next = match &self.category {
            None => categories.first(),
            Some(current) => categories
                .iter()
                .position(|c| c.eq_ignore_ascii_case(current))
                .and_then(|i| categories.get(i + 1)),
        };
        self.category = next.cloned();
    }

    pub fn matches<T: Filterable + ?Sized>(&self, item: &T) -> bool {
        let category_ok = match &self.category {
            None => true,
            Some(wanted) => item
                .category()
                .is_some_and(|c| c.eq_ignore_ascii_case(wanted)),
        };

        let needle = self.search.trim().to_lowercase();
        let search_ok = needle.is_empty() || item.search_text().to_lowercase().contains(&needle);

        category_ok && search_ok
    }

    pub fn apply<'a, T: Filterable>(&self, items: &'a [T]) -> Vec<&'a T> {
        items.iter().filter(|item| self.matches(*item)).collect()
    }
}

/// Distinct categories present in `items`, sorted
pub fn categories<T: Filterable>(items: &[T]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.category())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// UI state of one dashboard session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub tab: ReportKind,
    pub period: Period,
    pub scope: FetchScope,
    pub filter: ReportFilter,
    pub status: LoadStatus,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(ReportKind::default(), Period::default(), FetchScope::all())
    }
}

impl ViewState {
    pub fn new(tab: ReportKind, period: Period, scope: FetchScope) -> Self {
        Self {
            tab,
            period,
            scope,
            filter: ReportFilter::new(),
            status: LoadStatus::Loading,
        }
    }

    /// Switch report; returns true when a new fetch is needed
    pub fn select_tab(&mut self, tab: ReportKind) -> bool {
        if tab == self.tab {
            return false;
        }
        self.tab = tab;
        self.filter.clear();
        true
    }

    pub fn next_tab(&mut self) -> bool {
        let count = ReportKind::all().len();
        self.select_tab(ReportKind::from_index((self.tab.index() + 1) % count))
    }

    pub fn prev_tab(&mut self) -> bool {
        let count = ReportKind::all().len();
        self.select_tab(ReportKind::from_index(
            (self.tab.index() + count - 1) % count,
        ))
    }

    /// Change period; returns true when a new fetch is needed
    pub fn set_period(&mut self, period: Period) -> bool {
        if period == self.period {
            return false;
        }
        self.period = period;
        true
    }

    pub fn begin_loading(&mut self) {
        self.status = LoadStatus::Loading;
    }

    pub fn mark_ready(&mut self) {
        self.status = LoadStatus::Ready;
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }
}

// ============================================================================
// Row impls
// ============================================================================

impl Filterable for AgentPerformance {
    fn category(&self) -> Option<String> {
        Some(if self.is_active { "active" } else { "inactive" }.to_string())
    }

    fn search_text(&self) -> String {
        format!("{} {} {}", self.name, self.email, self.agent_id)
    }
}

impl Filterable for AgencyHealth {
    fn category(&self) -> Option<String> {
        Some(self.health.label().to_string())
    }

    fn search_text(&self) -> String {
        format!("{} {}", self.name, self.agency_id)
    }
}

impl Filterable for CampaignPerformance {
    fn category(&self) -> Option<String> {
        Some(if self.converted > 0 { "converting" } else { "no conversions" }.to_string())
    }

    fn search_text(&self) -> String {
        self.campaign.clone()
    }
}

impl Filterable for OverdueLead {
    /// Age bucket of the missed follow-up
    fn category(&self) -> Option<String> {
        let bucket = match self.days_overdue {
            d if d <= 2 => "0-2 days",
            3..=7 => "3-7 days",
            _ => "8+ days",
        };
        Some(bucket.to_string())
    }

    fn search_text(&self) -> String {
        format!("{} {} {}", self.name, self.phone, self.lead_id)
    }
}

impl Filterable for AgentCompliance {
    fn search_text(&self) -> String {
        format!("{} {}", self.name, self.agent_id)
    }
}

impl Filterable for FunnelStage {
    fn search_text(&self) -> String {
        self.label.clone()
    }
}

impl Filterable for UpcomingVisit {
    fn search_text(&self) -> String {
        format!("{} {}", self.name, self.lead_id)
    }
}

impl Filterable for MetricRow {
    fn search_text(&self) -> String {
        self.metric.clone()
    }
}

impl Filterable for RevenueRow {
    fn search_text(&self) -> String {
        self.period.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::HealthStatus;

    fn agency(name: &str, health: HealthStatus) -> AgencyHealth {
        AgencyHealth {
            agency_id: name.to_lowercase(),
            name: name.to_string(),
            is_active: true,
            agents: 1,
            properties: 0,
            leads: 0,
            converted: 0,
            conversion_rate: 0.0,
            health,
            last_activity: None,
            days_since_activity: None,
        }
    }

    fn rows() -> Vec<AgencyHealth> {
        vec![
            agency("Acme Realty", HealthStatus::Good),
            agency("Acme Homes", HealthStatus::Poor),
            agency("Beta Estates", HealthStatus::Good),
        ]
    }

    #[test]
    fn test_category_and_search_compose() {
        let rows = rows();
        let mut filter = ReportFilter::new();

        filter.set_category("good");
        assert_eq!(filter.apply(&rows).len(), 2);

        filter.set_search("acme");
        let hits = filter.apply(&rows);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Acme Realty");

        filter.clear_category();
        assert_eq!(filter.apply(&rows).len(), 2);

        filter.set_category("GOOD");
        filter.clear_search();
        assert_eq!(filter.apply(&rows).len(), 2);

        filter.clear();
        assert!(!filter.is_active());
        assert_eq!(filter.apply(&rows).len(), 3);
    }

    #[test]
    fn test_rows_without_category_hidden_by_category_filter() {
        let metrics = vec![MetricRow::new("Total Leads", 3)];
        let mut filter = ReportFilter::new();
        assert_eq!(filter.apply(&metrics).len(), 1);

        filter.set_category("good");
        assert!(filter.apply(&metrics).is_empty());
    }

    #[test]
    fn test_cycle_category_wraps_to_none() {
        let cats = categories(&rows());
        assert_eq!(cats, vec!["good".to_string(), "poor".to_string()]);

        let mut filter = ReportFilter::new();
        filter.cycle_category(&cats);
        assert_eq!(filter.category(), Some("good"));
        filter.cycle_category(&cats);
        assert_eq!(filter.category(), Some("poor"));
        filter.cycle_category(&cats);
        assert_eq!(filter.category(), None);
    }

    #[test]
    fn test_view_state_transitions() {
        let mut view = ViewState::default();
        assert!(view.is_loading());

        view.filter.set_search("acme");
        assert!(!view.select_tab(ReportKind::Overview));
        assert!(view.select_tab(ReportKind::Agencies));
        assert!(!view.filter.is_active());

        assert!(!view.set_period(Period::Last30d));
        assert!(view.set_period(Period::Last90d));

        view.mark_ready();
        assert!(!view.is_loading());

        view.select_tab(ReportKind::Revenue);
        assert!(view.next_tab());
        assert_eq!(view.tab, ReportKind::Overview);
        assert!(view.prev_tab());
        assert_eq!(view.tab, ReportKind::Revenue);
    }

    #[test]
    fn test_overdue_buckets() {
        let lead = |days| OverdueLead {
            lead_id: "L1".to_string(),
            name: "Priya".to_string(),
            phone: "98200".to_string(),
            agent_id: String::new(),
            follow_up_date: chrono::Utc::now(),
            days_overdue: days,
        };
        assert_eq!(lead(0).category().as_deref(), Some("0-2 days"));
        assert_eq!(lead(5).category().as_deref(), Some("3-7 days"));
        assert_eq!(lead(30).category().as_deref(), Some("8+ days"));
    }
}
