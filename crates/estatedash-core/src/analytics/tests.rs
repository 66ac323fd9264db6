//! Unit tests for analytics module

use super::*;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};

use crate::models::{decode_records, Agency, Dataset, Lead, LeadStage, Property, Transaction, User};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
}

fn ts(days_ago: i64) -> String {
    (now() - Duration::days(days_ago)).to_rfc3339()
}

fn leads(raw: Vec<Value>) -> Vec<Lead> {
    decode_records("leads", raw)
}

/// Two agencies, three agents, a handful of listings and leads
fn sample_dataset() -> Dataset {
    let users: Vec<User> = decode_records(
        "users",
        vec![
            json!({ "_id": "U1", "role": "agent", "firstName": "Asha", "lastName": "Rao", "isActive": true, "agency": "A1" }),
            json!({ "_id": "U2", "role": "agent", "firstName": "Ben", "isActive": true, "agency": { "_id": "A1", "name": "Acme" } }),
            json!({ "_id": "U3", "role": "agent", "email": "c@x.io", "isActive": false, "agency": "A2" }),
            json!({ "_id": "U4", "role": "admin", "isActive": true }),
        ],
    );

    let properties: Vec<Property> = decode_records(
        "properties",
        vec![
            json!({ "_id": "P1", "status": "active", "propertyType": "apartment", "price": { "sale": 100000 }, "location": { "city": "Pune" }, "agent": "U1", "agency": "A1", "createdAt": ts(3) }),
            json!({ "_id": "P2", "status": "sold", "propertyType": "villa", "price": 250000, "location": { "city": "Pune" }, "agent": { "_id": "U1" }, "agency": { "_id": "A1" }, "createdAt": ts(60) }),
            json!({ "_id": "P3", "status": "rented", "price": { "rent": { "amount": 1200 } }, "location": { "city": "Goa" }, "agent": "U2", "agency": "A1", "createdAt": ts(10) }),
            json!({ "_id": "P4", "status": "pending", "agent": "U3", "agency": "A2" }),
        ],
    );

    let leads = leads(vec![
        json!({ "_id": "L1", "status": "new", "source": "website", "campaign": "Spring", "assignedTo": "U1", "agency": "A1", "followUpDate": ts(2), "createdAt": ts(5) }),
        json!({ "_id": "L2", "status": "converted", "source": "website", "campaign": { "name": "Spring" }, "budget": 5000, "assignedTo": { "_id": "U1" }, "agency": "A1", "siteVisit": { "status": "completed" }, "createdAt": ts(6) }),
        json!({ "_id": "L3", "status": "booked", "source": "referral", "budget": "3000", "assignedTo": "U2", "agency": "A1", "siteVisit": { "status": "no_show" }, "createdAt": ts(8) }),
        json!({ "_id": "L4", "status": "lost", "lostReason": "budget", "source": "website", "campaign": "Spring", "assignedTo": "U2", "agency": "A1", "createdAt": ts(9) }),
        json!({ "_id": "L5", "status": "lost", "assignedTo": "U9", "agency": "A1", "createdAt": ts(12) }),
        json!({ "_id": "L6", "status": "contacted", "assignedTo": "U1", "agency": "A1", "followUpDate": ts(1), "communications": [{ "type": "call" }], "siteVisit": { "scheduledDate": (now() + Duration::days(2)).to_rfc3339() }, "createdAt": ts(4) }),
        json!({ "_id": "L7", "status": "new", "agency": "A2", "createdAt": ts(200) }),
    ]);

    let agencies: Vec<Agency> = decode_records(
        "agencies",
        vec![
            json!({ "_id": "A1", "name": "Acme", "isActive": true }),
            json!({ "_id": "A2", "name": "Beta", "isActive": true }),
            json!({ "_id": "A3", "name": "Dormant", "isActive": false }),
        ],
    );

    let transactions: Vec<Transaction> = decode_records(
        "transactions",
        vec![
            json!({ "_id": "T1", "amount": 1000, "commission": 50, "status": "completed", "date": ts(2) }),
            json!({ "_id": "T2", "amount": "2,000", "commission": 100, "status": "completed", "createdAt": ts(20) }),
            json!({ "_id": "T3", "amount": 700, "status": "pending", "date": ts(1) }),
            json!({ "_id": "T4", "amount": 9000, "status": "completed", "date": ts(400) }),
        ],
    );

    Dataset {
        users,
        properties,
        leads,
        agencies,
        transactions,
        ..Default::default()
    }
}

// ============================================================================
// Primitive Tests
// ============================================================================

#[test]
fn test_group_count_totals_match_input() {
    let data = sample_dataset();
    let by_status = group_count(&data.leads, |l| l.status.as_deref(), metrics::UNKNOWN);
    let by_source = group_count(&data.leads, |l| l.source.as_deref(), metrics::UNKNOWN);
    let by_campaign = group_count(&data.leads, |l| l.campaign.as_deref(), metrics::NO_CAMPAIGN);

    for counts in [&by_status, &by_source, &by_campaign] {
        assert_eq!(counts.values().sum::<usize>(), data.leads.len());
    }
    assert_eq!(by_source.get("Unknown"), Some(&3));
    assert_eq!(by_campaign.get("No Campaign"), Some(&4));
}

#[test]
fn test_group_count_blank_key_uses_sentinel() {
    let raw = leads(vec![json!({ "source": "   " }), json!({ "source": null }), json!({})]);
    let counts = group_count(&raw, |l| l.source.as_deref(), metrics::UNKNOWN);
    assert_eq!(counts.len(), 1);
    assert_eq!(counts["Unknown"], 3);
}

#[test]
fn test_rate_zero_denominator() {
    assert_eq!(rate(0, 0), 0.0);
    assert_eq!(rate(5, 0), 0.0);
    assert_eq!(rate(1, 3), 33.3);
    assert_eq!(rate(2, 3), 66.7);
    assert_eq!(rate(3, 3), 100.0);
}

#[test]
fn test_every_rate_is_zero_on_empty_input() {
    let empty = Dataset::default();
    let n = now();

    let funnel = funnel::compute(&empty.leads, Period::Last30d, n);
    assert_eq!(funnel.conversion_rate, 0.0);
    assert_eq!(funnel.loss_rate, 0.0);

    let followups = followups::compute(&empty, Period::Last30d, n);
    assert_eq!(followups.compliance_rate, 0.0);

    let visits = site_visits::compute(&empty.leads, Period::Last30d, n);
    assert_eq!(visits.show_up_rate, 0.0);
    assert_eq!(visits.visit_conversion_rate, 0.0);

    let overview = overview::compute(&empty, Period::Last30d, n);
    assert_eq!(overview.conversion_rate, 0.0);
    assert_eq!(overview.average_property_price, 0.0);
}

#[test]
fn test_window_boundary_30d() {
    let n = now();
    let inside = n - Duration::days(30) + Duration::seconds(1);
    let outside = n - Duration::days(30) - Duration::seconds(1);

    assert!(within_window(Some(inside), Period::Last30d, n));
    assert!(!within_window(Some(outside), Period::Last30d, n));
    assert!(within_window(Some(n - Duration::days(30)), Period::Last30d, n));
    assert!(!within_window(None, Period::Last30d, n));
}

#[test]
fn test_period_parse_fallback() {
    assert_eq!(Period::parse("7d"), Period::Last7d);
    assert_eq!(Period::parse("90D"), Period::Last90d);
    assert_eq!(Period::parse("1y"), Period::LastYear);
    assert_eq!(Period::parse("fortnight"), Period::Last30d);
    assert_eq!(Period::parse(""), Period::Last30d);
    assert_eq!(Period::LastYear.days(), 365);
}

#[test]
fn test_report_kind_round_trip() {
    for kind in ReportKind::all() {
        assert_eq!(ReportKind::from_index(kind.index()), *kind);
        assert_eq!(kind.slug().parse::<ReportKind>().unwrap(), *kind);
    }
    assert_eq!("funnel".parse::<ReportKind>().unwrap(), ReportKind::Funnel);
    assert!("pipeline".parse::<ReportKind>().is_err());
    assert_eq!(ReportKind::from_index(99), ReportKind::Overview);
}

#[test]
fn test_top_n_ties_alphabetical() {
    let data = sample_dataset();
    let cities = group_count(&data.properties, |p| p.location.city.as_deref(), metrics::UNKNOWN);
    let top = top_n(&cities, 2);

    assert_eq!(top.len(), 2);
    assert_eq!(top[0].label, "Pune");
    assert_eq!(top[0].count, 2);
    // Goa and Unknown tie at 1
    assert_eq!(top[1].label, "Goa");
}

#[test]
fn test_time_series_daily_and_monthly() {
    let data = sample_dataset();
    let daily = metrics::time_series(&data.leads, |l| l.created_at, |_| 0.0, Period::Last7d, now());
    assert_eq!(daily.total(), 3);
    assert!(daily.buckets.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(daily.buckets[0].len(), "2026-03-09".len());

    let monthly =
        metrics::time_series(&data.leads, |l| l.created_at, |_| 0.0, Period::LastYear, now());
    assert_eq!(monthly.total(), 7);
    assert!(monthly.buckets.iter().all(|b| b.len() == "2026-03".len()));
}

#[test]
fn test_days_since_floors() {
    let n = now();
    assert_eq!(metrics::days_since(n - Duration::hours(47), n), 1);
    assert_eq!(metrics::days_since(n - Duration::hours(48), n), 2);
    assert_eq!(metrics::days_since(n, n), 0);
}

// ============================================================================
// Health Tests
// ============================================================================

#[test]
fn test_health_examples() {
    assert_eq!(health_status(true, 2, 6), HealthStatus::Good);
    assert_eq!(health_status(true, 0, 3), HealthStatus::Average);
    assert_eq!(health_status(false, 5, 10), HealthStatus::Poor);
}

#[test]
fn test_health_is_total() {
    for active in [true, false] {
        for agents in 0..4 {
            for leads in 0..10 {
                let status = health_status(active, agents, leads);
                let expected = if active && agents >= 1 && leads > 5 {
                    HealthStatus::Good
                } else if active && (agents >= 1 || leads >= 1) {
                    HealthStatus::Average
                } else {
                    HealthStatus::Poor
                };
                assert_eq!(status, expected, "({}, {}, {})", active, agents, leads);
            }
        }
    }
    assert_eq!(health_status(true, 1, 5), HealthStatus::Average);
    assert_eq!(health_status(true, 0, 0), HealthStatus::Poor);
}

// ============================================================================
// Join Tests
// ============================================================================

#[test]
fn test_join_raw_and_populated_reference() {
    let data = Dataset {
        agencies: decode_records("agencies", vec![json!({ "_id": "A1", "isActive": true })]),
        properties: decode_records(
            "properties",
            vec![
                json!({ "_id": "P1", "agency": "A1" }),
                json!({ "_id": "P2", "agency": { "_id": "A1" } }),
                json!({ "_id": "P3", "agency": "A2" }),
            ],
        ),
        ..Default::default()
    };

    let report = agencies::compute(&data, now());
    assert_eq!(report.agencies[0].properties, 2);
}

// ============================================================================
// Report Tests
// ============================================================================

#[test]
fn test_overview_report() {
    let report = overview::compute(&sample_dataset(), Period::Last30d, now());

    assert_eq!(report.total_users, 4);
    assert_eq!(report.active_users, 3);
    assert_eq!(report.total_agents, 3);
    assert_eq!(report.users_by_role["agent"], 3);
    assert_eq!(report.total_agencies, 3);
    assert_eq!(report.active_agencies, 2);

    assert_eq!(report.total_properties, 4);
    assert_eq!(report.new_properties, 2);
    assert_eq!(report.total_property_value, 351_200.0);
    assert_eq!(report.period_property_value, 101_200.0);
    assert_eq!(report.properties_by_city["Unknown"], 1);

    assert_eq!(report.total_leads, 7);
    assert_eq!(report.period_leads, 6);
    assert_eq!(report.converted_leads, 2);
    assert_eq!(report.conversion_rate, 33.3);

    assert_eq!(report.revenue, 3000.0);
    assert_eq!(report.total_commission, 150.0);
    assert!(!report.metric_rows().is_empty());
}

#[test]
fn test_funnel_report() {
    let report = funnel::compute(&sample_dataset().leads, Period::Last30d, now());

    assert_eq!(report.total, 6);
    assert_eq!(report.stages.len(), LeadStage::all().len());
    assert_eq!(report.stages.iter().map(|s| s.count).sum::<usize>(), 6);
    assert_eq!(report.stage_count(LeadStage::New), 1);
    assert_eq!(report.stage_count(LeadStage::Lost), 2);
    assert_eq!(report.converted, 2);
    assert_eq!(report.conversion_rate, 33.3);
    assert_eq!(report.loss_rate, 33.3);
    assert_eq!(report.lost_reasons["budget"], 1);
    assert_eq!(report.lost_reasons["Not Specified"], 1);
    assert_eq!(report.top_sources[0].label, "website");
}

#[test]
fn test_agent_leaderboard() {
    let report = agents::compute(&sample_dataset(), Period::Last30d, now());

    assert_eq!(report.total_agents, 3);
    assert_eq!(report.active_agents, 2);
    // L5 points at an unknown user
    assert_eq!(report.unassigned_leads, 1);

    let first = &report.agents[0];
    assert_eq!(first.agent_id, "U1");
    assert_eq!(first.name, "Asha Rao");
    assert_eq!(first.listings, 2);
    assert_eq!(first.active_listings, 1);
    assert_eq!(first.closed_listings, 1);
    assert_eq!(first.leads, 3);
    assert_eq!(first.converted, 1);
    assert_eq!(first.overdue_follow_ups, 1);

    let second = &report.agents[1];
    assert_eq!(second.agent_id, "U2");
    assert_eq!(second.conversion_rate, 50.0);
    assert_eq!(report.top(10).len(), 3);
}

#[test]
fn test_agency_health_report() {
    let report = agencies::compute(&sample_dataset(), now());
    let by_id = |id: &str| report.agencies.iter().find(|a| a.agency_id == id).unwrap();

    let acme = by_id("A1");
    assert_eq!(acme.agents, 2);
    assert_eq!(acme.properties, 3);
    assert_eq!(acme.leads, 6);
    assert_eq!(acme.health, HealthStatus::Good);
    assert_eq!(acme.days_since_activity, Some(3));

    let beta = by_id("A2");
    assert_eq!(beta.health, HealthStatus::Average);
    assert_eq!(beta.days_since_activity, Some(200));

    let dormant = by_id("A3");
    assert_eq!(dormant.health, HealthStatus::Poor);
    assert_eq!(dormant.last_activity, None);
    assert_eq!(dormant.days_since_activity, None);

    assert_eq!((report.good, report.average, report.poor), (1, 1, 1));
    assert_eq!(report.inactive, 1);
    assert_eq!(report.activity_ranking[0].agency_id, "A1");
}

#[test]
fn test_campaign_report() {
    let report = campaigns::compute(&sample_dataset().leads, Period::Last30d, now());

    assert_eq!(report.total_leads, 6);
    assert_eq!(
        report.campaigns.iter().map(|c| c.leads).sum::<usize>(),
        report.total_leads
    );

    let spring = report.campaigns.iter().find(|c| c.campaign == "Spring").unwrap();
    assert_eq!(spring.leads, 3);
    assert_eq!(spring.converted, 1);
    assert_eq!(spring.lost, 1);
    assert_eq!(spring.site_visits, 1);
    assert_eq!(spring.revenue, 5000.0);

    let none = report.campaigns.iter().find(|c| c.campaign == "No Campaign").unwrap();
    assert_eq!(none.leads, 3);
    assert_eq!(none.revenue, 3000.0);

    assert_eq!(report.total_revenue, 8000.0);
    assert!(report.best_campaign.is_some());
}

#[test]
fn test_follow_up_compliance() {
    let report = followups::compute(&sample_dataset(), Period::Last30d, now());

    assert_eq!(report.scheduled, 2);
    assert_eq!(report.due, 2);
    assert_eq!(report.upcoming, 0);
    // L1 is new with no communications; L6 was contacted
    assert_eq!(report.overdue, 1);
    assert_eq!(report.compliance_rate, 50.0);
    assert_eq!(report.overdue_leads[0].lead_id, "L1");
    assert_eq!(report.overdue_leads[0].days_overdue, 2);

    let asha = report.by_agent.iter().find(|a| a.agent_id == "U1").unwrap();
    assert_eq!(asha.name, "Asha Rao");
    assert_eq!((asha.due, asha.overdue), (2, 1));
}

#[test]
fn test_overdue_requires_all_conditions() {
    let n = now();
    let raw = leads(vec![
        json!({ "status": "new", "followUpDate": ts(1) }),
        json!({ "status": "new", "followUpDate": ts(1), "communications": [{}] }),
        json!({ "status": "contacted", "followUpDate": ts(1) }),
        json!({ "status": "new", "followUpDate": (n + Duration::days(1)).to_rfc3339() }),
        json!({ "status": "new" }),
    ]);
    let overdue: Vec<bool> = raw.iter().map(|l| l.is_follow_up_overdue(n)).collect();
    assert_eq!(overdue, vec![true, false, false, false, false]);
}

#[test]
fn test_site_visit_report() {
    let report = site_visits::compute(&sample_dataset().leads, Period::Last30d, now());

    assert_eq!(report.total, 3);
    assert_eq!(report.completed, 1);
    assert_eq!(report.no_show, 1);
    assert_eq!(report.scheduled, 1);
    assert_eq!(report.pending, 1);
    assert_eq!(report.show_up_rate, 50.0);
    assert_eq!(report.converted_after_visit, 1);
    assert_eq!(report.visit_conversion_rate, 100.0);
    assert_eq!(report.upcoming[0].lead_id, "L6");
    assert_eq!(report.status_rows().len(), 9);
}

#[test]
fn test_revenue_report() {
    let report = revenue::compute(&sample_dataset(), Period::Last30d, now());

    assert_eq!(report.transactions, 3);
    assert_eq!(report.settled, 2);
    assert_eq!(report.pending, 1);
    assert_eq!(report.total_revenue, 3000.0);
    assert_eq!(report.pending_amount, 700.0);
    assert_eq!(report.average_deal, 1500.0);
    assert_eq!(report.by_status["completed"], 2);

    let rows = report.series_rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows.iter().map(|r| r.revenue).sum::<f64>(), 3000.0);
}

#[test]
fn test_export_records_are_objects() {
    let data = sample_dataset();
    for kind in ReportKind::all() {
        let report = ReportData::compute(*kind, &data, Period::Last30d, now());
        assert_eq!(report.kind(), *kind);
        for record in report.export_records().unwrap() {
            assert!(record.is_object(), "{} produced a non-object row", kind);
        }
    }
}

#[test]
fn test_export_records_keep_every_row() {
    let data = sample_dataset();
    let ReportData::Campaigns(report) =
        ReportData::compute(ReportKind::Campaigns, &data, Period::Last30d, now())
    else {
        panic!("expected campaign report");
    };
    let rows = report.campaigns.len();
    let records = ReportData::Campaigns(report).export_records().unwrap();
    assert_eq!(records.len(), rows);
}
