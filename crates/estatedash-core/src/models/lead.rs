//! Sales leads and their funnel stage

use super::{lenient, EntityRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Lead as returned by `GET /leads`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Lead {
    #[serde(rename = "_id")]
    pub id: EntityRef,

    #[serde(deserialize_with = "lenient::text")]
    pub name: Option<String>,

    #[serde(deserialize_with = "lenient::text")]
    pub first_name: Option<String>,

    #[serde(deserialize_with = "lenient::text")]
    pub last_name: Option<String>,

    #[serde(deserialize_with = "lenient::text")]
    pub email: Option<String>,

    #[serde(deserialize_with = "lenient::text")]
    pub phone: Option<String>,

    #[serde(deserialize_with = "lenient::text")]
    pub status: Option<String>,

    #[serde(deserialize_with = "lenient::text")]
    pub priority: Option<String>,

    #[serde(deserialize_with = "lenient::text")]
    pub source: Option<String>,

    /// Campaign name; the API sends either the name or a `{ name }` object
    #[serde(deserialize_with = "campaign_name")]
    pub campaign: Option<String>,

    pub assigned_to: EntityRef,

    pub agency: EntityRef,

    #[serde(deserialize_with = "lenient::optional_number")]
    pub budget: Option<f64>,

    #[serde(deserialize_with = "lenient::timestamp")]
    pub follow_up_date: Option<DateTime<Utc>>,

    #[serde(deserialize_with = "lenient::object")]
    pub site_visit: Option<SiteVisit>,

    #[serde(deserialize_with = "lenient::text")]
    pub lost_reason: Option<String>,

    #[serde(deserialize_with = "lenient::list")]
    pub communications: Vec<Value>,

    #[serde(deserialize_with = "lenient::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteVisit {
    /// scheduled / completed / cancelled / no_show
    #[serde(deserialize_with = "lenient::text")]
    pub status: Option<String>,

    #[serde(deserialize_with = "lenient::timestamp")]
    pub scheduled_date: Option<DateTime<Utc>>,
}

/// Canonical funnel stage derived from the free-form lead status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStage {
    New,
    Contacted,
    SiteVisit,
    Negotiation,
    Booked,
    Converted,
    Lost,
    Other,
}

impl LeadStage {
    pub fn all() -> &'static [LeadStage] {
        &[
            LeadStage::New,
            LeadStage::Contacted,
            LeadStage::SiteVisit,
            LeadStage::Negotiation,
            LeadStage::Booked,
            LeadStage::Converted,
            LeadStage::Lost,
            LeadStage::Other,
        ]
    }

    pub fn from_status(status: Option<&str>) -> Self {
        let Some(status) = status else {
            return LeadStage::Other;
        };

        let normalized = status.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "new" => LeadStage::New,
            "contacted" | "follow_up" | "qualified" => LeadStage::Contacted,
            "site_visit" | "site_visit_scheduled" | "site_visit_done" | "visit_scheduled" => {
                LeadStage::SiteVisit
            }
            "negotiation" | "negotiating" => LeadStage::Negotiation,
            "booked" => LeadStage::Booked,
            "converted" | "won" | "closed_won" => LeadStage::Converted,
            "lost" | "closed_lost" | "dropped" => LeadStage::Lost,
            _ => LeadStage::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LeadStage::New => "New",
            LeadStage::Contacted => "Contacted",
            LeadStage::SiteVisit => "Site Visit",
            LeadStage::Negotiation => "Negotiation",
            LeadStage::Booked => "Booked",
            LeadStage::Converted => "Converted",
            LeadStage::Lost => "Lost",
            LeadStage::Other => "Other",
        }
    }
}

impl fmt::Display for LeadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Lead {
    pub fn stage(&self) -> LeadStage {
        LeadStage::from_status(self.status.as_deref())
    }

    /// Converted or booked
    pub fn is_won(&self) -> bool {
        matches!(self.stage(), LeadStage::Converted | LeadStage::Booked)
    }

    pub fn is_lost(&self) -> bool {
        self.stage() == LeadStage::Lost
    }

    /// Follow-up date passed while the lead is still untouched
    pub fn is_follow_up_overdue(&self, now: DateTime<Utc>) -> bool {
        self.follow_up_date.is_some_and(|due| due < now)
            && self.stage() == LeadStage::New
            && self.communications.is_empty()
    }

    /// Lowercased site-visit status, if a visit was recorded
    pub fn site_visit_status(&self) -> Option<String> {
        let visit = self.site_visit.as_ref()?;
        match visit.status.as_deref() {
            Some(status) => Some(status.to_ascii_lowercase().replace([' ', '-'], "_")),
            None if visit.scheduled_date.is_some() => Some("scheduled".to_string()),
            None => None,
        }
    }

    pub fn contact_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let joined = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if joined.is_empty() {
            "Unknown".to_string()
        } else {
            joined
        }
    }
}

fn campaign_name<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match &value {
        Value::Object(map) => map.get("name").and_then(lenient::parse_text),
        other => lenient::parse_text(other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_stage_mapping() {
        assert_eq!(LeadStage::from_status(Some("Site Visit")), LeadStage::SiteVisit);
        assert_eq!(LeadStage::from_status(Some("site-visit-scheduled")), LeadStage::SiteVisit);
        assert_eq!(LeadStage::from_status(Some("BOOKED")), LeadStage::Booked);
        assert_eq!(LeadStage::from_status(Some("archived")), LeadStage::Other);
        assert_eq!(LeadStage::from_status(None), LeadStage::Other);
    }

    #[test]
    fn test_campaign_shapes() {
        let a: Lead = serde_json::from_value(json!({ "campaign": "Diwali Offer" })).unwrap();
        let b: Lead =
            serde_json::from_value(json!({ "campaign": { "_id": "C1", "name": "Diwali Offer" } }))
                .unwrap();
        let c: Lead = serde_json::from_value(json!({ "campaign": "" })).unwrap();

        assert_eq!(a.campaign.as_deref(), Some("Diwali Offer"));
        assert_eq!(a.campaign, b.campaign);
        assert_eq!(c.campaign, None);
    }

    #[test]
    fn test_follow_up_overdue_rules() {
        let now = Utc::now();
        let mut lead: Lead = serde_json::from_value(json!({ "status": "new" })).unwrap();
        lead.follow_up_date = Some(now - Duration::hours(2));
        assert!(lead.is_follow_up_overdue(now));

        lead.communications.push(json!({ "type": "call" }));
        assert!(!lead.is_follow_up_overdue(now));

        lead.communications.clear();
        lead.status = Some("contacted".into());
        assert!(!lead.is_follow_up_overdue(now));

        lead.status = Some("new".into());
        lead.follow_up_date = Some(now + Duration::hours(2));
        assert!(!lead.is_follow_up_overdue(now));
    }

    #[test]
    fn test_site_visit_status() {
        let lead: Lead = serde_json::from_value(json!({
            "siteVisit": { "status": "No Show", "scheduledDate": "2026-02-01" }
        }))
        .unwrap();
        assert_eq!(lead.site_visit_status().as_deref(), Some("no_show"));

        let implicit: Lead =
            serde_json::from_value(json!({ "siteVisit": { "scheduledDate": "2026-02-01" } }))
                .unwrap();
        assert_eq!(implicit.site_visit_status().as_deref(), Some("scheduled"));

        let none: Lead = serde_json::from_value(json!({ "siteVisit": "pending" })).unwrap();
        assert_eq!(none.site_visit_status(), None);
    }

    #[test]
    fn test_contact_name_fallbacks() {
        let named: Lead = serde_json::from_value(json!({ "name": "Ravi K" })).unwrap();
        let split: Lead =
            serde_json::from_value(json!({ "firstName": "Ravi", "lastName": "Kumar" })).unwrap();
        let empty: Lead = serde_json::from_value(json!({})).unwrap();

        assert_eq!(named.contact_name(), "Ravi K");
        assert_eq!(split.contact_name(), "Ravi Kumar");
        assert_eq!(empty.contact_name(), "Unknown");
    }
}
