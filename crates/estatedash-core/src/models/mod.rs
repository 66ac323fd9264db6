//! Data models for estatedash
//!
//! Entities are owned by the CRM backend; we only read them. Each one is
//! decoded once at the fetch boundary (see [`decode_records`]) into a struct
//! with explicit optional fields, so aggregation code never touches raw JSON.

pub mod agency;
pub mod lead;
pub mod lenient;
pub mod property;
pub mod reference;
pub mod transaction;
pub mod user;

pub use agency::Agency;
pub use lead::{Lead, LeadStage, SiteVisit};
pub use property::{Location, Property};
pub use reference::{resolve_id, EntityRef};
pub use transaction::Transaction;
pub use user::User;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Every entity list a report may need, as fetched for one batch
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub users: Vec<User>,
    pub properties: Vec<Property>,
    pub leads: Vec<Lead>,
    pub agencies: Vec<Agency>,
    pub transactions: Vec<Transaction>,
    pub payments: Vec<Transaction>,
    /// Flat object from `/stats/reports`, when the backend provides one
    pub server_stats: Option<Map<String, Value>>,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
            && self.properties.is_empty()
            && self.leads.is_empty()
            && self.agencies.is_empty()
            && self.transactions.is_empty()
            && self.payments.is_empty()
    }

    pub fn agents(&self) -> impl Iterator<Item = &User> {
        self.users.iter().filter(|u| u.is_agent())
    }
}

/// Decode raw API records into typed entities.
///
/// Non-object records and records that still fail to decode are dropped with
/// a warning. A record carrying only `id` gets it copied to `_id`.
pub fn decode_records<T: DeserializeOwned>(collection: &str, records: Vec<Value>) -> Vec<T> {
    let total = records.len();
    let decoded: Vec<T> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let Value::Object(mut map) = record else {
                tracing::warn!(collection, index, "Skipping non-object record");
                return None;
            };

            if !map.contains_key("_id") {
                if let Some(id) = map.get("id").cloned() {
                    map.insert("_id".to_string(), id);
                }
            }

            match serde_json::from_value(Value::Object(map)) {
                Ok(entity) => Some(entity),
                Err(e) => {
                    tracing::warn!(collection, index, error = %e, "Skipping undecodable record");
                    None
                }
            }
        })
        .collect();

    if decoded.len() < total {
        tracing::debug!(
            collection,
            total,
            kept = decoded.len(),
            "Dropped malformed records"
        );
    }

    decoded
}
