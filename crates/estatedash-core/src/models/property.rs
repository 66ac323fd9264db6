//! Property listings

use super::{lenient, EntityRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Listing as returned by `GET /properties`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Property {
    #[serde(rename = "_id")]
    pub id: EntityRef,

    #[serde(deserialize_with = "lenient::text")]
    pub title: Option<String>,

    /// active / pending / sold / rented
    #[serde(deserialize_with = "lenient::text")]
    pub status: Option<String>,

    #[serde(deserialize_with = "lenient::text")]
    pub property_type: Option<String>,

    #[serde(deserialize_with = "lenient::text")]
    pub listing_type: Option<String>,

    /// Sale price when present, otherwise the rent amount
    #[serde(deserialize_with = "price")]
    pub price: f64,

    #[serde(deserialize_with = "lenient::object")]
    pub location: Location,

    pub agent: EntityRef,

    pub agency: EntityRef,

    #[serde(deserialize_with = "lenient::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    #[serde(deserialize_with = "lenient::text")]
    pub city: Option<String>,

    #[serde(deserialize_with = "lenient::text")]
    pub state: Option<String>,

    #[serde(deserialize_with = "lenient::text")]
    pub address: Option<String>,
}

impl Property {
    pub fn status_is(&self, status: &str) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(status))
    }

    /// Sold or rented
    pub fn is_closed(&self) -> bool {
        self.status_is("sold") || self.status_is("rented")
    }
}

/// Resolve a price that is either a plain amount or a `{ sale, rent }` object
/// whose members are themselves amounts or `{ amount }` objects.
pub fn price_amount(value: &Value) -> f64 {
    fn amount(value: &Value) -> Option<f64> {
        match value {
            Value::Object(map) => map.get("amount").and_then(lenient::parse_number),
            other => lenient::parse_number(other),
        }
    }

    match value {
        Value::Object(map) => ["sale", "rent", "amount"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(amount)
            .unwrap_or(0.0),
        other => lenient::parse_number(other).unwrap_or(0.0),
    }
}

fn price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(price_amount(&Value::deserialize(deserializer)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_price_shapes() {
        assert_eq!(price_amount(&json!(450000)), 450000.0);
        assert_eq!(price_amount(&json!({ "sale": { "amount": 9_000_000 } })), 9_000_000.0);
        assert_eq!(price_amount(&json!({ "rent": { "amount": "25000" } })), 25000.0);
        assert_eq!(price_amount(&json!({ "sale": null, "rent": 1200 })), 1200.0);
        assert_eq!(price_amount(&json!(null)), 0.0);
    }

    #[test]
    fn test_property_decode() {
        let property: Property = serde_json::from_value(json!({
            "_id": "P1",
            "title": "Sea view 2BHK",
            "status": "Sold",
            "propertyType": "apartment",
            "price": { "sale": { "amount": 12500000 } },
            "location": { "city": "Mumbai" },
            "agent": { "_id": "U1" },
            "agency": "A1"
        }))
        .unwrap();

        assert!(property.is_closed());
        assert_eq!(property.price, 12_500_000.0);
        assert_eq!(property.location.city.as_deref(), Some("Mumbai"));
        assert!(property.agent.points_to("U1"));
        assert!(property.agency.points_to("A1"));
    }
}
