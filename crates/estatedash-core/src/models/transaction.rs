//! Transactions and payments

use super::{lenient, EntityRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Money movement as returned by `GET /transactions` and `GET /payments`
///
/// Both endpoints share this shape; payments additionally carry a `type`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transaction {
    #[serde(rename = "_id")]
    pub id: EntityRef,

    #[serde(deserialize_with = "lenient::number")]
    pub amount: f64,

    #[serde(deserialize_with = "lenient::number")]
    pub commission: f64,

    /// completed / pending / failed / refunded
    #[serde(deserialize_with = "lenient::text")]
    pub status: Option<String>,

    #[serde(rename = "type", deserialize_with = "lenient::text")]
    pub kind: Option<String>,

    pub property: EntityRef,

    #[serde(deserialize_with = "lenient::timestamp")]
    pub date: Option<DateTime<Utc>>,

    #[serde(deserialize_with = "lenient::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Transaction date, falling back to the creation time
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.date.or(self.created_at)
    }

    pub fn status_is(&self, status: &str) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(status))
    }

    /// Completed or paid
    pub fn is_settled(&self) -> bool {
        self.status_is("completed") || self.status_is("paid") || self.status_is("success")
    }
}
