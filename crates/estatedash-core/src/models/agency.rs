//! Agencies (organizational tenants)

use super::{lenient, EntityRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Agency as returned by `GET /agencies`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Agency {
    #[serde(rename = "_id")]
    pub id: EntityRef,

    #[serde(deserialize_with = "lenient::text")]
    pub name: Option<String>,

    #[serde(deserialize_with = "lenient::text")]
    pub email: Option<String>,

    #[serde(deserialize_with = "lenient::text")]
    pub phone: Option<String>,

    #[serde(deserialize_with = "lenient::text")]
    pub logo: Option<String>,

    #[serde(deserialize_with = "lenient::flag")]
    pub is_active: bool,

    #[serde(deserialize_with = "lenient::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Agency {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed agency")
    }
}
