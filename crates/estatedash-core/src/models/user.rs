//! CRM user (admins, agency admins, agents)

use super::{lenient, EntityRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User account as returned by `GET /users`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: EntityRef,

    #[serde(deserialize_with = "lenient::text")]
    pub role: Option<String>,

    #[serde(deserialize_with = "lenient::text")]
    pub first_name: Option<String>,

    #[serde(deserialize_with = "lenient::text")]
    pub last_name: Option<String>,

    #[serde(deserialize_with = "lenient::text")]
    pub email: Option<String>,

    #[serde(deserialize_with = "lenient::flag")]
    pub is_active: bool,

    pub agency: EntityRef,

    #[serde(deserialize_with = "lenient::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_agent(&self) -> bool {
        self.role
            .as_deref()
            .is_some_and(|role| role.trim().eq_ignore_ascii_case("agent"))
    }

    /// "First Last", falling back to the email, then to "Unknown"
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");

        if !name.is_empty() {
            name
        } else {
            self.email.clone().unwrap_or_else(|| "Unknown".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_lenient_decode() {
        let user: User = serde_json::from_value(json!({
            "_id": "U1",
            "role": "agent",
            "firstName": "Asha",
            "isActive": "true",
            "agency": { "_id": "A1", "name": "Skyline" },
            "createdAt": "2026-01-10T08:00:00Z"
        }))
        .unwrap();

        assert!(user.id.points_to("U1"));
        assert!(user.is_agent());
        assert!(user.is_active);
        assert!(user.agency.points_to("A1"));
        assert_eq!(user.display_name(), "Asha");
        assert!(user.created_at.is_some());
    }

    #[test]
    fn test_agent_role_ignores_case() {
        for role in ["agent", "Agent", "AGENT", " agent "] {
            let user: User = serde_json::from_value(json!({ "role": role })).unwrap();
            assert!(user.is_agent(), "{:?} should count as an agent", role);
        }
        let admin: User = serde_json::from_value(json!({ "role": "agency_admin" })).unwrap();
        assert!(!admin.is_agent());
    }

    #[test]
    fn test_user_missing_everything() {
        let user: User = serde_json::from_value(json!({})).unwrap();
        assert!(!user.id.is_set());
        assert!(!user.is_active);
        assert_eq!(user.display_name(), "Unknown");
    }
}
