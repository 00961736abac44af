use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Backends send this as either a role name or a numeric role id.
    #[serde(
        default,
        deserialize_with = "deserialize_role",
        skip_serializing_if = "Option::is_none"
    )]
    pub role: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Accept `"admin"`, `2` or `null` and keep the string form.
fn deserialize_role<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

impl User {
    /// "First Last", falling back to whichever half exists, then the email.
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(name), None) | (None, Some(name)) => name.to_string(),
            (None, None) => self.email.clone(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }

    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        roles.iter().any(|role| self.has_role(role.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_with_string_role() {
        let json = r#"{"id":"u1","email":"ada@example.com","firstName":"Ada","lastName":"Lovelace","role":"admin","isActive":false}"#;
        let user: User = serde_json::from_str(json).expect("Failed to parse user JSON");
        assert_eq!(user.role.as_deref(), Some("admin"));
        assert!(!user.is_active);
        assert_eq!(user.display_name(), "Ada Lovelace");
    }

    #[test]
    fn test_parse_user_with_numeric_role() {
        let json = r#"{"id":"u2","email":"bob@example.com","role":2}"#;
        let user: User = serde_json::from_str(json).expect("Failed to parse user JSON");
        assert_eq!(user.role.as_deref(), Some("2"));
        assert!(user.has_role("2"));
        assert!(user.is_active); // defaults to active
    }

    #[test]
    fn test_parse_user_without_role() {
        let json = r#"{"id":"u3","email":"eve@example.com","role":null}"#;
        let user: User = serde_json::from_str(json).expect("Failed to parse user JSON");
        assert_eq!(user.role, None);
        assert!(!user.has_any_role(&["admin", "editor"]));
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut user: User =
            serde_json::from_str(r#"{"id":"u4","email":"x@example.com"}"#).unwrap();
        assert_eq!(user.display_name(), "x@example.com");

        user.last_name = Some("Hopper".to_string());
        assert_eq!(user.display_name(), "Hopper");
    }

    #[test]
    fn test_has_any_role() {
        let user: User =
            serde_json::from_str(r#"{"id":"u5","email":"y@example.com","role":"editor"}"#).unwrap();
        assert!(user.has_any_role(&["admin", "editor"]));
        assert!(!user.has_any_role(&["admin"]));
        assert!(!user.has_any_role::<&str>(&[]));
    }
}
