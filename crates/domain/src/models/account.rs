//! Account profile as served by the account service.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Account {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default, alias = "avatarURL")]
    pub avatar_url: String,
}

impl Account {
    /// "Name Surname", trimmed when either part is missing.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname).trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_missing_profile_fields() {
        let account: Account =
            serde_json::from_str(r#"{"id": 5, "email": "new@example.com"}"#).unwrap();
        assert_eq!(account.id, 5);
        assert!(account.name.is_empty());
        assert_eq!(account.full_name(), "");
    }

    #[test]
    fn test_full_name() {
        let account = Account {
            id: 1,
            email: "ivan@example.com".to_string(),
            name: "Ivan".to_string(),
            surname: "Petrov".to_string(),
            avatar_url: String::new(),
        };
        assert_eq!(account.full_name(), "Ivan Petrov");
    }
}
