use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The user profile shared by every screen. Stored as key/value settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub currency: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self::from_map(HashMap::new())
    }
}

impl Profile {
    pub fn from_map(map: HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).cloned().unwrap_or_default();
        Self {
            username: map.get("username").cloned().unwrap_or_else(|| "user".into()),
            email: get("email"),
            first_name: get("first_name"),
            last_name: get("last_name"),
            currency: map.get("currency").cloned().unwrap_or_else(|| "USD".into()),
        }
    }

    pub fn to_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("username".into(), self.username.clone());
        map.insert("email".into(), self.email.clone());
        map.insert("first_name".into(), self.first_name.clone());
        map.insert("last_name".into(), self.last_name.clone());
        map.insert("currency".into(), self.currency.clone());
        map
    }
}
