use serde::{Deserialize, Serialize};

/// Actor recorded in the audit fields of inventory rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: String,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
}

impl UserContext {
    pub fn new(user_id: String) -> Self {
        Self {
            user_id,
            user_email: None,
            user_name: None,
        }
    }

    pub fn with_details(user_id: String, email: Option<String>, name: Option<String>) -> Self {
        Self {
            user_id,
            user_email: email,
            user_name: name,
        }
    }

    /// Context for batch jobs such as key backfills and storage migrations
    pub fn system() -> Self {
        Self {
            user_id: "system".to_string(),
            user_email: Some("system@moving-inventory.internal".to_string()),
            user_name: Some("System".to_string()),
        }
    }
}

impl Default for UserContext {
    fn default() -> Self {
        Self::system()
    }
}
