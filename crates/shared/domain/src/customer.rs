use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A customer account, addressed by its user code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub user_code: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub branch: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_owned()
    }
}
