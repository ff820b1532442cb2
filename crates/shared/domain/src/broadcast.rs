use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An announcement from the back-office to customers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Broadcast {
    pub id: String,
    pub title: String,
    pub message: String,
    /// Target branch; `None` reaches every customer.
    pub branch: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Broadcast {
    #[must_use]
    pub fn reaches(&self, branch: Option<&str>) -> bool {
        match (&self.branch, branch) {
            (None, _) => true,
            (Some(target), Some(branch)) => target.eq_ignore_ascii_case(branch),
            (Some(_), None) => false,
        }
    }
}
