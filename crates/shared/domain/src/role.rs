use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Session roles, ordered by privilege: `Customer < Warehouse < Admin`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Customer,
    Warehouse,
    Admin,
}

impl Role {
    /// Warehouse staff and admins.
    #[must_use]
    pub fn is_staff(self) -> bool {
        self >= Self::Warehouse
    }
}
