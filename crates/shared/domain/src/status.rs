//! Package status vocabularies.
//!
//! Three vocabularies meet here:
//! * [`PackageStatus`], the six stored lifecycle values (bit-exact strings such as `"At Warehouse"`);
//! * [`UiStatus`], the four values customer-facing screens understand;
//! * free-form labels pushed by external carriers, folded into [`PackageStatus`] through
//!   [`PackageStatus::from_external`].
//!
//! The UI mapping is lossy in both directions. Unrecognized input falls back to
//! `pending` / `At Warehouse`.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};
use utoipa::ToSchema;

/// Stored lifecycle state of a package.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
)]
pub enum PackageStatus {
    #[serde(rename = "Unknown")]
    #[strum(serialize = "Unknown")]
    Unknown,
    #[serde(rename = "At Warehouse")]
    #[strum(serialize = "At Warehouse")]
    AtWarehouse,
    #[serde(rename = "In Transit")]
    #[strum(serialize = "In Transit")]
    InTransit,
    #[serde(rename = "At Local Port")]
    #[strum(serialize = "At Local Port")]
    AtLocalPort,
    #[serde(rename = "Delivered")]
    #[strum(serialize = "Delivered")]
    Delivered,
    /// Terminal. Packages are never removed, only marked.
    #[serde(rename = "Deleted")]
    #[strum(serialize = "Deleted")]
    Deleted,
}

/// Customer-facing status.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UiStatus {
    Pending,
    InTransit,
    ReadyForPickup,
    Delivered,
}

/// Internal → UI. Every internal value has exactly one row.
pub const TO_UI: [(PackageStatus, UiStatus); 6] = [
    (PackageStatus::Unknown, UiStatus::Pending),
    (PackageStatus::AtWarehouse, UiStatus::Pending),
    (PackageStatus::InTransit, UiStatus::InTransit),
    (PackageStatus::AtLocalPort, UiStatus::ReadyForPickup),
    (PackageStatus::Delivered, UiStatus::Delivered),
    (PackageStatus::Deleted, UiStatus::Pending),
];

/// UI → internal. Every UI value has exactly one row.
pub const FROM_UI: [(UiStatus, PackageStatus); 4] = [
    (UiStatus::Pending, PackageStatus::AtWarehouse),
    (UiStatus::InTransit, PackageStatus::InTransit),
    (UiStatus::ReadyForPickup, PackageStatus::AtLocalPort),
    (UiStatus::Delivered, PackageStatus::Delivered),
];

/// External carrier labels, normalized (lowercase, alphanumerics only).
const EXTERNAL_LABELS: &[(&str, PackageStatus)] = &[
    ("unknown", PackageStatus::Unknown),
    ("prealert", PackageStatus::Unknown),
    ("prealerted", PackageStatus::Unknown),
    ("awaitingarrival", PackageStatus::Unknown),
    ("atwarehouse", PackageStatus::AtWarehouse),
    ("warehouse", PackageStatus::AtWarehouse),
    ("received", PackageStatus::AtWarehouse),
    ("receivedatwarehouse", PackageStatus::AtWarehouse),
    ("inwarehouse", PackageStatus::AtWarehouse),
    ("checkedin", PackageStatus::AtWarehouse),
    ("pending", PackageStatus::AtWarehouse),
    ("intransit", PackageStatus::InTransit),
    ("transit", PackageStatus::InTransit),
    ("shipped", PackageStatus::InTransit),
    ("departed", PackageStatus::InTransit),
    ("dispatched", PackageStatus::InTransit),
    ("manifested", PackageStatus::InTransit),
    ("onroute", PackageStatus::InTransit),
    ("enroute", PackageStatus::InTransit),
    ("atlocalport", PackageStatus::AtLocalPort),
    ("arrived", PackageStatus::AtLocalPort),
    ("arrivedatdestination", PackageStatus::AtLocalPort),
    ("customs", PackageStatus::AtLocalPort),
    ("incustoms", PackageStatus::AtLocalPort),
    ("clearedcustoms", PackageStatus::AtLocalPort),
    ("readyforpickup", PackageStatus::AtLocalPort),
    ("readyforcollection", PackageStatus::AtLocalPort),
    ("delivered", PackageStatus::Delivered),
    ("pickedup", PackageStatus::Delivered),
    ("collected", PackageStatus::Delivered),
    ("completed", PackageStatus::Delivered),
    ("deleted", PackageStatus::Deleted),
    ("cancelled", PackageStatus::Deleted),
    ("canceled", PackageStatus::Deleted),
    ("void", PackageStatus::Deleted),
];

impl PackageStatus {
    /// Default for a newly created package when no status is supplied.
    pub const DEFAULT: Self = Self::AtWarehouse;

    /// Bit-exact stored string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    #[must_use]
    pub const fn to_ui(self) -> UiStatus {
        match self {
            Self::Unknown | Self::AtWarehouse | Self::Deleted => UiStatus::Pending,
            Self::InTransit => UiStatus::InTransit,
            Self::AtLocalPort => UiStatus::ReadyForPickup,
            Self::Delivered => UiStatus::Delivered,
        }
    }

    /// Parses either vocabulary: an internal value (case and spacing insensitive) or a UI value.
    ///
    /// Returns `None` for anything else, letting strict endpoints reject the request.
    #[must_use]
    pub fn parse_requested(input: &str) -> Option<Self> {
        let key = normalize(input);
        if key.is_empty() {
            return None;
        }
        Self::iter()
            .find(|status| normalize(status.as_str()) == key)
            .or_else(|| UiStatus::iter().find(|ui| normalize(ui.as_ref()) == key).map(Self::from))
    }

    /// Maps a UI value back to the internal vocabulary, falling back to `At Warehouse`.
    #[must_use]
    pub fn from_ui_label(input: &str) -> Self {
        UiStatus::parse_or_default(input).into()
    }

    /// Folds an external carrier label into the internal vocabulary.
    ///
    /// Unmatched labels resolve to [`PackageStatus::DEFAULT`]; the raw label is never stored
    /// as a status.
    #[must_use]
    pub fn from_external(label: &str) -> Self {
        let key = normalize(label);
        EXTERNAL_LABELS
            .iter()
            .find(|(known, _)| *known == key)
            .map_or(Self::DEFAULT, |(_, status)| *status)
    }
}

impl UiStatus {
    /// Parses a UI value, falling back to `pending`.
    #[must_use]
    pub fn parse_or_default(input: &str) -> Self {
        let key = normalize(input);
        Self::iter().find(|ui| normalize(ui.as_ref()) == key).unwrap_or(Self::Pending)
    }

    #[must_use]
    pub const fn to_internal(self) -> PackageStatus {
        match self {
            Self::Pending => PackageStatus::AtWarehouse,
            Self::InTransit => PackageStatus::InTransit,
            Self::ReadyForPickup => PackageStatus::AtLocalPort,
            Self::Delivered => PackageStatus::Delivered,
        }
    }
}

impl From<PackageStatus> for UiStatus {
    fn from(status: PackageStatus) -> Self {
        status.to_ui()
    }
}

impl From<UiStatus> for PackageStatus {
    fn from(status: UiStatus) -> Self {
        status.to_internal()
    }
}

fn normalize(input: &str) -> String {
    input.chars().filter(char::is_ascii_alphanumeric).map(|c| c.to_ascii_lowercase()).collect()
}
