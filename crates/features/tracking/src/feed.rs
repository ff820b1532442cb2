//! Loosely-typed records pushed by external carriers.
//!
//! Carriers name fields in their own casing and vocabulary (`TrackingNumber`, `tracking_no`,
//! `AWB`...). Keys are compared after stripping everything but ASCII alphanumerics and
//! lowercasing, then looked up in alias lists. Numbers may arrive as JSON numbers or strings;
//! booleans as `true`, `"yes"`, `"Y"` or `1`.

use crate::lifecycle::{PackagePatch, StatusUpdate};
use fhub_domain::package::UpdateSource;
use fhub_domain::status::PackageStatus;
use serde_json::{Map, Value};

const TRACKING_NUMBER: &[&str] = &["trackingnumber", "tracking", "trackingno", "trackingid", "awb", "hawb"];
const USER_CODE: &[&str] = &["usercode", "customercode", "customerid", "accountnumber", "account", "mailbox"];
const STATUS: &[&str] = &["status", "externalstatus", "packagestatus", "statusname", "statusdescription"];
const NOTE: &[&str] = &["note", "notes", "comment", "comments", "remarks"];
const WEIGHT: &[&str] = &["weight", "weightlbs", "grossweight", "actualweight"];
const SHIPPER: &[&str] = &["shipper", "vendor", "merchant", "sender", "shippername"];
const DESCRIPTION: &[&str] = &["description", "contents", "itemdescription", "packagedescription"];
const LENGTH: &[&str] = &["length", "dimlength"];
const WIDTH: &[&str] = &["width", "dimwidth"];
const HEIGHT: &[&str] = &["height", "dimheight"];
const BRANCH: &[&str] = &["branch", "branchcode", "pickupbranch"];
const SERVICE_TYPE: &[&str] = &["servicetypeid", "servicetype", "service"];
const HAZMAT_CODE: &[&str] = &["hazmatcodeid", "hazmatcode"];
const LOCATION: &[&str] = &["location", "currentlocation", "facility"];
const ENTRY_STAFF: &[&str] = &["entrystaff", "enteredby", "staff", "receivedby"];
const CUSTOMS_REQUIRED: &[&str] = &["customsrequired", "requirescustoms", "customs"];
const DISCREPANCY: &[&str] = &["discrepancy", "hasdiscrepancy"];
const HAZARDOUS: &[&str] = &["hazardous", "ishazardous", "hazmat"];
const FRAGILE: &[&str] = &["fragile", "isfragile"];
const DISCREPANCY_DESCRIPTION: &[&str] = &["discrepancydescription", "discrepancynote"];

/// Note recorded on history entries written by the carrier feed without a note of its own.
pub const FEED_NOTE: &str = "Received from external carrier feed";

/// A carrier record mapped onto the internal schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalRecord {
    pub tracking_number: String,
    pub user_code: String,
    pub update: StatusUpdate,
}

/// Why a single record was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRejection {
    NotAnObject,
    MissingTrackingNumber,
    MissingCustomerCode,
}

impl RecordRejection {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotAnObject => "Record is not an object",
            Self::MissingTrackingNumber => "Missing tracking number",
            Self::MissingCustomerCode => "Missing customer code",
        }
    }
}

struct Fields(Vec<(String, Value)>);

impl Fields {
    fn new(map: &Map<String, Value>) -> Self {
        Self(map.iter().map(|(k, v)| (normalize_key(k), v.clone())).collect())
    }

    fn get(&self, aliases: &[&str]) -> Option<&Value> {
        aliases
            .iter()
            .find_map(|alias| self.0.iter().find(|(key, _)| key == alias).map(|(_, value)| value))
            .filter(|value| !value.is_null())
    }

    fn text(&self, aliases: &[&str]) -> Option<String> {
        let text = match self.get(aliases)? {
            Value::String(s) => s.trim().to_owned(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    fn number(&self, aliases: &[&str]) -> Option<f64> {
        match self.get(aliases)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => leading_number(s),
            _ => None,
        }
    }

    fn flag(&self, aliases: &[&str]) -> Option<bool> {
        match self.get(aliases)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().map(|v| v != 0.0),
            Value::String(s) => match normalize_key(s).as_str() {
                "true" | "yes" | "y" | "1" => Some(true),
                "false" | "no" | "n" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl ExternalRecord {
    /// The tracking number of a record, even one that fails to parse.
    #[must_use]
    pub fn tracking_number_of(value: &Value) -> Option<String> {
        value.as_object().and_then(|map| Fields::new(map).text(TRACKING_NUMBER))
    }

    /// Maps one carrier record.
    ///
    /// # Errors
    /// Rejects records that are not objects or lack a tracking number or customer code.
    pub fn parse(value: &Value) -> Result<Self, RecordRejection> {
        let map = value.as_object().ok_or(RecordRejection::NotAnObject)?;
        let fields = Fields::new(map);

        let tracking_number =
            fields.text(TRACKING_NUMBER).ok_or(RecordRejection::MissingTrackingNumber)?;
        let user_code = fields.text(USER_CODE).ok_or(RecordRejection::MissingCustomerCode)?;
        let external_status = fields.text(STATUS);

        let patch = PackagePatch {
            user_code: Some(user_code.clone()),
            weight: fields.number(WEIGHT),
            shipper: fields.text(SHIPPER),
            description: fields.text(DESCRIPTION),
            length: fields.number(LENGTH),
            width: fields.number(WIDTH),
            height: fields.number(HEIGHT),
            branch: fields.text(BRANCH),
            service_type_id: fields.text(SERVICE_TYPE),
            hazmat_code_id: fields.text(HAZMAT_CODE),
            location: fields.text(LOCATION),
            entry_staff: fields.text(ENTRY_STAFF),
            external_status: external_status.clone(),
            customs_required: fields.flag(CUSTOMS_REQUIRED),
            discrepancy: fields.flag(DISCREPANCY),
            hazardous: fields.flag(HAZARDOUS),
            fragile: fields.flag(FRAGILE),
            discrepancy_description: fields.text(DISCREPANCY_DESCRIPTION),
        };

        let mut update = StatusUpdate::new(UpdateSource::ExternalFeed)
            .note(fields.text(NOTE).or_else(|| Some(FEED_NOTE.to_owned())))
            .patch(patch)
            .always_record();
        update.status = external_status.as_deref().map(PackageStatus::from_external);

        Ok(Self { tracking_number, user_code, update })
    }
}

/// Splits an ingestion body into its optional embedded token and the records.
///
/// Accepts a bare array or an envelope `{"apiToken": "...", "packages": [...]}`.
///
/// # Errors
/// Returns a description of the problem for any other shape.
pub fn split_envelope(body: Value) -> Result<(Option<String>, Vec<Value>), &'static str> {
    match body {
        Value::Array(items) => Ok((None, items)),
        Value::Object(mut map) => {
            let token = map
                .get("apiToken")
                .or_else(|| map.get("api_token"))
                .and_then(Value::as_str)
                .map(str::to_owned);
            match map.remove("packages") {
                Some(Value::Array(items)) => Ok((token, items)),
                Some(_) => Err("`packages` must be an array"),
                None => Err("Body must be an array or an object with `packages`"),
            }
        },
        _ => Err("Body must be an array or an object with `packages`"),
    }
}

fn normalize_key(key: &str) -> String {
    key.chars().filter(char::is_ascii_alphanumeric).map(|c| c.to_ascii_lowercase()).collect()
}

/// `"2.5 lb"` -> `2.5`.
fn leading_number(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    let end = trimmed
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.' || *c == '-'))
        .map_or(trimmed.len(), |(i, _)| i);
    trimmed[..end].parse().ok()
}
