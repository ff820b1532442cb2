use fhub_domain::package::{Package, PackageFlags};
use fhub_domain::status::{PackageStatus, UiStatus};
use proptest::prelude::*;
use strum::IntoEnumIterator;

#[test]
fn internal_strings_are_bit_exact() {
    let labels: Vec<&str> = PackageStatus::iter().map(PackageStatus::as_str).collect();
    assert_eq!(
        labels,
        ["Unknown", "At Warehouse", "In Transit", "At Local Port", "Delivered", "Deleted"]
    );

    let json = serde_json::to_string(&PackageStatus::AtLocalPort).unwrap();
    assert_eq!(json, "\"At Local Port\"");
    let parsed: PackageStatus = serde_json::from_str("\"In Transit\"").unwrap();
    assert_eq!(parsed, PackageStatus::InTransit);
}

#[test]
fn ui_strings_are_bit_exact() {
    let labels: Vec<String> = UiStatus::iter().map(|s| s.to_string()).collect();
    assert_eq!(labels, ["pending", "in_transit", "ready_for_pickup", "delivered"]);
    assert_eq!(serde_json::to_string(&UiStatus::ReadyForPickup).unwrap(), "\"ready_for_pickup\"");
}

#[test]
fn unrecognized_values_fall_back() {
    assert_eq!(UiStatus::parse_or_default("lost at sea"), UiStatus::Pending);
    assert_eq!(PackageStatus::from_ui_label("lost at sea"), PackageStatus::AtWarehouse);
    assert_eq!(PackageStatus::from_external("SOMETHING ODD"), PackageStatus::AtWarehouse);
}

#[test]
fn external_labels_map_to_closest_status() {
    assert_eq!(PackageStatus::from_external("Shipped"), PackageStatus::InTransit);
    assert_eq!(PackageStatus::from_external("Ready for Pickup"), PackageStatus::AtLocalPort);
    assert_eq!(PackageStatus::from_external("picked-up"), PackageStatus::Delivered);
    assert_eq!(PackageStatus::from_external("Received"), PackageStatus::AtWarehouse);
    assert_eq!(PackageStatus::from_external("CANCELLED"), PackageStatus::Deleted);
}

#[test]
fn requested_status_accepts_both_vocabularies() {
    assert_eq!(PackageStatus::parse_requested("At Warehouse"), Some(PackageStatus::AtWarehouse));
    assert_eq!(PackageStatus::parse_requested("in transit"), Some(PackageStatus::InTransit));
    assert_eq!(PackageStatus::parse_requested("ready_for_pickup"), Some(PackageStatus::AtLocalPort));
    assert_eq!(PackageStatus::parse_requested("pending"), Some(PackageStatus::AtWarehouse));
    assert_eq!(PackageStatus::parse_requested("teleported"), None);
    assert_eq!(PackageStatus::parse_requested("   "), None);
}

#[test]
fn package_flags_serialize_as_bits() {
    let mut package = Package::new("TAS1", PackageStatus::AtWarehouse, chrono::Utc::now());
    package.flags.apply(PackageFlags::CUSTOMS_REQUIRED, Some(true));
    package.flags.apply(PackageFlags::DISCREPANCY, None);

    let value = serde_json::to_value(&package).unwrap();
    assert_eq!(value["flags"], 1);
    assert_eq!(value["status"], "At Warehouse");
    assert_eq!(value["trackingNumber"], "TAS1");
}

fn any_internal() -> impl Strategy<Value = PackageStatus> {
    prop::sample::select(PackageStatus::iter().collect::<Vec<_>>())
}

proptest! {
    #[test]
    fn round_trip_stays_inside_both_vocabularies(status in any_internal()) {
        let ui = status.to_ui();
        prop_assert!(UiStatus::iter().any(|v| v == ui));

        let back = PackageStatus::from(ui);
        prop_assert!(PackageStatus::iter().any(|v| v == back));
        prop_assert_eq!(back.to_ui(), ui);
    }

    #[test]
    fn any_label_resolves_to_an_internal_status(label in ".{0,40}") {
        let status = PackageStatus::from_external(&label);
        prop_assert!(PackageStatus::iter().any(|v| v == status));

        let ui = UiStatus::parse_or_default(&label);
        prop_assert!(UiStatus::iter().any(|v| v == ui));
    }
}
