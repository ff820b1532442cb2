//! The status transition at the heart of every package write.
//!
//! [`apply`] is a pure merge-patch: it takes the stored document (if any) and an update, and
//! returns the document to persist. The rules:
//!
//! * a missing document is created with the source's initial status;
//! * a history entry is appended when the resolved status differs from the stored one, when
//!   the document is new, or when the update asks for one regardless (carrier feed records);
//! * only a real status change produces a [`PackageStatusChanged`] event;
//! * `status` and `updatedAt` are always overwritten;
//! * metadata is merged only when present and non-empty, so absent fields never clear values.

use chrono::{DateTime, Utc};
use fhub_domain::events::PackageStatusChanged;
use fhub_domain::package::{HistoryEntry, Package, PackageFlags, UpdateSource};
use fhub_domain::status::PackageStatus;

/// Optional metadata carried by a write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackagePatch {
    pub user_code: Option<String>,
    pub weight: Option<f64>,
    pub shipper: Option<String>,
    pub description: Option<String>,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub branch: Option<String>,
    pub service_type_id: Option<String>,
    pub hazmat_code_id: Option<String>,
    pub location: Option<String>,
    pub entry_staff: Option<String>,
    pub external_status: Option<String>,
    pub customs_required: Option<bool>,
    pub discrepancy: Option<bool>,
    pub hazardous: Option<bool>,
    pub fragile: Option<bool>,
    pub discrepancy_description: Option<String>,
}

impl PackagePatch {
    fn merge_into(self, package: &mut Package) {
        merge_text(&mut package.user_code, self.user_code);
        merge_number(&mut package.weight, self.weight);
        merge_text(&mut package.shipper, self.shipper);
        merge_text(&mut package.description, self.description);
        merge_number(&mut package.length, self.length);
        merge_number(&mut package.width, self.width);
        merge_number(&mut package.height, self.height);
        merge_text(&mut package.branch, self.branch);
        merge_text(&mut package.service_type_id, self.service_type_id);
        merge_text(&mut package.hazmat_code_id, self.hazmat_code_id);
        merge_text(&mut package.location, self.location);
        merge_text(&mut package.entry_staff, self.entry_staff);
        merge_text(&mut package.external_status, self.external_status);
        merge_text(&mut package.discrepancy_description, self.discrepancy_description);

        package.flags.apply(PackageFlags::CUSTOMS_REQUIRED, self.customs_required);
        package.flags.apply(PackageFlags::DISCREPANCY, self.discrepancy);
        package.flags.apply(PackageFlags::HAZARDOUS, self.hazardous);
        package.flags.apply(PackageFlags::FRAGILE, self.fragile);
    }
}

/// One write against a package.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    /// Target status; `None` keeps the stored one (or the source's initial status).
    pub status: Option<PackageStatus>,
    pub note: Option<String>,
    pub source: UpdateSource,
    pub patch: PackagePatch,
    /// Append a history entry even when the status stays the same.
    pub always_record: bool,
}

impl StatusUpdate {
    #[must_use]
    pub fn new(source: UpdateSource) -> Self {
        Self { status: None, note: None, source, patch: PackagePatch::default(), always_record: false }
    }

    #[must_use]
    pub fn status(mut self, status: PackageStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    #[must_use]
    pub fn patch(mut self, patch: PackagePatch) -> Self {
        self.patch = patch;
        self
    }

    #[must_use]
    pub const fn always_record(mut self) -> Self {
        self.always_record = true;
        self
    }
}

/// Outcome of [`apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub package: Package,
    pub created: bool,
    /// Stored status before the write; `None` for a new package.
    pub previous: Option<PackageStatus>,
    /// Created, or moved to a different status.
    pub status_changed: bool,
    /// Whether a history entry was appended.
    pub appended: bool,
}

impl Applied {
    /// The event to publish, when the write changed the status.
    #[must_use]
    pub fn event(&self) -> Option<PackageStatusChanged> {
        let entry = self.package.history.last().filter(|_| self.status_changed)?;
        Some(PackageStatusChanged {
            tracking_number: self.package.tracking_number.clone(),
            user_code: self.package.user_code.clone(),
            previous: self.previous,
            current: self.package.status,
            note: entry.note.clone(),
            at: entry.at,
        })
    }
}

/// Applies `update` to the stored document, creating it when absent.
#[must_use]
pub fn apply(
    existing: Option<Package>,
    tracking_number: &str,
    update: StatusUpdate,
    now: DateTime<Utc>,
) -> Applied {
    let StatusUpdate { status, note, source, patch, always_record } = update;

    let created = existing.is_none();
    let mut package =
        existing.unwrap_or_else(|| Package::new(tracking_number, source.initial_status(), now));
    let previous = (!created).then_some(package.status);
    let resolved = status.unwrap_or(package.status);
    let location = non_empty(patch.location.clone());

    patch.merge_into(&mut package);

    let status_changed = created || previous != Some(resolved);
    let appended = status_changed || always_record;
    if appended {
        package.history.push(HistoryEntry {
            status: resolved,
            at: now,
            note: non_empty(note),
            location,
            source,
        });
    }

    package.status = resolved;
    package.updated_at = now;

    Applied { package, created, previous, status_changed, appended }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

fn merge_text(slot: &mut Option<String>, value: Option<String>) {
    if let Some(value) = non_empty(value) {
        *slot = Some(value);
    }
}

fn merge_number(slot: &mut Option<f64>, value: Option<f64>) {
    if let Some(value) = value.filter(|v| v.is_finite()) {
        *slot = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(second: u32) -> DateTime<Utc> {
        use chrono::TimeZone;
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, second).unwrap()
    }

    #[test]
    fn new_package_gets_one_entry_with_source_default() {
        let applied = apply(None, "TAS1", StatusUpdate::new(UpdateSource::PreAlert), at(0));

        assert!(applied.created);
        assert!(applied.appended);
        assert_eq!(applied.package.status, PackageStatus::Unknown);
        assert_eq!(applied.package.history.len(), 1);
        assert_eq!(applied.package.history[0].source, UpdateSource::PreAlert);
        assert_eq!(applied.event().unwrap().previous, None);
    }

    #[test]
    fn same_status_updates_timestamp_only() {
        let first = apply(
            None,
            "TAS1",
            StatusUpdate::new(UpdateSource::Warehouse).status(PackageStatus::InTransit),
            at(0),
        );
        let second = apply(
            Some(first.package),
            "TAS1",
            StatusUpdate::new(UpdateSource::Warehouse).status(PackageStatus::InTransit),
            at(5),
        );

        assert!(!second.appended);
        assert!(!second.status_changed);
        assert!(second.event().is_none());
        assert_eq!(second.package.history.len(), 1);
        assert_eq!(second.package.updated_at, at(5));
        assert_eq!(second.package.created_at, at(0));
    }

    #[test]
    fn forced_record_appends_without_announcing() {
        let first = apply(
            None,
            "TAS1",
            StatusUpdate::new(UpdateSource::ExternalFeed).status(PackageStatus::InTransit),
            at(0),
        );
        let again = apply(
            Some(first.package),
            "TAS1",
            StatusUpdate::new(UpdateSource::ExternalFeed)
                .status(PackageStatus::InTransit)
                .note(Some("Weight updated".to_owned()))
                .always_record(),
            at(9),
        );

        assert!(again.appended);
        assert!(!again.status_changed);
        assert!(again.event().is_none());
        assert_eq!(again.package.history.len(), 2);
        let entry = &again.package.history[1];
        assert_eq!(entry.status, PackageStatus::InTransit);
        assert_eq!(entry.source, UpdateSource::ExternalFeed);
        assert_eq!(entry.at, at(9));
        assert_eq!(entry.note.as_deref(), Some("Weight updated"));
    }

    #[test]
    fn absent_and_blank_fields_never_clear_values() {
        let patch = PackagePatch {
            shipper: Some("Amazon".to_owned()),
            weight: Some(2.5),
            fragile: Some(true),
            ..PackagePatch::default()
        };
        let first = apply(None, "TAS1", StatusUpdate::new(UpdateSource::Warehouse).patch(patch), at(0));

        let blank = PackagePatch {
            shipper: Some("   ".to_owned()),
            weight: Some(f64::NAN),
            ..PackagePatch::default()
        };
        let second =
            apply(Some(first.package), "TAS1", StatusUpdate::new(UpdateSource::Warehouse).patch(blank), at(1));

        assert_eq!(second.package.shipper.as_deref(), Some("Amazon"));
        assert_eq!(second.package.weight, Some(2.5));
        assert!(second.package.flags.contains(PackageFlags::FRAGILE));
    }

    #[test]
    fn flags_can_be_cleared_explicitly() {
        let mut package = Package::new("TAS1", PackageStatus::AtWarehouse, at(0));
        package.flags = PackageFlags::DISCREPANCY | PackageFlags::HAZARDOUS;
        let patch = PackagePatch { discrepancy: Some(false), ..PackagePatch::default() };

        let applied =
            apply(Some(package), "TAS1", StatusUpdate::new(UpdateSource::Warehouse).patch(patch), at(1));

        assert_eq!(applied.package.flags, PackageFlags::HAZARDOUS);
    }

    #[test]
    fn history_entry_carries_note_and_location() {
        let patch = PackagePatch { location: Some("Miami".to_owned()), ..PackagePatch::default() };
        let update = StatusUpdate::new(UpdateSource::BulkUpdate)
            .status(PackageStatus::InTransit)
            .note(Some(" Manifest 42 ".to_owned()))
            .patch(patch);

        let applied = apply(None, "TAS1", update, at(0));
        let entry = &applied.package.history[0];

        assert_eq!(entry.note.as_deref(), Some("Manifest 42"));
        assert_eq!(entry.location.as_deref(), Some("Miami"));
        assert_eq!(applied.package.location.as_deref(), Some("Miami"));
    }
}
