use chrono::{DateTime, Duration, TimeZone, Utc};
use fhub_domain::package::UpdateSource;
use fhub_domain::status::PackageStatus;
use fhub_tracking::lifecycle::{StatusUpdate, apply};
use proptest::prelude::*;

fn any_status() -> impl Strategy<Value = PackageStatus> {
    prop_oneof![
        Just(PackageStatus::Unknown),
        Just(PackageStatus::AtWarehouse),
        Just(PackageStatus::InTransit),
        Just(PackageStatus::AtLocalPort),
        Just(PackageStatus::Delivered),
        Just(PackageStatus::Deleted),
    ]
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

proptest! {
    #[test]
    fn history_grows_only_on_change(statuses in prop::collection::vec(any_status(), 1..20)) {
        let mut stored = None;

        for (i, status) in statuses.iter().enumerate() {
            let before = stored.as_ref().map(|p: &fhub_domain::package::Package| (p.status, p.history.len()));
            let now = start() + Duration::seconds(i64::try_from(i).unwrap());
            let applied = apply(stored.take(), "TAS1", StatusUpdate::new(UpdateSource::Warehouse).status(*status), now);

            match before {
                Some((previous, len)) if previous == *status => {
                    prop_assert_eq!(applied.package.history.len(), len);
                },
                Some((_, len)) => {
                    prop_assert_eq!(applied.package.history.len(), len + 1);
                    prop_assert_eq!(applied.package.history.last().map(|h| h.status), Some(*status));
                },
                None => prop_assert_eq!(applied.package.history.len(), 1),
            }
            prop_assert_eq!(applied.package.status, *status);
            prop_assert_eq!(applied.package.updated_at, now);
            stored = Some(applied.package);
        }
    }

    #[test]
    fn identical_updates_are_idempotent(status in any_status()) {
        let first = apply(None, "TAS1", StatusUpdate::new(UpdateSource::Warehouse).status(status), start());
        let second = apply(
            Some(first.package.clone()),
            "TAS1",
            StatusUpdate::new(UpdateSource::Warehouse).status(status),
            start() + Duration::seconds(1),
        );

        prop_assert_eq!(second.package.history, first.package.history);
    }
}
