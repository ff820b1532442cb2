use crate::mailer::Email;
use fhub_domain::broadcast::Broadcast;
use fhub_domain::customer::Customer;
use fhub_domain::events::PackageStatusChanged;
use fhub_domain::status::PackageStatus;

pub(crate) fn status_changed(customer: &Customer, event: &PackageStatusChanged) -> Email {
    let headline = match event.current {
        PackageStatus::Delivered => "has been delivered",
        _ => "is on its way",
    };

    let mut body = format!(
        "Hello {},\n\nYour package {} {headline}.\nCurrent status: {}\n",
        customer.display_name(),
        event.tracking_number,
        event.current,
    );
    if let Some(note) = &event.note {
        body.push_str(&format!("Note: {note}\n"));
    }
    body.push_str("\nThank you for shipping with us.\n");

    Email {
        to: customer.email.clone(),
        subject: format!("Package {} is now {}", event.tracking_number, event.current),
        body,
    }
}

pub(crate) fn broadcast(customer: &Customer, broadcast: &Broadcast) -> Email {
    Email {
        to: customer.email.clone(),
        subject: broadcast.title.clone(),
        body: format!("Hello {},\n\n{}\n", customer.display_name(), broadcast.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn customer() -> Customer {
        Customer {
            user_code: "C100".to_owned(),
            email: "c100@example.com".to_owned(),
            first_name: "Ana".to_owned(),
            last_name: "Brown".to_owned(),
            branch: None,
            updated_at: Utc::now(),
        }
    }

    fn event(current: PackageStatus, note: Option<&str>) -> PackageStatusChanged {
        PackageStatusChanged {
            tracking_number: "TAS999".to_owned(),
            user_code: Some("C100".to_owned()),
            previous: Some(PackageStatus::AtWarehouse),
            current,
            note: note.map(str::to_owned),
            at: Utc::now(),
        }
    }

    #[test]
    fn status_mail_carries_the_note_line() {
        let email = status_changed(&customer(), &event(PackageStatus::InTransit, Some("Flight JM42")));

        assert_eq!(email.to, "c100@example.com");
        assert_eq!(email.subject, "Package TAS999 is now In Transit");
        assert!(email.body.contains("is on its way.\nCurrent status: In Transit\nNote: Flight JM42\n\nThank you"));
    }

    #[test]
    fn status_mail_without_note_has_no_note_line() {
        let email = status_changed(&customer(), &event(PackageStatus::Delivered, None));

        assert!(email.body.contains("has been delivered."));
        assert!(!email.body.contains("Note:"));
    }
}
