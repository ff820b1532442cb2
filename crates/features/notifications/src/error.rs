use std::borrow::Cow;

/// A specialized [`NotificationError`] enum of this crate.
#[fhub_derive::fhub_error]
pub enum NotificationError {
    /// Mail settings are unusable (bad relay host, unparsable sender address).
    #[error("Mail configuration error{}: {message}", format_context(.context))]
    Config { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid recipient{}: {message}", format_context(.context))]
    Address { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Mail delivery failed{}: {source}", format_context(.context))]
    Smtp { source: lettre::transport::smtp::Error, context: Option<Cow<'static, str>> },

    #[error("Event bus error{}: {source}", format_context(.context))]
    Events { source: fhub_event_bus::EventBusError, context: Option<Cow<'static, str>> },

    /// Listeners need a running Tokio runtime.
    #[error("Notification runtime error{}: {message}", format_context(.context))]
    Runtime { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal notification error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
