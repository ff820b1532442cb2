use fhub_domain::ports::StoreError;
use fhub_kernel::error::ApiError;
use std::borrow::Cow;

/// A specialized [`TrackingError`] enum of this crate.
#[fhub_derive::fhub_error]
pub enum TrackingError {
    /// Rejected input; nothing was written.
    #[error("{message}{}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("{message}")]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The package belongs to another customer.
    #[error("{message}")]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Package store failure{}: {source}", format_context(.context))]
    Store { source: StoreError, context: Option<Cow<'static, str>> },

    #[error("Internal tracking error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl TrackingError {
    pub(crate) fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Validation { message: message.into(), context: None }
    }

    pub(crate) fn not_found(tracking_number: &str) -> Self {
        Self::NotFound { message: format!("Package {tracking_number} not found").into(), context: None }
    }
}

impl From<TrackingError> for ApiError {
    fn from(err: TrackingError) -> Self {
        match err {
            TrackingError::Validation { .. } => Self::validation(err.to_string()),
            TrackingError::NotFound { message, .. } => Self::not_found(message),
            TrackingError::Conflict { message, .. } => Self::conflict(message),
            TrackingError::Store { source, context } => Self::Store { source, context },
            TrackingError::Internal { message, context } => Self::Internal { message, context },
        }
    }
}
