use fhub_domain::ports::StoreError;
use fhub_kernel::error::ApiError;
use std::borrow::Cow;

/// A specialized [`AnalyticsError`] enum of this crate.
#[fhub_derive::fhub_error]
pub enum AnalyticsError {
    #[error("{message}")]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Analytics store failure{}: {source}", format_context(.context))]
    Store { source: StoreError, context: Option<Cow<'static, str>> },
}

impl From<AnalyticsError> for ApiError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::Validation { message, .. } => Self::validation(message),
            AnalyticsError::Store { source, context } => Self::Store { source, context },
        }
    }
}
