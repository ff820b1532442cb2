use fhub_domain::ports::StoreError;
use fhub_kernel::error::ApiError;
use std::borrow::Cow;

/// A specialized [`CustomerError`] enum of this crate.
#[fhub_derive::fhub_error]
pub enum CustomerError {
    #[error("{message}")]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Customer store failure{}: {source}", format_context(.context))]
    Store { source: StoreError, context: Option<Cow<'static, str>> },
}

impl From<CustomerError> for ApiError {
    fn from(err: CustomerError) -> Self {
        match err {
            CustomerError::Validation { message, .. } => Self::validation(message),
            CustomerError::Store { source, context } => Self::Store { source, context },
        }
    }
}
