use fhub_domain::ports::StoreError;
use fhub_kernel::error::ApiError;
use std::borrow::Cow;

/// A specialized [`BroadcastError`] enum of this crate.
#[fhub_derive::fhub_error]
pub enum BroadcastError {
    #[error("{message}")]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Broadcast store failure{}: {source}", format_context(.context))]
    Store { source: StoreError, context: Option<Cow<'static, str>> },
}

impl From<BroadcastError> for ApiError {
    fn from(err: BroadcastError) -> Self {
        match err {
            BroadcastError::Validation { message, .. } => Self::validation(message),
            BroadcastError::Store { source, context } => Self::Store { source, context },
        }
    }
}
