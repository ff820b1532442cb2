use fhub_domain::ports::StoreError;
use fhub_kernel::error::ApiError;
use fhub_storage::StorageError;
use std::borrow::Cow;

/// A specialized [`InvoiceError`] enum of this crate.
#[fhub_derive::fhub_error]
pub enum InvoiceError {
    #[error("{message}")]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("{message}")]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("{message}")]
    TooLarge { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("{message}")]
    UnsupportedType { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invoice file storage failure{}: {source}", format_context(.context))]
    Storage { source: StorageError, context: Option<Cow<'static, str>> },

    #[error("Package store failure{}: {source}", format_context(.context))]
    Store { source: StoreError, context: Option<Cow<'static, str>> },

    #[error("Internal invoice error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl InvoiceError {
    pub(crate) fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Validation { message: message.into(), context: None }
    }
}

impl From<InvoiceError> for ApiError {
    fn from(err: InvoiceError) -> Self {
        match err {
            InvoiceError::Validation { message, .. } => Self::validation(message),
            InvoiceError::NotFound { message, .. } => Self::not_found(message),
            InvoiceError::TooLarge { message, .. } => Self::payload_too_large(message),
            InvoiceError::UnsupportedType { message, .. } => Self::unsupported_media_type(message),
            InvoiceError::Store { source, context } => Self::Store { source, context },
            err @ (InvoiceError::Storage { .. } | InvoiceError::Internal { .. }) => Self::from(err.to_string()),
        }
    }
}
