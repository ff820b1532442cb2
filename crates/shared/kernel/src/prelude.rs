//! Imports shared by slice handlers.

pub use crate::auth::{Caller, Session};
pub use crate::error::{ApiError, ErrorResponse};
pub use crate::extract::{ApiJson, ApiQuery};
pub use crate::server::{ApiState, ApiStateError};
pub use crate::safe_nanoid;
pub use fhub_derive::{api_handler, api_model};
