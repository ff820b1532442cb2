//! Customer directory slice: admin upsert and listing.
//!
//! Other slices read customers straight from the [`CustomerRepository`]; this slice owns the
//! writes and their validation.

mod error;
mod handlers;

pub use crate::error::{CustomerError, CustomerErrorExt};
pub use crate::handlers::{CustomerRequest, router};

use chrono::Utc;
use fhub_domain::customer::Customer;
use fhub_domain::ports::CustomerRepository;
use fhub_kernel::domain::registry::InitializedSlice;
use std::sync::Arc;
use tracing::info;

/// Customers feature state
#[fhub_derive::fhub_slice]
pub struct Customers {
    customers: Arc<dyn CustomerRepository>,
}

impl CustomersInner {
    /// Creates or replaces the customer stored under `user_code`.
    ///
    /// # Errors
    /// [`CustomerError::Validation`] for a blank code/name or an implausible email.
    pub async fn upsert(&self, user_code: &str, req: CustomerRequest) -> Result<Customer, CustomerError> {
        let customer = req.into_customer(user_code)?;
        self.customers.save(&customer).await?;
        info!(user_code = %customer.user_code, "Customer saved");
        Ok(customer)
    }

    /// # Errors
    /// [`CustomerError::Store`] when the repository fails.
    pub async fn list(&self) -> Result<Vec<Customer>, CustomerError> {
        Ok(self.customers.list().await?)
    }
}

impl CustomerRequest {
    fn into_customer(self, user_code: &str) -> Result<Customer, CustomerError> {
        let user_code = required(user_code, "userCode")?;
        let email = required(&self.email, "email")?;
        if !is_plausible_email(&email) {
            return Err(CustomerError::Validation { message: "email is not a valid address".into(), context: None });
        }

        Ok(Customer {
            user_code,
            email,
            first_name: required(&self.first_name, "firstName")?,
            last_name: self.last_name.trim().to_owned(),
            branch: self.branch.map(|b| b.trim().to_owned()).filter(|b| !b.is_empty()),
            updated_at: Utc::now(),
        })
    }
}

fn required(value: &str, field: &'static str) -> Result<String, CustomerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CustomerError::Validation { message: format!("{field} is required").into(), context: None });
    }
    Ok(trimmed.to_owned())
}

fn is_plausible_email(email: &str) -> bool {
    email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
    }) && !email.contains(char::is_whitespace)
}

/// Creates the slice handle without registering it.
#[must_use]
pub fn service(customers: Arc<dyn CustomerRepository>) -> Customers {
    Customers::new(CustomersInner { customers })
}

/// Initialize the customers feature.
///
/// # Errors
/// Currently infallible; the signature matches the other slices.
pub fn init(customers: Arc<dyn CustomerRepository>) -> Result<InitializedSlice, CustomerError> {
    tracing::info!("Customers slice initialized");
    Ok(InitializedSlice::new(service(customers)))
}
