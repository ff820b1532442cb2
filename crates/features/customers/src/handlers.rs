use crate::Customers;
use axum::Json;
use axum::extract::{Path, State};
use fhub_domain::constants::CUSTOMERS_TAG;
use fhub_domain::customer::Customer;
use fhub_kernel::prelude::*;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Customer fields; the user code comes from the path.
#[api_model]
pub struct CustomerRequest {
    pub email: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub branch: Option<String>,
}

/// Routes of the customers slice.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new().routes(routes!(upsert_customer)).routes(routes!(list_customers))
}

#[api_handler(
    put,
    path = "/api/admin/customers/{user_code}",
    params(("user_code" = String, Path, description = "Customer user code")),
    request_body = CustomerRequest,
    responses(
        (status = OK, description = "Customer stored", body = Customer),
        (status = BAD_REQUEST, description = "Invalid input", body = ErrorResponse),
        (status = FORBIDDEN, description = "Admin role required", body = ErrorResponse),
    ),
    tag = CUSTOMERS_TAG,
)]
async fn upsert_customer(
    caller: Caller,
    State(state): State<ApiState>,
    Path(user_code): Path<String>,
    ApiJson(req): ApiJson<CustomerRequest>,
) -> Result<Json<Customer>, ApiError> {
    caller.require_admin()?;
    let customers = state.try_get_slice::<Customers>()?;
    Ok(Json(customers.upsert(&user_code, req).await?))
}

#[api_handler(
    get,
    path = "/api/admin/customers",
    responses(
        (status = OK, description = "All customers by user code", body = Vec<Customer>),
        (status = FORBIDDEN, description = "Admin role required", body = ErrorResponse),
    ),
    tag = CUSTOMERS_TAG,
)]
async fn list_customers(caller: Caller, State(state): State<ApiState>) -> Result<Json<Vec<Customer>>, ApiError> {
    caller.require_admin()?;
    let customers = state.try_get_slice::<Customers>()?;
    Ok(Json(customers.list().await?))
}
