use crate::validate::{UploadedFile, too_large};
use crate::{InvoiceError, InvoiceUpload, Invoices};
use axum::Json;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use fhub_domain::config::UploadsConfig;
use fhub_domain::constants::INVOICES_TAG;
use fhub_domain::package::{InvoiceDocument, InvoiceRecord, InvoiceStatus};
use fhub_kernel::prelude::*;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Room for the non-file fields and multipart framing.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

#[api_model]
pub struct InvoiceReceipt {
    pub tracking_number: String,
    pub record: InvoiceRecord,
    pub documents: Vec<InvoiceDocument>,
}

#[api_model]
pub struct ReviewRequest {
    /// `reviewed` or `rejected`.
    pub status: InvoiceStatus,
    pub note: Option<String>,
}

/// Multipart form of an invoice upload (documentation only).
#[allow(dead_code)]
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
struct InvoiceForm {
    tracking_number: String,
    amount: Option<f64>,
    note: Option<String>,
    /// One or more files; repeat the part for several.
    #[schema(value_type = Vec<String>, format = Binary)]
    file: Vec<u8>,
}

/// Routes of the invoices slice. The body limit covers `max_files` full-size files.
pub fn router(limits: &UploadsConfig) -> OpenApiRouter<ApiState> {
    let per_file = usize::try_from(limits.max_file_bytes).unwrap_or(usize::MAX);
    let body_limit = per_file.saturating_mul(limits.max_files.max(1)).saturating_add(FORM_OVERHEAD_BYTES);

    OpenApiRouter::new()
        .routes(routes!(upload_invoice))
        .layer(DefaultBodyLimit::max(body_limit))
        .routes(routes!(review_invoice))
}

#[api_handler(
    post,
    path = "/api/invoices",
    request_body(content = InvoiceForm, content_type = "multipart/form-data"),
    responses(
        (status = CREATED, description = "Invoice stored", body = InvoiceReceipt),
        (status = BAD_REQUEST, description = "Missing field, content mismatch or too many files", body = ErrorResponse),
        (status = NOT_FOUND, description = "Package not found for the caller", body = ErrorResponse),
        (status = PAYLOAD_TOO_LARGE, description = "File exceeds the size limit", body = ErrorResponse),
        (status = UNSUPPORTED_MEDIA_TYPE, description = "File type not allowed", body = ErrorResponse),
    ),
    tag = INVOICES_TAG,
)]
async fn upload_invoice(
    caller: Caller,
    State(state): State<ApiState>,
    multipart: Result<Multipart, axum::extract::multipart::MultipartRejection>,
) -> Result<(StatusCode, Json<InvoiceReceipt>), ApiError> {
    let user_code = caller.require_customer()?;
    let invoices = state.try_get_slice::<Invoices>()?;

    let upload = read_form(multipart?, invoices.limits()).await?;
    let receipt = invoices.submit(user_code, upload).await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

#[api_handler(
    patch,
    path = "/api/admin/invoices/{tracking_number}/{invoice_id}",
    params(
        ("tracking_number" = String, Path, description = "Tracking number"),
        ("invoice_id" = String, Path, description = "Invoice record id"),
    ),
    request_body = ReviewRequest,
    responses(
        (status = OK, description = "Updated invoice record", body = InvoiceRecord),
        (status = NOT_FOUND, description = "Unknown package or invoice", body = ErrorResponse),
        (status = FORBIDDEN, description = "Admin role required", body = ErrorResponse),
    ),
    tag = INVOICES_TAG,
)]
async fn review_invoice(
    caller: Caller,
    State(state): State<ApiState>,
    Path((tracking_number, invoice_id)): Path<(String, String)>,
    ApiJson(req): ApiJson<ReviewRequest>,
) -> Result<Json<InvoiceRecord>, ApiError> {
    caller.require_admin()?;
    let invoices = state.try_get_slice::<Invoices>()?;
    let record = invoices.review(&tracking_number, &invoice_id, req.status, req.note).await?;
    Ok(Json(record))
}

/// Buffers the form. Oversized files and surplus parts are rejected while streaming.
async fn read_form(mut multipart: Multipart, limits: &UploadsConfig) -> Result<InvoiceUpload, InvoiceError> {
    let mut upload = InvoiceUpload::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "trackingNumber" => upload.tracking_number = field.text().await.map_err(multipart_error)?,
            "note" => upload.note = Some(field.text().await.map_err(multipart_error)?),
            "amount" => {
                let raw = field.text().await.map_err(multipart_error)?;
                let raw = raw.trim();
                if !raw.is_empty() {
                    let amount =
                        raw.parse().map_err(|_| InvoiceError::validation(format!("amount `{raw}` is not a number")))?;
                    upload.amount = Some(amount);
                }
            },
            "file" | "files" => {
                if upload.files.len() >= limits.max_files {
                    return Err(InvoiceError::validation(format!(
                        "At most {} files may be uploaded at once",
                        limits.max_files
                    )));
                }
                upload.files.push(read_file(field, limits.max_file_bytes).await?);
            },
            _ => {},
        }
    }
    Ok(upload)
}

async fn read_file(mut field: Field<'_>, max_bytes: u64) -> Result<UploadedFile, InvoiceError> {
    let file_name = field.file_name().unwrap_or("file").to_owned();
    let content_type = field.content_type().unwrap_or("application/octet-stream").to_owned();

    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if (bytes.len() + chunk.len()) as u64 > max_bytes {
            return Err(too_large(&file_name, max_bytes));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(UploadedFile { file_name, content_type, bytes })
}

fn multipart_error(err: MultipartError) -> InvoiceError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        InvoiceError::TooLarge { message: err.body_text().into(), context: None }
    } else {
        InvoiceError::validation(err.body_text())
    }
}
