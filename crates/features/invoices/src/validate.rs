//! Upload checks that run before anything touches the disk.

use crate::error::InvoiceError;
use fhub_domain::constants::{ALLOWED_UPLOAD_TYPES, MIME_JPEG, MIME_PDF, MIME_PNG, MIME_WEBP};

/// One file part of an upload, fully buffered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// MIME type implied by the leading bytes, if it is one we accept.
#[must_use]
pub fn sniff(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"%PDF-") {
        Some(MIME_PDF)
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(MIME_JPEG)
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some(MIME_PNG)
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        Some(MIME_WEBP)
    } else {
        None
    }
}

/// Lowercased type without parameters (`Image/PNG; q=1` -> `image/png`).
#[must_use]
pub fn essence(content_type: &str) -> String {
    content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
}

/// Allow-list, size ceiling and magic bytes, in that order.
///
/// # Errors
/// [`InvoiceError::UnsupportedType`], [`InvoiceError::TooLarge`] or
/// [`InvoiceError::Validation`] (empty file, content not matching its declared type).
pub fn check_file(file: &UploadedFile, max_bytes: u64) -> Result<(), InvoiceError> {
    let declared = essence(&file.content_type);
    if !ALLOWED_UPLOAD_TYPES.contains(&declared.as_str()) {
        return Err(InvoiceError::UnsupportedType {
            message: format!(
                "{}: type `{declared}` is not allowed (accepted: {})",
                file.file_name,
                ALLOWED_UPLOAD_TYPES.join(", ")
            )
            .into(),
            context: None,
        });
    }

    if file.bytes.len() as u64 > max_bytes {
        return Err(too_large(&file.file_name, max_bytes));
    }
    if file.bytes.is_empty() {
        return Err(InvoiceError::validation(format!("{}: file is empty", file.file_name)));
    }

    if sniff(&file.bytes) != Some(declared.as_str()) {
        return Err(InvoiceError::validation(format!(
            "{}: content does not match declared type `{declared}`",
            file.file_name
        )));
    }
    Ok(())
}

pub(crate) fn too_large(file_name: &str, max_bytes: u64) -> InvoiceError {
    InvoiceError::TooLarge {
        message: format!("{file_name}: file exceeds the {max_bytes} byte limit").into(),
        context: None,
    }
}
