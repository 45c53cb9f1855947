//! Error types for the signing core

use crate::fields::FieldId;
use shared_pdf::PdfError;
use shared_types::ImageError;
use thiserror::Error;

/// Why an uploaded document could not be opened
///
/// Kept separate from [`SigningError`] so callers can fall back to the
/// placeholder renderer and still tell the user what went wrong.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Document is corrupted: {0}")]
    CorruptedDocument(String),

    #[error("Document is password protected")]
    PasswordProtected,
}

impl DocumentError {
    /// Message suitable for showing to the person uploading the file
    pub fn user_message(&self) -> &'static str {
        match self {
            DocumentError::UnsupportedFormat(_) => {
                "This file type is not supported. Please upload a PDF, PNG or JPEG."
            }
            DocumentError::CorruptedDocument(_) => {
                "The document appears to be corrupted. Please try a different file."
            }
            DocumentError::PasswordProtected => {
                "This PDF is password protected. Please remove the password and upload again."
            }
        }
    }
}

impl From<PdfError> for DocumentError {
    fn from(e: PdfError) -> Self {
        match e {
            PdfError::NotPdf => DocumentError::UnsupportedFormat(e.to_string()),
            PdfError::Encrypted => DocumentError::PasswordProtected,
            other => DocumentError::CorruptedDocument(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("Signature pad is empty")]
    EmptyCapture,

    #[error("Field not found: {0}")]
    UnknownField(FieldId),

    #[error("No confirmed signature available")]
    NoSignatureAvailable,

    #[error("Field placement is not active")]
    PlacementInactive,

    #[error("Field size must be positive, got {width}x{height}")]
    InvalidFieldSize { width: f64, height: f64 },

    #[error("Page {page} is out of range (document has {page_count} pages)")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("No page has been rendered yet")]
    NoPageRendered,

    #[error("Invalid drawing surface: {0}")]
    InvalidSurface(String),

    #[error("Session has been reset or closed")]
    StaleSession,

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// A signed field that could not be drawn into the exported artifact
///
/// Never fatal. The exporter records it and moves on to the next field.
#[derive(Debug, Error, Clone, PartialEq, serde::Serialize)]
#[error("Field {field_id} on page {page_index} skipped: {reason}")]
pub struct CompositingError {
    pub field_id: FieldId,
    pub page_index: usize,
    pub reason: String,
}
