use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Invalid file header: not a PDF")]
    NotPdf,

    #[error("PDF is encrypted")]
    Encrypted,

    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("Page {0} not found")]
    PageNotFound(u32),

    #[error("Malformed PDF structure: {0}")]
    Malformed(String),

    #[error("Image error: {0}")]
    Image(#[from] shared_types::ImageError),

    #[error("Stream compression failed: {0}")]
    Compression(#[from] std::io::Error),

    #[error("Failed to save PDF: {0}")]
    Save(String),
}

impl From<lopdf::Error> for PdfError {
    fn from(e: lopdf::Error) -> Self {
        PdfError::Malformed(e.to_string())
    }
}
