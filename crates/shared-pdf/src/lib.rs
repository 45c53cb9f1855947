//! Shared PDF handling utilities
//!
//! This crate provides PDF parsing, coordinate transformation between
//! screen and page space, and the two ways a signed document is written:
//! stamping images onto the original pages, or rebuilding the document
//! from page rasters.

pub mod coords;
pub mod error;
pub mod parser;
pub mod rebuild;
pub mod stamp;
pub mod xobject;

pub use coords::{
    display_rect_to_surface, display_to_surface, document_to_surface, rect_from_document,
    rect_to_document, rect_to_native, rescale_rect, surface_rect_to_display, surface_to_display,
    surface_to_document,
};
pub use error::PdfError;
pub use parser::PdfDocument;
pub use rebuild::{assemble_from_rasters, RasterPage, RASTERIZED_SUBJECT};
pub use stamp::PdfStamper;
